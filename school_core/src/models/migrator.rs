use sea_orm_migration::prelude::*;

mod m20261018_000001_create_faculty_table;
mod m20261018_000002_create_student_table;
mod m20261018_000003_create_avatar_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261018_000001_create_faculty_table::Migration),
            Box::new(m20261018_000002_create_student_table::Migration),
            Box::new(m20261018_000003_create_avatar_table::Migration),
        ]
    }
}

#[cfg(test)]
use sea_orm::{Database, DbErr};

#[tokio::test]
async fn test_migrations_okay() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::refresh(&db).await?;

    assert!(schema_manager.has_table("faculty").await?);
    assert!(schema_manager.has_table("student").await?);
    assert!(schema_manager.has_table("avatar").await?);
    assert!(schema_manager.has_index("avatar", "idx_avatar_student_id").await?);
    assert!(schema_manager.has_index("faculty", "idx_faculty_name_key").await?);

    Ok(())
}

#[tokio::test]
async fn test_migrations_roll_back() -> Result<(), DbErr> {
    let db = Database::connect("sqlite::memory:").await?;
    let schema_manager = SchemaManager::new(&db);

    Migrator::up(&db, None).await?;
    Migrator::down(&db, None).await?;

    assert!(!schema_manager.has_table("avatar").await?);
    assert!(!schema_manager.has_table("student").await?);
    assert!(!schema_manager.has_table("faculty").await?);

    Ok(())
}
