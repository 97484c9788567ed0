use sea_orm_migration::prelude::*;

use super::m20261018_000001_create_faculty_table::Faculty;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20261018_000002_create_student_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .col(
                        ColumnDef::new(Student::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Student::Name).string().not_null())
                    .col(ColumnDef::new(Student::NameKey).string().not_null())
                    .col(ColumnDef::new(Student::Age).integer().not_null())
                    .col(ColumnDef::new(Student::Gender).string_len(1).not_null())
                    .col(ColumnDef::new(Student::FacultyId).integer().null())
                    // Dependents are removed by the roster teardown, never by the database.
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_faculty_id")
                            .from(Student::Table, Student::FacultyId)
                            .to(Faculty::Table, Faculty::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create index on faculty_id
        manager
            .create_index(
                Index::create()
                    .name("idx_student_faculty_id")
                    .table(Student::Table)
                    .col(Student::FacultyId)
                    .to_owned(),
            )
            .await?;

        // Unique index on name_key
        manager
            .create_index(
                Index::create()
                    .name("idx_student_name_key")
                    .table(Student::Table)
                    .col(Student::NameKey)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Student {
    Table,
    Id,
    Name,
    NameKey,
    Age,
    Gender,
    FacultyId,
}
