use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};

use crate::config::SchoolConfig;

pub mod migrator;

pub async fn open_or_create_db(config: &SchoolConfig) -> Result<DatabaseConnection, DbErr> {
    // Use display() to convert PathBuf to string representation
    let connection_string = format!("sqlite://{}?mode=rwc", config.database_path.display());
    debug!(%connection_string, "opening database");

    Database::connect(&connection_string).await
}

pub async fn migrate_up(db: &DatabaseConnection) -> Result<(), DbErr> {
    migrator::Migrator::up(db, None).await?;
    info!("database migrations applied");
    Ok(())
}
