use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::info;

use crate::error::StartupError;
use crate::service::{
    avatars::AvatarsService, faculties::FacultiesService, students::StudentsService,
};
use crate::storage::{BlobStore, FilesystemBlobStore};

pub mod config;
pub mod entity;
pub mod error;
pub mod ids;
pub mod models;
pub mod service;
pub mod storage;

#[cfg(test)]
pub(crate) mod test_utils;

/// Main runtime handle for the school records backend.
#[derive(Clone)]
pub struct SchoolCore {
    pub config: config::SchoolConfig,

    pub db: DatabaseConnection,

    pub faculties: FacultiesService,
    pub students: StudentsService,
    pub avatars: AvatarsService,
}

impl SchoolCore {
    /// Load (or create) the on-disk config and start from it.
    pub async fn start() -> Result<Self, StartupError> {
        let config = config::get_or_init().await?;
        Self::start_with(config).await
    }

    pub async fn start_with(config: config::SchoolConfig) -> Result<Self, StartupError> {
        info!(
            database = %config.database_path.display(),
            avatars = %config.avatars_path.display(),
            "starting school core"
        );

        // DB + migrations
        let db = models::open_or_create_db(&config).await?;
        models::migrate_up(&db).await?;

        let store: Arc<dyn BlobStore> =
            Arc::new(FilesystemBlobStore::new(config.avatars_path.clone()).await?);

        Ok(Self {
            faculties: FacultiesService::new(db.clone(), store.clone()),
            students: StudentsService::new(db.clone(), store.clone()),
            avatars: AvatarsService::new(db.clone(), store),
            config,
            db,
        })
    }
}

pub mod prelude {
    pub use super::config;
    pub use super::entity;
    pub use super::error;
    pub use super::ids;
    pub use super::models;
    pub use super::service;
    pub use super::storage;

    pub use super::SchoolCore;
}
