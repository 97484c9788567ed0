use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sea_orm_migration::MigratorTrait;

use crate::entity::prelude::*;
use crate::ids::FacultyId;
use crate::models::migrator::Migrator;
use crate::service::fold;
use crate::storage::{BlobStore, FilesystemBlobStore, StorageError};

/// Fresh in-memory database with every migration applied.
pub(crate) async fn setup_test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

/// Filesystem store inside a temp dir. Keep the `TempDir` alive for the test.
pub(crate) async fn setup_test_store() -> (Arc<FilesystemBlobStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let store = FilesystemBlobStore::new(dir.path().join("avatars"))
        .await
        .expect("Failed to open blob store");
    (Arc::new(store), dir)
}

/// Store whose writes always fail, for checking that nothing reaches the database.
pub(crate) struct FailingBlobStore {
    root: PathBuf,
}

impl FailingBlobStore {
    pub(crate) fn new() -> Self {
        Self {
            root: PathBuf::from("/nonexistent/avatars"),
        }
    }
}

#[async_trait]
impl BlobStore for FailingBlobStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_dir(&self, _path: &Path) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put(&self, path: &Path, _data: &[u8]) -> Result<(), StorageError> {
        Err(StorageError::io(path, std::io::Error::other("disk full")))
    }

    async fn get(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        Err(StorageError::NotFound(path.to_path_buf()))
    }

    async fn delete(&self, _path: &Path) -> Result<bool, StorageError> {
        Ok(false)
    }
}

pub(crate) async fn create_test_faculty(db: &DatabaseConnection, name: &str) -> FacultyModel {
    let faculty = FacultyActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        name_key: Set(fold(name)),
        color: Set("red".to_string()),
        color_key: Set("red".to_string()),
    };
    faculty.insert(db).await.unwrap()
}

pub(crate) async fn create_test_student(
    db: &DatabaseConnection,
    name: &str,
    age: i32,
    faculty_id: Option<FacultyId>,
) -> StudentModel {
    let student = StudentActiveModel {
        id: NotSet,
        name: Set(name.to_string()),
        name_key: Set(fold(name)),
        age: Set(age),
        gender: Set(Gender::Male),
        faculty_id: Set(faculty_id),
    };
    student.insert(db).await.unwrap()
}
