use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use super::error::StorageError;
use super::traits::BlobStore;

static STAGING_DIR_NAME: &str = ".staging";

/// Filesystem-backed avatar store.
///
/// Writes go to `{root}/.staging/{uuid}` first and are renamed into place,
/// so a failed write never leaves a truncated blob at the target path.
#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StorageError::io(&root, e))?;
        Ok(Self { root })
    }

    fn staging_path(&self) -> PathBuf {
        self.root
            .join(STAGING_DIR_NAME)
            .join(uuid::Uuid::now_v7().to_string())
    }

    async fn write_staged(&self, staging: &Path, data: &[u8]) -> std::io::Result<()> {
        let file = fs::File::create(staging).await?;
        let mut writer = BufWriter::new(file);
        writer.write_all(data).await?;
        writer.flush().await?;
        writer.into_inner().sync_all().await
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), StorageError> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::io(parent, e))
    }

    async fn put(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        self.ensure_dir(path).await?;

        let staging = self.staging_path();
        self.ensure_dir(&staging).await?;

        if let Err(e) = self.write_staged(&staging, data).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::io(path, e));
        }

        // rename replaces any existing blob in one step
        if let Err(e) = fs::rename(&staging, path).await {
            let _ = fs::remove_file(&staging).await;
            return Err(StorageError::io(path, e));
        }

        debug!(path = %path.display(), bytes = data.len(), "stored blob");
        Ok(())
    }

    async fn get(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_path_buf()))
            }
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn delete(&self, path: &Path) -> Result<bool, StorageError> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::StudentId;

    async fn temp_store() -> (FilesystemBlobStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemBlobStore::new(dir.path().join("avatars"))
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn new_creates_root() {
        let (store, dir) = temp_store().await;
        assert!(store.root().is_dir());
        assert_eq!(store.root(), dir.path().join("avatars"));
    }

    #[tokio::test]
    async fn blob_path_uses_student_id_and_extension() {
        let (store, _dir) = temp_store().await;
        let path = store.blob_path(StudentId::from_i64(12), "png");
        assert_eq!(path, store.root().join("12.png"));
    }

    #[tokio::test]
    async fn put_get_round_trip() {
        let (store, _dir) = temp_store().await;
        let path = store.blob_path(StudentId::from_i64(1), "png");

        store.put(&path, b"\x89PNG payload").await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), b"\x89PNG payload");
    }

    #[tokio::test]
    async fn failed_put_keeps_previous_content() {
        let (store, _dir) = temp_store().await;
        let path = store.blob_path(StudentId::from_i64(4), "png");

        // A non-empty directory at the target makes the rename fail
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("keep"), b"old").unwrap();

        assert!(store.put(&path, b"new").await.is_err());
        assert_eq!(std::fs::read(path.join("keep")).unwrap(), b"old");

        let staged = std::fs::read_dir(store.root().join(STAGING_DIR_NAME))
            .unwrap()
            .count();
        assert_eq!(staged, 0);
    }

    #[tokio::test]
    async fn put_replaces_existing_blob() {
        let (store, _dir) = temp_store().await;
        let path = store.blob_path(StudentId::from_i64(1), "jpg");

        store.put(&path, b"first version, longer").await.unwrap();
        store.put(&path, b"second").await.unwrap();
        assert_eq!(store.get(&path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn put_leaves_no_staging_files() {
        let (store, _dir) = temp_store().await;
        let path = store.blob_path(StudentId::from_i64(5), "gif");
        store.put(&path, b"gif").await.unwrap();

        let mut entries = fs::read_dir(store.root().join(STAGING_DIR_NAME))
            .await
            .unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn put_creates_missing_root() {
        let (store, _dir) = temp_store().await;
        fs::remove_dir_all(store.root()).await.unwrap();

        let path = store.blob_path(StudentId::from_i64(2), "png");
        store.put(&path, b"data").await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let (store, _dir) = temp_store().await;
        let path = store.blob_path(StudentId::from_i64(404), "png");

        let err = store.get(&path).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(p) if p == path));
    }

    #[tokio::test]
    async fn delete_reports_presence() {
        let (store, _dir) = temp_store().await;
        let path = store.blob_path(StudentId::from_i64(3), "png");
        store.put(&path, b"data").await.unwrap();

        assert!(store.delete(&path).await.unwrap());
        assert!(!store.delete(&path).await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn ensure_dir_is_idempotent() {
        let (store, _dir) = temp_store().await;
        let path = store.root().join("nested").join("7.png");

        store.ensure_dir(&path).await.unwrap();
        store.ensure_dir(&path).await.unwrap();
        assert!(store.root().join("nested").is_dir());
    }
}
