use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::error::StorageError;
use crate::ids::StudentId;

/// Path-addressed storage for avatar images.
///
/// Every student owns at most one blob, named `<root>/<student_id>.<ext>`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Directory all blobs live under.
    fn root(&self) -> &Path;

    /// Location of a student's blob for the given extension.
    fn blob_path(&self, student_id: StudentId, extension: &str) -> PathBuf {
        self.root().join(format!("{student_id}.{extension}"))
    }

    /// Create the parent directory of `path` if it is missing.
    async fn ensure_dir(&self, path: &Path) -> Result<(), StorageError>;

    /// Write `data` to `path`, replacing whatever was there.
    ///
    /// On failure the previous content at `path` is left untouched.
    async fn put(&self, path: &Path, data: &[u8]) -> Result<(), StorageError>;

    /// Read all bytes stored at `path`.
    async fn get(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Remove the blob at `path`.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, path: &Path) -> Result<bool, StorageError>;
}
