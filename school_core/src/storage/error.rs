use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a [`BlobStore`](super::BlobStore).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Nothing is stored at the path.
    #[error("blob not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("blob io error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(path) => path,
            Self::Io { path, .. } => path,
        }
    }
}
