use sea_orm::DbErr;
use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

/// Coarse classification shared by every service error, used by outer
/// surfaces to pick a status without matching on each variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    IllegalState,
    InvalidInput,
    EmptyInput,
    IoFailure,
    Internal,
}

pub trait Classify {
    fn kind(&self) -> ErrorKind;
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load config")]
    Config(#[from] ConfigError),

    #[error("failed to open database")]
    Db(#[from] DbErr),

    #[error("failed to open avatar store")]
    Storage(#[from] StorageError),
}
