use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::info;

static DATA_DIR_NAME: &str = "school_records";
static SCHOOL_DB_NAME: &str = "school_db.sqlite";
static AVATARS_DIR_NAME: &str = "avatars";
static CONFIG_FILE_NAME: &str = "config.json";

/// Overrides the platform data directory when set.
pub static DATA_DIR_ENV: &str = "SCHOOL_DATA_DIR";

// For now this directory structure should be like
// data_dir_path
// |- school_records
//    |- school_db.sqlite
//    |- avatars/
//    |- config.json

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_log_filter() -> String {
    "info".to_string()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to find a data directory on this platform")]
    NoDataDir,
    #[error("config io error")]
    Io(#[from] std::io::Error),
    #[error("malformed config file")]
    Parse(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SchoolConfig {
    pub database_path: PathBuf,

    /// Root of the avatar blob store; blobs live at `<avatars_path>/<student_id>.<ext>`.
    pub avatars_path: PathBuf,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Upper bound for a single request body (avatar uploads).
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl SchoolConfig {
    /// Creates a new SchoolConfig rooted at the specified data directory
    pub fn new(data_dir: &Path) -> Self {
        SchoolConfig {
            database_path: data_dir.join(SCHOOL_DB_NAME),
            avatars_path: data_dir.join(AVATARS_DIR_NAME),
            listen_addr: default_listen_addr(),
            max_upload_bytes: default_max_upload_bytes(),
            log_filter: default_log_filter(),
        }
    }
}

/// Gets the existing config or initializes a new one if it doesn't exist.
///
/// The directory is `$SCHOOL_DATA_DIR` when set, otherwise the platform data
/// directory joined with `school_records`.
pub async fn get_or_init() -> Result<SchoolConfig, ConfigError> {
    let school_dir = match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .ok_or(ConfigError::NoDataDir)?
            .join(DATA_DIR_NAME),
    };

    get_or_init_in(&school_dir).await
}

/// Same as [`get_or_init`] for an explicit directory.
pub async fn get_or_init_in(school_dir: &Path) -> Result<SchoolConfig, ConfigError> {
    let config_path = school_dir.join(CONFIG_FILE_NAME);

    // Create the data directory if it doesn't exist
    fs::create_dir_all(school_dir).await?;

    if fs::try_exists(&config_path).await? {
        // Read and deserialize existing config
        let mut file = fs::File::open(&config_path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;

        let config: SchoolConfig = serde_json::from_str(&contents)?;
        Ok(config)
    } else {
        let config = SchoolConfig::new(school_dir);

        // Serialize and write to file
        let json = serde_json::to_string_pretty(&config)?;
        let mut file = fs::File::create(&config_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        info!(path = %config_path.display(), "wrote default config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_default_config_once() {
        let dir = tempfile::tempdir().unwrap();

        let created = get_or_init_in(dir.path()).await.unwrap();
        assert_eq!(created.database_path, dir.path().join(SCHOOL_DB_NAME));
        assert_eq!(created.avatars_path, dir.path().join(AVATARS_DIR_NAME));
        assert!(dir.path().join(CONFIG_FILE_NAME).exists());

        let reloaded = get_or_init_in(dir.path()).await.unwrap();
        assert_eq!(created, reloaded);
    }

    #[tokio::test]
    async fn missing_optional_fields_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let json = r#"{ "database_path": "/tmp/db.sqlite", "avatars_path": "/tmp/avatars" }"#;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), json).unwrap();

        let config = get_or_init_in(dir.path()).await.unwrap();
        assert_eq!(config.avatars_path, PathBuf::from("/tmp/avatars"));
        assert_eq!(config.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.log_filter, "info");
    }

    #[tokio::test]
    async fn malformed_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();

        let result = get_or_init_in(dir.path()).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
