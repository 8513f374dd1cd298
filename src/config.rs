//! Configuration management
//!
//! Loads storage settings from environment variables (.env file supported),
//! falling back to defaults that keep everything under `./data`.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Key the ledger is stored under in the key-value store
pub const DEFAULT_LEDGER_KEY: &str = "recordings";

/// Extension given to stored blobs
pub const DEFAULT_FILE_EXTENSION: &str = "m4a";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl From<ConfigError> for crate::utils::AppError {
    fn from(error: ConfigError) -> Self {
        crate::utils::AppError::Config(error.to_string())
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory holding the key-value entries (the ledger lives here)
    pub data_dir: PathBuf,
    /// Directory holding recording blobs
    pub recordings_dir: PathBuf,
    /// Key-value key for the ledger
    pub ledger_key: String,
    /// Extension for stored blobs, without the dot
    pub file_extension: String,
    /// Delete unreferenced blobs during `initialize`
    pub sweep_orphans_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            recordings_dir: data_dir.join("recordings"),
            data_dir,
            ledger_key: DEFAULT_LEDGER_KEY.to_string(),
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            sweep_orphans_on_start: false,
        }
    }
}

impl StorageConfig {
    /// Build a configuration rooted at `data_dir`, recordings in `<data_dir>/recordings`
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            recordings_dir: data_dir.join("recordings"),
            data_dir,
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let mut config = match env::var("COUGH_RECORDER_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => Self::with_data_dir(dir),
            _ => Self::default(),
        };

        if let Ok(dir) = env::var("COUGH_RECORDER_RECORDINGS_DIR") {
            if !dir.is_empty() {
                config.recordings_dir = dir.into();
            }
        }

        if let Ok(ext) = env::var("COUGH_RECORDER_FILE_EXTENSION") {
            config.file_extension = ext;
        }

        if let Ok(flag) = env::var("COUGH_RECORDER_SWEEP_ORPHANS") {
            config.sweep_orphans_on_start = parse_bool("COUGH_RECORDER_SWEEP_ORPHANS", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce unusable blob names
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = self.file_extension.trim_start_matches('.');
        if ext.is_empty() || ext.contains(['/', '\\', '.']) {
            return Err(ConfigError::InvalidValue(
                "file_extension".to_string(),
                self.file_extension.clone(),
            ));
        }
        if self.ledger_key.is_empty() || self.ledger_key.contains(['/', '\\']) {
            return Err(ConfigError::InvalidValue(
                "ledger_key".to_string(),
                self.ledger_key.clone(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue(name.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = StorageConfig::default();
        assert_eq!(config.ledger_key, "recordings");
        assert_eq!(config.file_extension, "m4a");
        assert_eq!(config.recordings_dir, PathBuf::from("data").join("recordings"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_extension() {
        let mut config = StorageConfig::default();
        config.file_extension = "../m4a".to_string();
        assert!(config.validate().is_err());

        config.file_extension = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
