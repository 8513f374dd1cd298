//! Error types and handling
//!
//! Common error types used across the recording store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Storage error during {op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: Box<AppError>,
    },

    #[error("Recording not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Wrap an underlying failure with the lifecycle operation it happened in
    pub fn storage(op: &'static str, source: AppError) -> Self {
        // Never nest one storage wrapper inside another
        match source {
            AppError::Storage { .. } | AppError::NotFound(_) => source,
            other => AppError::Storage {
                op,
                source: Box::new(other),
            },
        }
    }

    /// The innermost cause, looking through `Storage` wrappers
    pub fn root(&self) -> &AppError {
        match self {
            AppError::Storage { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Error response for frontend
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Io(_) => "IO_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Persistence(_) => "PERSISTENCE_ERROR",
            AppError::Storage { .. } => "STORAGE_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Config(_) => "CONFIG_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
