//! Error types for the page type system.

use thiserror::Error;

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Slug already in use: {0}")]
    SlugConflict(String),

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("sled: {}", err),
        ))
    }
}

/// Errors surfaced by page type operations
///
/// Not-found is never an error here: lookups return `Option` and the
/// loader reports a skip instead.
#[derive(Debug, Error)]
pub enum PageTypeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Join failed: {0}")]
    Join(String),

    #[error("Dispatch failed: {0}")]
    Dispatch(String),
}

impl PageTypeError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PageTypeError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for PageTypeError {
    fn from(err: config::ConfigError) -> Self {
        PageTypeError::Configuration(err.to_string())
    }
}
