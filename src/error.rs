//! Error types for cursor-pager
//!
//! This module defines the error hierarchy for the pagination engine.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//! Failures reported by a storage collaborator live in
//! [`crate::storage::StorageError`] and are wrapped by [`Error::Storage`].

use crate::storage::StorageError;
use thiserror::Error;

/// The main error type for cursor-pager
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Input Errors (detected before any storage call)
    // ============================================================================
    #[error("Invalid limit {limit}: {message}")]
    InvalidLimit { limit: i64, message: String },

    #[error("Invalid cursor: {reason}")]
    InvalidCursor { reason: String },

    #[error("Next and previous cursors cannot both be set")]
    ConflictingCursors,

    #[error("Invalid sort field '{field}': {message}")]
    InvalidSortField { field: String, message: String },

    #[error("Invalid filter: {message}")]
    Filter { message: String },

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

impl Error {
    /// Create an invalid limit error
    pub fn invalid_limit(limit: i64, message: impl Into<String>) -> Self {
        Self::InvalidLimit {
            limit,
            message: message.into(),
        }
    }

    /// Create an invalid cursor error
    pub fn invalid_cursor(reason: impl Into<String>) -> Self {
        Self::InvalidCursor {
            reason: reason.into(),
        }
    }

    /// Create an invalid sort field error
    pub fn invalid_sort_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSortField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a filter error
    pub fn filter(message: impl Into<String>) -> Self {
        Self::Filter {
            message: message.into(),
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error was caused by caller input.
    ///
    /// Input errors are raised before the storage collaborator is touched,
    /// so the caller can correct the request and retry.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidLimit { .. }
                | Error::InvalidCursor { .. }
                | Error::ConflictingCursors
                | Error::Filter { .. }
        )
    }

    /// Check if this error came from the storage collaborator
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidSort { field, message } => {
                Error::InvalidSortField { field, message }
            }
            other => Error::Storage(other),
        }
    }
}

/// Result type alias for cursor-pager
pub type Result<T> = std::result::Result<T, Error>;
