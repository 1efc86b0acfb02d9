//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing storage is out of space.
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// The backing storage denied access.
    #[error("storage access denied: {0}")]
    AccessDenied(String),

    /// Other I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
