//! Error types for site discovery.

use thiserror::Error;

/// Result type for directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Errors that can occur talking to the directory service.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Transport failure or timeout.
    #[error("network error: {0}")]
    Network(String),

    /// The service denied the request for this identity.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The search capability is disabled for this tenant.
    ///
    /// Distinct from a transient failure: the caller should fall back to
    /// enumeration rather than retry.
    #[error("search capability unavailable for tenant")]
    CapabilityUnavailable,

    /// Any other non-2xx response.
    #[error("directory service returned HTTP {status}")]
    Http {
        /// The response status code.
        status: u16,
    },

    /// The response payload was malformed beyond per-record recovery.
    #[error("malformed response: {0}")]
    Validation(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for DirectoryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DirectoryError::Network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            DirectoryError::Validation(err.to_string())
        } else {
            DirectoryError::Network(err.to_string())
        }
    }
}

/// Aggregate failure after both retrieval paths were exhausted.
///
/// The search path's error is authoritative for user-facing messaging;
/// the enumeration error is supplementary context.
#[derive(Debug, Error)]
#[error("directory fetch failed: {primary}")]
pub struct FetchFailure {
    /// The search-path error.
    pub primary: DirectoryError,
    /// The enumeration-path error, when the fallback was attempted.
    pub fallback: Option<DirectoryError>,
}

impl FetchFailure {
    /// Wraps a search-path error that was not (or could not be) retried
    /// via enumeration.
    #[must_use]
    pub fn primary_only(primary: DirectoryError) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Wraps the errors from both paths.
    #[must_use]
    pub fn both(primary: DirectoryError, fallback: DirectoryError) -> Self {
        Self {
            primary,
            fallback: Some(fallback),
        }
    }
}
