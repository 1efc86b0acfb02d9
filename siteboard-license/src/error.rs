//! Error types for the licensing module.

use thiserror::Error;

/// Failure to complete a remote license check.
///
/// Never surfaced to callers as a hard error: the validator resolves
/// every failure to a verdict through the fail-open policy.
#[derive(Debug, Error)]
pub enum LicenseUnreachable {
    /// Transport failure or timeout.
    #[error("license service unreachable: {0}")]
    Network(String),

    /// Non-2xx response from the license service.
    #[error("license service returned HTTP {0}")]
    Http(u16),

    /// The response payload could not be interpreted.
    #[error("malformed license response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for LicenseUnreachable {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LicenseUnreachable::Network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            LicenseUnreachable::Malformed(err.to_string())
        } else {
            LicenseUnreachable::Network(err.to_string())
        }
    }
}
