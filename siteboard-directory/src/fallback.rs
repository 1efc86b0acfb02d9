//! Search-to-enumeration fallback orchestration.
//!
//! The search path is attempted first. On failure the enumeration path is
//! attempted as a complete substitute, never a merge. If both fail, the
//! search error is authoritative and the enumeration error rides along as
//! supplementary context.

use crate::client::{DirectoryFetcher, SiteQuery};
use crate::error::{DirectoryError, FetchFailure};
use siteboard_types::SiteQueryResult;
use tracing::warn;

/// Controls which search-path failures trigger the enumeration fallback.
///
/// Transport failures, capability-unavailable responses, and malformed
/// payloads always fall back. Whether an authorization denial does is
/// tenant policy: the enumeration path carries its own authorization, so
/// falling back is usually right, but a deployment may prefer to surface
/// the denial instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Fall back to enumeration when search is denied by authorization.
    pub fall_back_on_permission_denied: bool,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            fall_back_on_permission_denied: true,
        }
    }
}

impl FallbackPolicy {
    /// Returns true if the given search-path error should trigger the
    /// enumeration fallback.
    #[must_use]
    pub fn triggers_fallback(&self, error: &DirectoryError) -> bool {
        match error {
            DirectoryError::PermissionDenied(_) => self.fall_back_on_permission_denied,
            _ => true,
        }
    }
}

/// A successful fetch plus its diagnostic context.
#[derive(Debug)]
pub struct FetchOutcome {
    /// The retrieved sites.
    pub result: SiteQueryResult,
    /// The search-path error, when the result came from the fallback.
    pub search_error: Option<DirectoryError>,
}

impl FetchOutcome {
    /// True if the result came from the enumeration fallback.
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.search_error.is_some()
    }
}

/// Fetches sites, search first, enumeration as substitute.
///
/// # Errors
///
/// Returns a [`FetchFailure`] when the search path fails without a
/// fallback (per policy) or when both paths fail.
pub async fn fetch_with_fallback(
    fetcher: &dyn DirectoryFetcher,
    query: &SiteQuery,
    policy: FallbackPolicy,
) -> Result<FetchOutcome, FetchFailure> {
    let search_error = match fetcher.fetch_via_search(query).await {
        Ok(result) => {
            return Ok(FetchOutcome {
                result,
                search_error: None,
            })
        }
        Err(err) => err,
    };

    if !policy.triggers_fallback(&search_error) {
        return Err(FetchFailure::primary_only(search_error));
    }

    warn!(error = %search_error, "search path failed, falling back to enumeration");
    match fetcher.fetch_via_enumeration().await {
        Ok(result) => Ok(FetchOutcome {
            result,
            search_error: Some(search_error),
        }),
        Err(enum_error) => Err(FetchFailure::both(search_error, enum_error)),
    }
}
