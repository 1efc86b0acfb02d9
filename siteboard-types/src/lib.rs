//! Core type definitions for Siteboard.
//!
//! This crate defines the fundamental types shared across the data layer:
//! - User, tenant, and scope identifiers
//! - The site data model (`Site`, `NormalizedUrl`, `SiteQueryResult`)
//! - Generic time-boxed cache entries
//!
//! Presentation concerns (labels, icons, layout) belong to the host UI,
//! not here.

mod cache;
mod ids;
mod site;

pub use cache::CacheEntry;
pub use ids::{Scope, TenantId, UserId};
pub use site::{NormalizedUrl, Site, SiteQueryResult, SiteSource};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid site: {0}")]
    InvalidSite(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
