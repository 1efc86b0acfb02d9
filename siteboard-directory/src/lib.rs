//! Site discovery for Siteboard.
//!
//! Two cooperating pieces:
//! - A remote directory client with two retrieval paths: an indexed search
//!   (preferred) and a slower bulk enumeration used as a complete
//!   substitute when search is unusable.
//! - A per-scope site cache with a fixed TTL, request collapsing, and
//!   stale-over-error fallback.
//!
//! The host UI calls [`SiteCache::get_sites`]; it never talks to the
//! directory service directly.

mod cache;
mod client;
mod error;
mod fallback;

pub use cache::{SiteCache, SITE_CACHE_TTL};
pub use client::{DirectoryConfig, DirectoryFetcher, HttpDirectoryClient, SiteQuery};
pub use error::{DirectoryError, DirectoryResult, FetchFailure};
pub use fallback::{fetch_with_fallback, FallbackPolicy, FetchOutcome};
