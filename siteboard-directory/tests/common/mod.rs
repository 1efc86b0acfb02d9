//! Shared scripted fetcher for fallback and cache tests.

#![allow(dead_code)]

use async_trait::async_trait;
use siteboard_directory::{DirectoryError, DirectoryFetcher, DirectoryResult, SiteQuery};
use siteboard_types::{Site, SiteQueryResult, SiteSource};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub type Responder = Box<dyn Fn(usize) -> DirectoryResult<SiteQueryResult> + Send + Sync>;

/// A fetcher whose two paths run scripted responders and count calls.
///
/// The responder receives the zero-based call number, so tests can script
/// fail-then-succeed sequences.
pub struct ScriptedFetcher {
    search: Responder,
    enumeration: Responder,
    delay: Duration,
    search_calls: AtomicUsize,
    enum_calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(search: Responder, enumeration: Responder) -> Self {
        Self {
            search,
            enumeration,
            delay: Duration::ZERO,
            search_calls: AtomicUsize::new(0),
            enum_calls: AtomicUsize::new(0),
        }
    }

    /// Adds an artificial delay to every call, so tests can overlap
    /// callers deterministically under a paused clock.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn enum_calls(&self) -> usize {
        self.enum_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryFetcher for ScriptedFetcher {
    async fn fetch_via_search(&self, _query: &SiteQuery) -> DirectoryResult<SiteQueryResult> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.search)(call)
    }

    async fn fetch_via_enumeration(&self) -> DirectoryResult<SiteQueryResult> {
        let call = self.enum_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        (self.enumeration)(call)
    }
}

/// A test site with the given suffix.
pub fn site(n: usize) -> Site {
    Site::new(
        format!("site-{n}"),
        format!("Team {n}"),
        format!("https://contoso.com/sites/team-{n}"),
    )
    .unwrap()
}

/// Responder returning `count` sites from the given source on every call.
pub fn ok_sites(count: usize, source: SiteSource) -> Responder {
    Box::new(move |_| Ok(SiteQueryResult::new((0..count).map(site).collect(), source)))
}

/// Responder failing with a network error on every call.
pub fn network_error() -> Responder {
    Box::new(|_| Err(DirectoryError::Network("connection refused".to_string())))
}

/// Responder failing with a permission denial on every call.
pub fn permission_denied() -> Responder {
    Box::new(|_| Err(DirectoryError::PermissionDenied("forbidden".to_string())))
}

/// Responder failing with capability-unavailable on every call.
pub fn capability_unavailable() -> Responder {
    Box::new(|_| Err(DirectoryError::CapabilityUnavailable))
}
