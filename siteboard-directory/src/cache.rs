//! Per-scope site cache with request collapsing.
//!
//! Each scope moves through `Empty → Loading → Ready(fresh) →
//! Ready(stale) → Loading → …`. A fresh entry is served without a network
//! call; a stale or absent entry (or a forced refresh) triggers exactly
//! one fetch, and every caller that arrives while that fetch is in flight
//! attaches to its result instead of starting another.
//!
//! All state mutation happens under one short-lived lock between awaits;
//! remote calls run outside it.

use crate::client::{DirectoryFetcher, SiteQuery};
use crate::error::{DirectoryError, FetchFailure};
use crate::fallback::{fetch_with_fallback, FallbackPolicy, FetchOutcome};
use siteboard_types::{CacheEntry, Scope};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tracing::{debug, warn};

/// How long a cached result stays fresh.
pub const SITE_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// The shared outcome of one collapsed fetch.
type FetchSlot = Option<Result<Arc<FetchOutcome>, Arc<FetchFailure>>>;

#[derive(Default)]
struct ScopeState {
    entry: Option<CacheEntry<Arc<FetchOutcome>>>,
    inflight: Option<watch::Receiver<FetchSlot>>,
    /// Bumped on invalidation; a completing fetch only writes back into
    /// the generation it started under.
    generation: u64,
}

/// Time-boxed, request-collapsing cache over the directory fetcher.
pub struct SiteCache {
    fetcher: Arc<dyn DirectoryFetcher>,
    policy: FallbackPolicy,
    ttl: Duration,
    scopes: Mutex<HashMap<Scope, ScopeState>>,
}

impl SiteCache {
    /// Creates a cache with the standard TTL and default fallback policy.
    #[must_use]
    pub fn new(fetcher: Arc<dyn DirectoryFetcher>) -> Self {
        Self {
            fetcher,
            policy: FallbackPolicy::default(),
            ttl: SITE_CACHE_TTL,
            scopes: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides the TTL.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Overrides the fallback policy.
    #[must_use]
    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the sites for a scope.
    ///
    /// A fresh cached value is returned without a network call unless
    /// `force_refresh` is set. Concurrent callers during an in-flight
    /// fetch receive that fetch's outcome; at most one fetch per scope is
    /// outstanding at any time.
    ///
    /// # Errors
    ///
    /// Returns the aggregate fetch failure only when no prior cached
    /// value exists for the scope; otherwise the previous value is served.
    pub async fn get_sites(
        &self,
        scope: &Scope,
        query: &SiteQuery,
        force_refresh: bool,
    ) -> Result<Arc<FetchOutcome>, Arc<FetchFailure>> {
        // Fast path, attach, or claim, all in one short lock section.
        let (tx, generation) = {
            let mut scopes = self.scopes.lock().await;
            let state = scopes.entry(scope.clone()).or_default();

            if !force_refresh {
                if let Some(entry) = &state.entry {
                    if entry.is_fresh() {
                        debug!(%scope, "serving fresh cached sites");
                        return Ok(entry.value.clone());
                    }
                }
            }

            if let Some(rx) = &state.inflight {
                let rx = rx.clone();
                // A dead, unresolved channel means the driving caller was
                // cancelled mid-fetch; claim a new fetch instead of
                // waiting forever.
                if rx.has_changed().is_ok() || rx.borrow().is_some() {
                    drop(scopes);
                    return await_inflight(rx).await;
                }
                state.inflight = None;
            }

            let (tx, rx) = watch::channel(None);
            state.inflight = Some(rx);
            (tx, state.generation)
        };

        // This caller drives the fetch; everyone arriving meanwhile is
        // attached to `tx`.
        let outcome = fetch_with_fallback(self.fetcher.as_ref(), query, self.policy).await;

        let resolved = {
            let mut scopes = self.scopes.lock().await;
            let state = scopes.entry(scope.clone()).or_default();
            let current = state.generation == generation;
            if current {
                state.inflight = None;
            }

            match outcome {
                Ok(outcome) => {
                    let outcome = Arc::new(outcome);
                    if current {
                        state.entry = Some(CacheEntry::new(outcome.clone(), self.ttl));
                    } else {
                        debug!(%scope, "fetch superseded by invalidation, not cached");
                    }
                    Ok(outcome)
                }
                Err(failure) => {
                    let failure = Arc::new(failure);
                    match (&state.entry, current) {
                        (Some(entry), true) => {
                            warn!(%scope, error = %failure, "fetch failed, serving previous cached value");
                            Ok(entry.value.clone())
                        }
                        _ => Err(failure),
                    }
                }
            }
        };

        // Attached callers observe the exact same resolution.
        let _ = tx.send(Some(resolved.clone()));
        resolved
    }

    /// Discards the cached entry for a scope.
    ///
    /// Call when the scope's identity context changes. An in-flight fetch
    /// keeps running and its attached callers still receive its outcome,
    /// but its result is not written back into the new generation.
    pub async fn invalidate(&self, scope: &Scope) {
        let mut scopes = self.scopes.lock().await;
        if let Some(state) = scopes.get_mut(scope) {
            state.entry = None;
            state.inflight = None;
            state.generation += 1;
        }
    }

    /// Returns the cached outcome for a scope without fetching, fresh or
    /// stale.
    pub async fn peek(&self, scope: &Scope) -> Option<Arc<FetchOutcome>> {
        let scopes = self.scopes.lock().await;
        scopes
            .get(scope)
            .and_then(|state| state.entry.as_ref())
            .map(|entry| entry.value.clone())
    }
}

/// Waits for an in-flight fetch to publish its outcome.
async fn await_inflight(
    mut rx: watch::Receiver<FetchSlot>,
) -> Result<Arc<FetchOutcome>, Arc<FetchFailure>> {
    loop {
        let current = rx.borrow_and_update().clone();
        if let Some(resolved) = current {
            return resolved;
        }
        if rx.changed().await.is_err() {
            // Sender dropped without publishing: the driving caller was
            // cancelled mid-fetch.
            return Err(Arc::new(FetchFailure::primary_only(
                DirectoryError::Network("in-flight fetch was abandoned".to_string()),
            )));
        }
    }
}
