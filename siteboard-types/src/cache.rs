//! Time-boxed cache entries.
//!
//! A `CacheEntry` pairs a value with the moment it was stored and a
//! time-to-live. Freshness is a pure function of those two fields; eviction
//! and replacement policy belong to whoever owns the entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A value with a storage timestamp and a time-to-live.
///
/// The entry is fresh iff `now - stored_at < ttl`. A stale entry is not
/// discarded here; owners may still serve it as a fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// The cached value.
    pub value: T,
    /// When the value was stored.
    pub stored_at: DateTime<Utc>,
    /// How long the value stays fresh.
    pub ttl: Duration,
}

impl<T> CacheEntry<T> {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
            ttl,
        }
    }

    /// Creates an entry with an explicit storage timestamp.
    #[must_use]
    pub fn new_at(value: T, stored_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    /// Returns true if the entry is fresh at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        match (now - self.stored_at).to_std() {
            Ok(elapsed) => elapsed < self.ttl,
            // stored_at is ahead of now (clock went backwards); treat as
            // fresh rather than triggering a refetch storm
            Err(_) => true,
        }
    }

    /// Returns true if the entry is fresh right now.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }
}
