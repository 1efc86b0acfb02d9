//! Scope-namespaced JSON access over a raw key-value store.

use crate::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use siteboard_types::Scope;
use std::sync::Arc;
use tracing::warn;

/// JSON blob access for one scope.
///
/// Every key is prefixed with the scope namespace before it reaches the
/// underlying store, so two accounts on a shared device never collide.
///
/// Failure policy: reads heal to defaults, writes degrade to logged
/// no-ops. Neither ever surfaces an error; the caller's in-memory state
/// remains the source of truth for the session.
#[derive(Clone)]
pub struct ScopedStore {
    store: Arc<dyn KeyValueStore>,
    scope: Scope,
}

impl ScopedStore {
    /// Creates a scoped view over a store.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, scope: Scope) -> Self {
        Self { store, scope }
    }

    /// Returns the scope this view is bound to.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn scoped_key(&self, key: &str) -> String {
        format!("{}:{}", self.scope.namespace(), key)
    }

    /// Reads and deserializes a value, or `None` when absent or corrupt.
    ///
    /// Corrupt blobs are logged and treated as missing; the stored bytes
    /// are left in place for diagnosis.
    pub fn read_opt<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get_raw(&self.scoped_key(key))?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "corrupt stored blob, falling back to default");
                None
            }
        }
    }

    /// Reads a value, falling back to `T::default()` when absent, corrupt,
    /// or inaccessible.
    pub fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read_opt(key).unwrap_or_default()
    }

    /// Serializes and writes a value.
    ///
    /// Storage failures (quota, disabled storage) degrade to a logged
    /// no-op rather than propagating.
    pub fn write<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(key, error = %err, "serialization failed, skipping write");
                return;
            }
        };
        if let Err(err) = self.store.put_raw(&self.scoped_key(key), &raw) {
            warn!(key, error = %err, "store write failed, keeping in-memory state only");
        }
    }

    /// Removes a key for this scope.
    pub fn remove(&self, key: &str) {
        self.store.remove(&self.scoped_key(key));
    }
}

impl std::fmt::Debug for ScopedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedStore")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}
