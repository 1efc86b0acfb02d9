//! In-memory key-value store.

use crate::{KeyValueStore, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// A `HashMap`-backed store.
///
/// Used by tests and as the session-only fallback when no durable storage
/// is available.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("store mutex poisoned").len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }

    fn put_raw(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .expect("store mutex poisoned")
            .remove(key);
    }
}
