//! Scoped key-value persistence for Siteboard.
//!
//! Small JSON blobs (favorites, settings, cached verdicts) are persisted
//! through a `KeyValueStore`, namespaced per user+tenant scope so accounts
//! sharing a device never read each other's data.
//!
//! The adapter degrades rather than fails:
//! - reads fall back to a documented default on missing, corrupt, or
//!   inaccessible storage, with corruption logged, never thrown
//! - writes that hit quota exhaustion or disabled storage become logged
//!   no-ops; the caller's in-memory state stays authoritative for the
//!   session

mod error;
mod file;
mod memory;
mod scoped;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use scoped::ScopedStore;

/// Raw string-valued key-value storage.
///
/// Implementations are synchronous and idempotent; each call is a single
/// atomic operation from the caller's point of view. JSON encoding,
/// scoping, and the degrade-on-failure policy live in [`ScopedStore`].
pub trait KeyValueStore: Send + Sync {
    /// Reads the raw value for a key.
    ///
    /// Returns `None` for missing keys and for read failures;
    /// implementations log the latter.
    fn get_raw(&self, key: &str) -> Option<String>;

    /// Writes the raw value for a key.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing storage rejects the write
    /// (quota exhausted, access denied, I/O failure).
    fn put_raw(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removes a key. Removing an absent key is a no-op.
    fn remove(&self, key: &str);
}
