//! File-backed key-value store.
//!
//! One JSON blob per key, stored as a file under a root directory. Key
//! strings are percent-encoded into filesystem-safe names so namespace
//! separators survive the mapping without collisions.

use crate::{KeyValueStore, StorageError, StorageResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A store persisting each key as a file under a root directory.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at the given directory.
    ///
    /// The directory is created lazily on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a store under the platform data directory
    /// (e.g. `~/.local/share/siteboard` on Linux).
    ///
    /// Falls back to the current directory when the platform reports no
    /// data directory.
    #[must_use]
    pub fn in_data_dir() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("siteboard");
        Self::new(root)
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", encode_key(key)))
    }

    fn classify(err: std::io::Error) -> StorageError {
        match err.kind() {
            ErrorKind::StorageFull | ErrorKind::QuotaExceeded => StorageError::QuotaExceeded,
            ErrorKind::PermissionDenied => StorageError::AccessDenied(err.to_string()),
            _ => StorageError::Io(err),
        }
    }
}

impl KeyValueStore for FileStore {
    fn get_raw(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(key, error = %err, "store read failed, treating as missing");
                None
            }
        }
    }

    fn put_raw(&self, key: &str, value: &str) -> StorageResult<()> {
        fs::create_dir_all(&self.root).map_err(Self::classify)?;
        let path = self.path_for(key);

        // Write-then-rename so a crash mid-write leaves the old blob intact.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(Self::classify)?;
        fs::rename(&tmp, &path).map_err(Self::classify)
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if let Err(err) = fs::remove_file(&path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(key, error = %err, "store remove failed");
            }
        }
    }
}

/// Encodes a key into a filesystem-safe name.
///
/// Alphanumerics, `.`, `_`, and `-` pass through; everything else becomes
/// `%XX`. The encoding is injective, so distinct keys map to distinct files.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'.' | b'_' | b'-' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02x}")),
        }
    }
    out
}
