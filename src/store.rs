//! Storage backends
//!
//! The persisted state is a handful of named blobs, each holding one
//! JSON-encoded array. Backends only move opaque strings; encoding lives in
//! [`crate::repository`].

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

/// Names of the persisted arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    /// Collection records
    Collections,

    /// Order records
    Orders,

    /// Missing-item entries
    MissingItems,
}

impl StoreKey {
    /// Every key, in a stable order.
    pub const ALL: [StoreKey; 3] = [
        StoreKey::Collections,
        StoreKey::Orders,
        StoreKey::MissingItems,
    ];

    /// Key name as used by the browser application.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Collections => "collections",
            StoreKey::Orders => "orders",
            StoreKey::MissingItems => "missingItems",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A blob could not be read.
    #[error("Failed to read {key}: {source}")]
    Read {
        /// Key being read
        key: StoreKey,

        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// A blob could not be written.
    #[error("Failed to write {key}: {source}")]
    Write {
        /// Key being written
        key: StoreKey,

        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

/// Key-value blob storage.
#[cfg_attr(test, mockall::automock)]
pub trait Storage {
    /// Reads the blob stored under `key`, `None` if nothing was ever written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the backend fails.
    fn read(&self, key: StoreKey) -> Result<Option<String>, StoreError>;

    /// Replaces the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the backend fails.
    fn write(&mut self, key: StoreKey, blob: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the blobs.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`.
    pub fn path_for(&self, key: StoreKey) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);

        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(%key, path = %path.display(), "no stored blob");
                Ok(None)
            }
            Err(source) => Err(StoreError::Read { key, source }),
        }
    }

    fn write(&mut self, key: StoreKey, blob: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);

        fs::create_dir_all(&self.dir)
            .and_then(|()| fs::write(&path, blob))
            .map_err(|source| StoreError::Write { key, source })?;

        debug!(%key, path = %path.display(), bytes = blob.len(), "wrote blob");

        Ok(())
    }
}

/// In-process storage, mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: FxHashMap<StoreKey, String>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a raw blob.
    #[must_use]
    pub fn with_blob(mut self, key: StoreKey, blob: impl Into<String>) -> Self {
        self.blobs.insert(key, blob.into());
        self
    }

    /// Raw blob stored under `key`.
    pub fn blob(&self, key: StoreKey) -> Option<&str> {
        self.blobs.get(&key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: StoreKey) -> Result<Option<String>, StoreError> {
        Ok(self.blobs.get(&key).cloned())
    }

    fn write(&mut self, key: StoreKey, blob: &str) -> Result<(), StoreError> {
        self.blobs.insert(key, blob.to_string());
        Ok(())
    }
}
