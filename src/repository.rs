//! Repository
//!
//! Typed access to the persisted arrays. Arrays are written inside a small
//! versioned envelope; bare arrays written by the browser application are
//! still accepted on load.
//!
//! Read-modify-write goes through [`StoredArray`], which keeps every entry's
//! stored JSON. Entries that fail to decode are written back untouched, and
//! decoded entries are only changed where an operation patches them.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::store::{Storage, StoreError, StoreKey};

/// Version tag written with every array.
pub const SCHEMA_VERSION: u64 = 1;

/// Errors raised while loading or saving arrays.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Storage backend failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Records could not be encoded.
    #[error("Failed to encode {key}: {source}")]
    Encode {
        /// Key being saved
        key: StoreKey,

        /// Underlying serialisation error
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Serialize)]
struct Envelope<'a, T> {
    version: u64,
    records: &'a [T],
}

/// A stored array with each entry's JSON kept next to its decoded form.
#[derive(Debug, Clone)]
pub struct StoredArray<T> {
    entries: Vec<StoredEntry<T>>,
}

#[derive(Debug, Clone)]
struct StoredEntry<T> {
    raw: Value,
    decoded: Option<T>,
}

impl<T: DeserializeOwned + Serialize> StoredArray<T> {
    fn from_raw(key: StoreKey, raw: Vec<Value>) -> Self {
        let entries = raw
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| {
                let decoded = match serde_json::from_value(raw.clone()) {
                    Ok(decoded) => Some(decoded),
                    Err(error) => {
                        warn!(%key, idx, %error, "keeping undecodable entry as stored");
                        None
                    }
                };

                StoredEntry { raw, decoded }
            })
            .collect();

        Self { entries }
    }

    /// Decoded entries, in stored order.
    pub fn decoded(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().filter_map(|entry| entry.decoded.as_ref())
    }

    /// Number of stored entries, decodable or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries kept only as stored JSON.
    pub fn undecodable(&self) -> usize {
        self.entries.iter().filter(|entry| entry.decoded.is_none()).count()
    }

    /// Applies `patch` to the stored JSON object of every decoded entry for
    /// which `select` holds, then decodes it again. Returns the number patched.
    ///
    /// Fields the patch does not touch keep their stored JSON exactly.
    pub fn patch_where(
        &mut self,
        mut select: impl FnMut(&T) -> bool,
        mut patch: impl FnMut(&mut Map<String, Value>),
    ) -> usize {
        let mut patched = 0;

        for entry in &mut self.entries {
            if !entry.decoded.as_ref().is_some_and(&mut select) {
                continue;
            }

            let Value::Object(object) = &mut entry.raw else {
                continue;
            };

            patch(object);
            entry.decoded = serde_json::from_value(entry.raw.clone()).ok();
            patched += 1;
        }

        patched
    }

    /// Drops every decoded entry for which `keep` is false. Undecodable
    /// entries are always kept. Returns the number removed.
    pub fn retain_decoded(&mut self, mut keep: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();

        self.entries
            .retain(|entry| entry.decoded.as_ref().is_none_or(&mut keep));

        before - self.entries.len()
    }

    /// Appends a new entry.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be encoded as JSON.
    pub fn push(&mut self, value: T) -> Result<(), serde_json::Error> {
        let raw = serde_json::to_value(&value)?;

        self.entries.push(StoredEntry {
            raw,
            decoded: Some(value),
        });

        Ok(())
    }

    fn raw(&self) -> Vec<&Value> {
        self.entries.iter().map(|entry| &entry.raw).collect()
    }
}

/// Typed load/save over a [`Storage`] backend.
#[derive(Debug)]
pub struct Repository<S> {
    storage: S,
}

impl<S: Storage> Repository<S> {
    /// Wraps a storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Consumes the repository, returning the storage.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Loads the array stored under `key` for reading.
    ///
    /// A missing blob, malformed JSON or an unknown schema version yields an
    /// empty array. Individual entries that do not decode are skipped; use
    /// [`Repository::load_stored`] when the array will be written back.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Store`] if the backend cannot be read.
    pub fn load<T: DeserializeOwned>(&self, key: StoreKey) -> Result<Vec<T>, RepositoryError> {
        let entries = self.load_raw(key)?;

        let total = entries.len();

        let records: Vec<T> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(error) => {
                    warn!(%key, idx, %error, "skipping undecodable entry");
                    None
                }
            })
            .collect();

        debug!(%key, loaded = records.len(), skipped = total - records.len(), "loaded array");

        Ok(records)
    }

    /// Loads the array stored under `key` for a read-modify-write cycle.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Store`] if the backend cannot be read.
    pub fn load_stored<T: DeserializeOwned + Serialize>(
        &self,
        key: StoreKey,
    ) -> Result<StoredArray<T>, RepositoryError> {
        Ok(StoredArray::from_raw(key, self.load_raw(key)?))
    }

    /// Writes back an array obtained from [`Repository::load_stored`].
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Encode`] if the entries cannot be encoded, or
    /// [`RepositoryError::Store`] if the backend write fails.
    pub fn save_stored<T: DeserializeOwned + Serialize>(
        &mut self,
        key: StoreKey,
        array: &StoredArray<T>,
    ) -> Result<(), RepositoryError> {
        let kept = array.undecodable();

        self.save(key, array.raw().as_slice())?;

        if kept > 0 {
            warn!(%key, kept, "wrote back undecodable entries unchanged");
        }

        Ok(())
    }

    fn load_raw(&self, key: StoreKey) -> Result<Vec<Value>, RepositoryError> {
        let Some(blob) = self.storage.read(key)? else {
            return Ok(Vec::new());
        };

        Ok(match serde_json::from_str::<Value>(&blob) {
            Ok(value) => unwrap_envelope(key, value),
            Err(error) => {
                warn!(%key, %error, "discarding malformed blob");
                Vec::new()
            }
        })
    }

    /// Replaces the array stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Encode`] if the records cannot be encoded, or
    /// [`RepositoryError::Store`] if the backend write fails.
    pub fn save<T: Serialize>(
        &mut self,
        key: StoreKey,
        records: &[T],
    ) -> Result<(), RepositoryError> {
        let envelope = Envelope {
            version: SCHEMA_VERSION,
            records,
        };

        let blob = serde_json::to_string(&envelope)
            .map_err(|source| RepositoryError::Encode { key, source })?;

        self.storage.write(key, &blob)?;

        debug!(%key, saved = records.len(), "saved array");

        Ok(())
    }
}

fn unwrap_envelope(key: StoreKey, value: Value) -> Vec<Value> {
    match value {
        Value::Array(entries) => entries,
        Value::Object(mut object) => {
            let version = object.get("version").and_then(Value::as_u64);

            match (version, object.remove("records")) {
                (Some(SCHEMA_VERSION), Some(Value::Array(entries))) => entries,
                (version, _) => {
                    warn!(%key, ?version, "unsupported envelope, treating as empty");
                    Vec::new()
                }
            }
        }
        _ => {
            warn!(%key, "stored blob is not an array, treating as empty");
            Vec::new()
        }
    }
}
