//! Flat key-value storage backends.

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key contains characters that cannot be used as a storage name.
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
    /// Reading the stored value failed.
    #[error("failed to read `{key}`")]
    Read {
        /// Key being read.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Writing the value failed.
    #[error("failed to write `{key}`")]
    Write {
        /// Key being written.
        key: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

/// Flat string storage addressed by key.
pub trait KeyValueStore {
    /// Reads the value stored under the key, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores the value under the key, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// In-memory store used by tests and embedding hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls observed so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let _ = self.entries.insert(key.to_owned(), value.to_owned());
        self.writes += 1;
        Ok(())
    }
}

/// Store keeping one file per key inside a directory.
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Creates a store rooted at the provided directory.
    ///
    /// The directory is created lazily on the first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the stored files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(self.root.join(key))
        } else {
            Err(StoreError::InvalidKey(key.to_owned()))
        }
    }
}

impl KeyValueStore for DirectoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(path) {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Read {
                key: key.to_owned(),
                source,
            }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let write_error = |source| StoreError::Write {
            key: key.to_owned(),
            source,
        };
        std::fs::create_dir_all(&self.root).map_err(write_error)?;
        std::fs::write(path, value).map_err(write_error)
    }
}
