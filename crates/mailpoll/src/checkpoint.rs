//! Checkpoint storage.
//!
//! A checkpoint is a small string value kept under a key between poll
//! cycles. The poller stores the highest sequence number it has seen.

use std::collections::BTreeMap;
#[cfg(test)]
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Error type for checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    /// Reading or writing the checkpoint file failed.
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The checkpoint file is not a JSON object of strings.
    #[error("Checkpoint file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for checkpoint operations.
pub type CheckpointResult<T> = std::result::Result<T, CheckpointError>;

/// Key/value storage for poll checkpoints.
pub trait CheckpointStore {
    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> CheckpointResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn put(&mut self, key: &str, value: &str) -> CheckpointResult<()>;
}

/// Checkpoints kept in a single JSON object file.
///
/// A missing file reads as empty. Writes go to a sibling temporary file
/// that is then renamed over it.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is not touched until the
    /// first read or write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> CheckpointResult<BTreeMap<String, String>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CheckpointStore for JsonFileStore {
    fn get(&self, key: &str) -> CheckpointResult<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn put(&mut self, key: &str, value: &str) -> CheckpointResult<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, serde_json::to_vec_pretty(&entries)?)?;
        std::fs::rename(&tmp, &self.path)?;

        debug!(path = %self.path.display(), key, value, "Checkpoint stored");
        Ok(())
    }
}

/// Checkpoints kept in memory for the life of the process.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

#[cfg(test)]
impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl CheckpointStore for MemoryStore {
    fn get(&self, key: &str) -> CheckpointResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> CheckpointResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
