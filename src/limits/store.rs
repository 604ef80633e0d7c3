use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::platform;

/// Names of the persisted records, one blob per key
pub mod keys {
    pub const USAGE_TODAY: &str = "usage_today";
    pub const BYPASS_COUNT: &str = "bypass_count";
    pub const LAST_RESET: &str = "last_reset";
    pub const TOTAL_BYPASSES: &str = "total_bypasses";
    pub const EXTENSION_UNTIL: &str = "extension_until";
    pub const SESSION_START: &str = "session_start_time";
    pub const BYPASS_LOG: &str = "bypass_log";
    pub const LOCKED_OUT: &str = "locked_out";
    pub const LAST_CHECK: &str = "last_check_time";
}

/// Generic key-value store of JSON blobs
///
/// A `set` is visible to every later `get` of the same key on the same store.
/// Values that fail to decode are reported as absent by the typed helpers, so
/// a damaged record degrades to its zero value instead of aborting the caller.
pub trait StateStore {
    /// Read the raw JSON text stored under `key`
    fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set_raw(&mut self, key: &str, value: String) -> Result<()>;

    /// Delete `key`; deleting a missing key is a no-op
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Read and decode a typed value, treating unreadable or corrupt data as absent
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T>
    where
        Self: Sized,
    {
        let raw = match self.get_raw(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read '{}', treating as absent: {:#}", key, e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Stored value for '{}' is corrupt, treating as absent: {}", key, e);
                None
            }
        }
    }

    /// Encode and store a typed value
    fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize value for '{}'", key))?;
        self.set_raw(key, raw)
    }
}

/// Store keeping each key in its own `<key>.json` file inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`; the directory is created on first write
    pub fn open(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Open the store in the platform data directory
    pub fn open_default() -> Result<Self> {
        Ok(Self::open(default_data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl StateStore for FileStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read state file: {}", path.display())),
        }
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<()> {
        let path = self.path_for(key);
        platform::atomic_write(&path, value.as_bytes())
            .with_context(|| format!("Failed to write state file: {}", path.display()))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        platform::remove_if_exists(&self.path_for(key))
    }
}

/// In-memory store, used by tests and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }
}

impl StateStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set_raw(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Get the platform-specific directory holding the state store
pub fn default_data_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("", "", "scroll-guard")
        .map(|dirs| dirs.data_local_dir().join("state"))
        .context("Could not determine state directory location")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_set_is_visible_to_get() {
        let mut store = MemoryStore::new();
        store.set(keys::USAGE_TODAY, &17u32).unwrap();
        assert_eq!(store.get::<u32>(keys::USAGE_TODAY), Some(17));
    }

    #[test]
    fn missing_key_is_absent() {
        let store = MemoryStore::new();
        assert_eq!(store.get::<u32>(keys::BYPASS_COUNT), None);
    }

    #[test]
    fn corrupt_value_is_treated_as_absent() {
        let mut store = MemoryStore::new();
        store.set_raw(keys::BYPASS_COUNT, "{not json".to_string()).unwrap();
        assert_eq!(store.get::<u32>(keys::BYPASS_COUNT), None);
    }

    #[test]
    fn null_value_is_treated_as_absent() {
        let mut store = MemoryStore::new();
        store.set_raw(keys::SESSION_START, "null".to_string()).unwrap();
        assert_eq!(store.get::<i64>(keys::SESSION_START), None);
    }

    #[test]
    fn remove_deletes_key() {
        let mut store = MemoryStore::new();
        store.set(keys::LOCKED_OUT, &true).unwrap();
        store.remove(keys::LOCKED_OUT).unwrap();
        assert!(!store.contains(keys::LOCKED_OUT));
        store.remove(keys::LOCKED_OUT).unwrap();
    }

    #[test]
    fn file_store_roundtrips_through_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(temp_dir.path().join("state"));

        store.set(keys::LAST_RESET, &"2026-10-18".to_string()).unwrap();

        let content = std::fs::read_to_string(store.path_for(keys::LAST_RESET)).unwrap();
        assert_eq!(content, "\"2026-10-18\"");

        let reopened = FileStore::open(temp_dir.path().join("state"));
        assert_eq!(reopened.get::<String>(keys::LAST_RESET), Some("2026-10-18".to_string()));
    }

    #[test]
    fn file_store_corrupt_file_is_absent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(temp_dir.path());
        std::fs::write(store.path_for(keys::USAGE_TODAY), "garbage").unwrap();

        assert_eq!(store.get::<u32>(keys::USAGE_TODAY), None);
    }

    #[test]
    fn file_store_remove_missing_key_is_ok() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(temp_dir.path());
        store.remove(keys::EXTENSION_UNTIL).unwrap();
    }
}
