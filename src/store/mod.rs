//! Durable key-value storage for settings and cached results.
//!
//! Values are strings keyed by fixed names; structured results are stored
//! as JSON text under their key.
//! [`FileStorage`] writes through to a JSON object on every change.
pub mod state;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use state::{AppState, Settings, StateStore};

/// Persisted key names. These are external-facing and must not change.
pub mod keys {
    pub const BACKEND_URL: &str = "backend_url";
    pub const WORKSPACE_ID: &str = "workspace_id";
    pub const LAST_ANALYSIS: &str = "last_analysis";
    pub const REPO_INGESTED: &str = "repo_ingested";
    pub const LAST_SCREENSHOT: &str = "last_screenshot";
    pub const LAST_AUDIO: &str = "last_audio";
    pub const LAST_REPO_PATH: &str = "last_repo_path";

    pub const ALL: [&str; 7] = [
        BACKEND_URL,
        WORKSPACE_ID,
        LAST_ANALYSIS,
        REPO_INGESTED,
        LAST_SCREENSHOT,
        LAST_AUDIO,
        LAST_REPO_PATH,
    ];
}

/// String key-value storage.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// In-memory storage
// ---------------------------------------------------------------------------

/// Storage that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File storage
// ---------------------------------------------------------------------------

/// Storage persisted as one JSON object, rewritten on every change.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open the store at `path`. A missing or malformed file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("failed to create storage directory")?;
        }
        let json = serde_json::to_string_pretty(&self.values).context("failed to serialize store")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Open the configured store, or an in-memory one when no home directory
/// can be resolved.
pub fn open_default(config: &crate::config::ClientConfig) -> Box<dyn Storage> {
    match config.storage.resolved_path() {
        Some(path) => Box::new(FileStorage::open(path)),
        None => Box::new(MemoryStorage::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_writes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = FileStorage::open(&path);
        store.set(keys::BACKEND_URL, "http://x").unwrap();
        assert!(path.exists());

        let reopened = FileStorage::open(&path);
        assert_eq!(reopened.get(keys::BACKEND_URL).as_deref(), Some("http://x"));
    }

    #[test]
    fn file_storage_remove_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = FileStorage::open(&path);
        store.set(keys::LAST_AUDIO, "{}").unwrap();
        store.remove(keys::LAST_AUDIO).unwrap();

        assert!(FileStorage::open(&path).get(keys::LAST_AUDIO).is_none());
    }

    #[test]
    fn malformed_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStorage::open(&path);
        assert!(store.get(keys::WORKSPACE_ID).is_none());
    }

    #[test]
    fn memory_storage_roundtrip() {
        let mut store = MemoryStorage::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.get("k").is_none());
    }
}
