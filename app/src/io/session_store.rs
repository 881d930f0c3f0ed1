use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

pub(crate) const ACCESS_TOKEN_KEY: &str = "access_token";
pub(crate) const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub(crate) const USER_KEY: &str = "user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Durable string key/value storage surviving restarts.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Writes `set` and drops `remove` as one change. On error nothing is applied.
    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(&[(key, value)], &[])
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(&[], &[key])
    }
}

fn apply(entries: &mut BTreeMap<String, String>, set: &[(&str, &str)], remove: &[&str]) {
    for (key, value) in set {
        entries.insert(key.to_string(), value.to_string());
    }
    for key in remove {
        entries.remove(*key);
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StoreError> {
        apply(&mut self.entries(), set, remove);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// `DEVLAB_SESSION_FILE`, or `<data dir>/devlab/session.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("DEVLAB_SESSION_FILE") {
            return PathBuf::from(path);
        }
        dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("devlab")
            .join("session.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    // The in-memory map only changes once the file holds the new contents.
    fn update(&self, set: &[(&str, &str)], remove: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries();
        let mut next = entries.clone();
        apply(&mut next, set, remove);
        if next == *entries {
            return Ok(());
        }
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
