//! Local key-value storage and the session-history adapter built on it.

#[cfg(test)]
use std::{cell::RefCell, collections::HashMap, rc::Rc};
use std::{fs, path::PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::session::Session;

/// Key under which the session history is persisted.
pub const HISTORY_KEY: &str = "focus_history";

/// A flat string-to-string store, in the spirit of browser `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

// ============================================================================
// File-backed store
// ============================================================================

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io("reading", path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)
            .map_err(|e| StoreError::io("creating directory", &self.dir, e))?;

        // Write beside the target and rename so a crash never leaves half a file.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(|e| StoreError::io("writing", &tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io("replacing", &path, e))
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// Shared in-memory store. Clones see the same entries.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// JSON helpers
// ============================================================================

pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| StoreError::json(key, e)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    data: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string_pretty(data).map_err(|e| StoreError::json(key, e))?;
    store.set(key, &raw)
}

// ============================================================================
// History adapter
// ============================================================================

/// Reads and writes the whole session history under [`HISTORY_KEY`].
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Missing, unreadable, or malformed history all load as empty. Malformed
    /// data is left in place until the next save overwrites it.
    pub fn load(&self) -> Vec<Session> {
        match load_json::<Vec<Session>>(self.store.as_ref(), HISTORY_KEY) {
            Ok(Some(sessions)) => {
                debug!(count = sessions.len(), "loaded session history");
                sessions
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("discarding unreadable session history: {e}");
                Vec::new()
            }
        }
    }

    pub fn try_save(&self, sessions: &[Session]) -> Result<(), StoreError> {
        save_json(self.store.as_ref(), HISTORY_KEY, &sessions)
    }

    pub fn save(&self, sessions: &[Session]) {
        if let Err(e) = self.try_save(sessions) {
            warn!("failed to save session history: {e}");
        }
    }
}
