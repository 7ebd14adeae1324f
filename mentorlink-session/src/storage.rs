//! Durable device-local key/value storage
//!
//! The backing store is a flat string map. Multi-key writes and removals are
//! applied as one unit so readers never observe a half-written session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::{unpoison, SessionError, SessionResult};

/// Flat string-to-string store that survives restarts
pub trait KeyValueStore: Send + Sync {
    /// Read a single key
    fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Read several keys from one consistent snapshot
    fn get_many(&self, keys: &[&str]) -> SessionResult<Vec<Option<String>>>;

    /// Write `set` and remove `remove` as one unit: all of it lands or none
    fn apply(&self, set: &[(&str, &str)], remove: &[&str]) -> SessionResult<()>;

    fn set_many(&self, entries: &[(&str, &str)]) -> SessionResult<()> {
        self.apply(entries, &[])
    }

    fn remove_many(&self, keys: &[&str]) -> SessionResult<()> {
        self.apply(&[], keys)
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        self.remove_many(&[key])
    }
}

fn apply_changes(entries: &mut BTreeMap<String, String>, set: &[(&str, &str)], remove: &[&str]) {
    for (key, value) in set {
        entries.insert((*key).to_string(), (*value).to_string());
    }
    for key in remove {
        entries.remove(*key);
    }
}

/// In-memory store, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        unpoison(self.entries.lock()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(unpoison(self.entries.lock()).get(key).cloned())
    }

    fn get_many(&self, keys: &[&str]) -> SessionResult<Vec<Option<String>>> {
        let entries = unpoison(self.entries.lock());
        Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
    }

    fn apply(&self, set: &[(&str, &str)], remove: &[&str]) -> SessionResult<()> {
        apply_changes(&mut *unpoison(self.entries.lock()), set, remove);
        Ok(())
    }
}

/// JSON-file store kept in the client data directory.
///
/// Every mutation rewrites the whole file through a temporary sibling and a
/// rename, and the in-memory copy is only replaced once the file is on disk.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    pub const FILE_NAME: &'static str = "local_storage.json";

    /// Open (or create) the store inside `storage_dir`
    pub fn open<P: AsRef<Path>>(storage_dir: P) -> SessionResult<Self> {
        let storage_dir = storage_dir.as_ref();
        fs::create_dir_all(storage_dir).map_err(|e| {
            SessionError::storage_with_source(
                format!("Failed to create {}", storage_dir.display()),
                Box::new(e),
            )
        })?;

        let path = storage_dir.join(Self::FILE_NAME);
        let entries = if path.exists() {
            Self::load(&path)
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), keys = entries.len(), "Opened local storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A corrupt file is treated as empty; the next write replaces it
    fn load(path: &Path) -> BTreeMap<String, String> {
        let parsed = fs::read_to_string(path)
            .map_err(SessionError::from)
            .and_then(|content| {
                if content.trim().is_empty() {
                    Ok(BTreeMap::new())
                } else {
                    serde_json::from_str(&content).map_err(SessionError::from)
                }
            });

        match parsed {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable local storage");
                BTreeMap::new()
            }
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> SessionResult<()> {
        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, content).map_err(|e| {
            SessionError::storage_with_source(
                format!("Failed to write {}", tmp_path.display()),
                Box::new(e),
            )
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            // Holds the session token
            fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
        }

        fs::rename(&tmp_path, &self.path).map_err(|e| {
            SessionError::storage_with_source(
                format!("Failed to replace {}", self.path.display()),
                Box::new(e),
            )
        })
    }

    fn mutate<F>(&self, apply: F) -> SessionResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut guard = unpoison(self.entries.lock());
        let mut next = guard.clone();
        apply(&mut next);

        if next == *guard {
            return Ok(());
        }

        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        Ok(unpoison(self.entries.lock()).get(key).cloned())
    }

    fn get_many(&self, keys: &[&str]) -> SessionResult<Vec<Option<String>>> {
        let entries = unpoison(self.entries.lock());
        Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
    }

    fn apply(&self, set: &[(&str, &str)], remove: &[&str]) -> SessionResult<()> {
        self.mutate(|entries| apply_changes(entries, set, remove))
    }
}
