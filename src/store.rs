//! Persisted one-spin gate.
//!
//! The gate lives behind a tiny string key-value store so the engine never
//! touches ambient state. [`FileStore`] keeps the values in a TOML table on
//! disk; [`MemoryStore`] is for tests and throwaway sessions.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Result, WheelError};

pub const DEFAULT_LOCK_KEY: &str = "spin_demo_locked_v1";

const LOCKED: &str = "1";
const UNLOCKED: &str = "0";

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// String table persisted as TOML. Every `set` rewrites the file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.local/share/prize-wheel/state.toml` on Linux, the platform data
    /// dir elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("prize-wheel").join("state.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_table(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(WheelError::Store {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&content).map_err(|e| WheelError::StoreFormat {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn write_table(&self, table: &BTreeMap<String, String>) -> Result<()> {
        let io_err = |source| WheelError::Store {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string(table).map_err(|e| WheelError::StoreFormat {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, content).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_table()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut table = self.read_table()?;
        table.insert(key.to_string(), value.to_string());
        self.write_table(&table)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// One-shot gate over a single store key, stored as `"1"` / `"0"`.
///
/// Store failures never surface: reads fall back to unlocked and writes are
/// dropped, both with a warning. The wheel stays usable, the one-spin rule
/// just isn't enforced.
#[derive(Debug)]
pub struct LockGate<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> LockGate<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// First-run setup: an absent key is written as unlocked. An existing
    /// value is left alone so the gate survives restarts.
    pub fn init(&mut self) {
        match self.store.get(&self.key) {
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!(key = %self.key, "lock key absent, initialising unlocked");
                self.write(UNLOCKED);
            }
            Err(e) => warn!("spin gate unavailable, one-spin rule not enforced: {}", e),
        }
    }

    pub fn is_locked(&self) -> bool {
        match self.store.get(&self.key) {
            Ok(value) => value.as_deref() == Some(LOCKED),
            Err(e) => {
                warn!("could not read spin gate, treating as unlocked: {}", e);
                false
            }
        }
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.write(if locked { LOCKED } else { UNLOCKED });
    }

    /// Clear the lock regardless of how the last spin ended.
    pub fn reset(&mut self) {
        debug!(key = %self.key, "lock reset");
        self.write(UNLOCKED);
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn write(&mut self, value: &str) {
        if let Err(e) = self.store.set(&self.key, value) {
            warn!("could not persist spin gate: {}", e);
        }
    }
}
