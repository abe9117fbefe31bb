use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{get_home_dir, CONFIG_DIR};

pub const BINDINGS_FILE: &str = "bindings.toml";

// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access binding store: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize binding store: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to parse binding store: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Key/value string store the remapper persists its columns in
pub trait BindingStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BindingStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a flat TOML table of strings.
///
/// Every `set` rewrites the whole file through a temporary sibling that is
/// renamed into place, so a failed write leaves the previous file intact.
#[derive(Debug, Clone)]
pub struct TomlFileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlFileStore {
    /// Opens the store at `path`; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            debug!("Loading bindings from {}", path.display());
            toml::from_str(&fs::read_to_string(&path)?)?
        } else {
            info!("No binding store at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, values })
    }

    /// Empty store at `path`, the file is not read. The next `set`
    /// overwrites whatever is there.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            values: BTreeMap::new(),
        }
    }

    /// Like `open`, but an unreadable or corrupt file yields an empty store
    pub fn open_or_empty(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match Self::open(&path) {
            Ok(store) => store,
            Err(e) => {
                warn!("Ignoring binding store {}: {}", path.display(), e);
                Self::empty(path)
            }
        }
    }

    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(BINDINGS_FILE);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(&self.values)?;
        let temp = self.path.with_extension("toml.tmp");
        fs::write(&temp, content)?;
        fs::rename(&temp, &self.path)?;
        debug!("Wrote {} entries to {}", self.values.len(), self.path.display());
        Ok(())
    }
}

impl BindingStore for TomlFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let previous = self.values.insert(key.to_string(), value);
        if let Err(e) = self.flush() {
            match previous {
                Some(previous) => self.values.insert(key.to_string(), previous),
                None => self.values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
