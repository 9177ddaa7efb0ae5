use std::path::PathBuf;

use serde_json::Value;

use crate::error::Result;
use crate::storage::{MemoryStore, SqliteStore};

/// Storage keys. The whole list for each entity type lives under one key.
pub mod keys {
    pub const CATEGORIES: &str = "categories";
    pub const SPACES: &str = "play_tab_spaces";
    pub const COLLECTIONS: &str = "collections";
    pub const SETTINGS: &str = "settings";
    pub const INITIALIZED: &str = "initialized";
    pub const LAST_SELECTED: &str = "last_selected";
}

/// Uniform get/set over a persisted mapping from string keys to JSON
/// documents. The only storage primitive the rest of the crate uses.
///
/// No transactions: operations spanning multiple keys sequence their
/// writes themselves and accept the non-atomicity.
pub trait KvStore: Send + Sync {
    /// Returns `None` when the key has never been written.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    fn set(&self, key: &str, value: Value) -> Result<()>;
}

/// Backend selection, decided by configuration at startup rather than by
/// runtime feature detection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Persistent backend in a SQLite file.
    Sqlite { path: PathBuf },
    /// Unprivileged in-process fallback. Data does not survive restart.
    Memory,
}

impl StorageConfig {
    pub fn open(&self) -> Result<Box<dyn KvStore>> {
        match self {
            StorageConfig::Sqlite { path } => Ok(Box::new(SqliteStore::open(path)?)),
            StorageConfig::Memory => Ok(Box::new(MemoryStore::new())),
        }
    }
}
