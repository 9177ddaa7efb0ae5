use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

use crate::error::Result;
use crate::storage::KvStore;

/// In-process key-value store. Fallback backend for environments without
/// persistent storage, and the default test double.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self.entries.read().expect("kv store lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write().expect("kv store lock poisoned");
        entries.insert(key.to_string(), value);
        Ok(())
    }
}
