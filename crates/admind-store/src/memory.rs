//! In-memory storage backend for tests.

use crate::storage_trait::{Result, StorageBackend, StorageError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::RwLock;

/// Volatile backend backed by a `BTreeMap`. Nothing survives drop; intended
/// for unit and integration tests that do not exercise durability.
#[derive(Default)]
pub struct InMemoryBackend {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageBackend for InMemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &Value) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<(String, Value)>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}
