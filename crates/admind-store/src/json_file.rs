//! Durable JSON file backend.
//!
//! The whole keyspace lives in one pretty-printed JSON object mapping key to
//! value, so the persisted state can be read and edited with any text editor.
//! The file is loaded fully at open; every mutation rewrites it atomically
//! (temp file in the same directory, fsync, rename) before the call returns.
//! A crash mid-write leaves either the old or the new file, never a torn one.
//!
//! One backend instance owns its file; concurrent instances on the same path
//! are not coordinated.

use crate::storage_trait::{Result, StorageBackend, StorageError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JsonFileBackend {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl JsonFileBackend {
    /// Open the backend, loading any existing file. A missing file is an
    /// empty store; it is created on the first mutation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<BTreeMap<String, Value>>(&content)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(format!("{}: {}", path.display(), e))),
        };

        log::debug!(
            "Opened job store file {} ({} entries)",
            path.display(),
            entries.len()
        );

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rewrite the file from the in-memory map. Called with the entry lock
    /// held so writers serialize and the file always matches the map.
    fn flush(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let content = serde_json::to_vec_pretty(entries)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        let io_err = |e: std::io::Error| StorageError::Io(format!("{}: {}", self.path.display(), e));

        let mut tmp = fs::File::create(&tmp_path).map_err(io_err)?;
        tmp.write_all(&content).map_err(io_err)?;
        tmp.sync_all().map_err(io_err)?;
        fs::rename(&tmp_path, &self.path).map_err(io_err)?;
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>> {
        self.entries
            .lock()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))
    }
}

impl StorageBackend for JsonFileBackend {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &str, value: &Value) -> Result<()> {
        let mut entries = self.lock()?;
        let previous = entries.insert(key.to_string(), value.clone());
        if let Err(e) = self.flush(&entries) {
            // Keep memory consistent with the file we failed to write.
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.lock()?;
        let previous = entries.remove(key);
        if previous.is_none() {
            return Ok(());
        }
        if let Err(e) = self.flush(&entries) {
            if let Some(old) = previous {
                entries.insert(key.to_string(), old);
            }
            return Err(e);
        }
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<(String, Value)>> {
        Ok(self
            .lock()?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
