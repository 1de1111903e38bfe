//! Storage backend abstraction.
//!
//! A backend is a flat, thread-safe map from string keys to JSON values.
//! Values are `serde_json::Value` rather than raw bytes because the durable
//! representation is required to stay human-inspectable end to end.
//!
//! ## Durability contract
//!
//! `put` and `delete` are write-through: when they return `Ok`, the mutation
//! is durable (for backends that are durable at all). Callers rely on this to
//! guarantee that readers never observe state that is not yet flushed.

use serde_json::Value;
use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Storage error: {0}")]
    Other(String),
}

/// Trait for pluggable storage backend implementations.
///
/// Implementations must be thread-safe; concurrent readers and writers are
/// expected. Structural changes (insert/remove) must be serialized so that
/// `scan_all` enumerates a consistent snapshot.
pub trait StorageBackend: Send + Sync {
    /// Retrieves a value by key. `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Stores a key-value pair, replacing any existing value. Durable on return.
    fn put(&self, key: &str, value: &Value) -> Result<()>;

    /// Deletes a key. Idempotent: `Ok(())` even if the key does not exist.
    fn delete(&self, key: &str) -> Result<()>;

    /// Snapshot of all entries, sorted by key.
    fn scan_all(&self) -> Result<Vec<(String, Value)>>;
}
