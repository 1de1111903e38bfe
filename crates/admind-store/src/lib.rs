//! # admind-store
//!
//! Pluggable storage for admind system state.
//!
//! The job subsystem persists its records through the [`StorageBackend`]
//! trait so core logic does not care where the bytes live. Two backends are
//! provided:
//! - [`InMemoryBackend`] — volatile, for tests
//! - [`JsonFileBackend`] — one human-inspectable JSON file, rewritten
//!   atomically on every mutation (the durable store)

pub mod json_file;
pub mod memory;
pub mod storage_trait;

pub use json_file::JsonFileBackend;
pub use memory::InMemoryBackend;
pub use storage_trait::{Result, StorageBackend, StorageError};
