//! Typed job record store over a storage backend.

use crate::error::{JobError, Result};
use admind_commons::{Job, JobId};
use admind_store::{StorageBackend, StorageError};
use std::sync::Arc;

/// Durable mapping from job id to [`Job`] record.
///
/// Every mutation is write-through: when `insert`/`update`/`remove` return
/// `Ok`, the backend has the state durably. Readers (`get`, `load_all`)
/// therefore never observe an in-memory state that storage does not have —
/// the property restart survival rests on. Persistence failures surface as
/// [`JobError::Persistence`], never silently.
#[derive(Clone)]
pub struct JobStore {
    backend: Arc<dyn StorageBackend>,
}

impl JobStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Persist a freshly created record.
    pub fn insert(&self, job: &Job) -> Result<()> {
        self.write(job)
    }

    /// Persist a state transition of an existing record.
    pub fn update(&self, job: &Job) -> Result<()> {
        self.write(job)
    }

    fn write(&self, job: &Job) -> Result<()> {
        let value = serde_json::to_value(job)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.backend.put(job.job_id.as_str(), &value)?;
        Ok(())
    }

    pub fn get(&self, id: &JobId) -> Result<Option<Job>> {
        match self.backend.get(id.as_str())? {
            None => Ok(None),
            Some(value) => {
                let job = serde_json::from_value(value)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(job))
            }
        }
    }

    pub fn contains(&self, id: &JobId) -> Result<bool> {
        Ok(self.backend.get(id.as_str())?.is_some())
    }

    /// Permanently remove a record (purge). Idempotent.
    pub fn remove(&self, id: &JobId) -> Result<()> {
        self.backend.delete(id.as_str())?;
        Ok(())
    }

    /// Snapshot of every persisted record.
    pub fn load_all(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        for (key, value) in self.backend.scan_all()? {
            let job: Job = serde_json::from_value(value).map_err(|e| {
                JobError::Persistence(StorageError::Serialization(format!(
                    "record {}: {}",
                    key, e
                )))
            })?;
            jobs.push(job);
        }
        Ok(jobs)
    }
}
