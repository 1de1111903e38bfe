//! Shared helpers for the job subsystem integration tests.
#![allow(dead_code)]

use admind_core::commands::{register_samples, CommandRegistry};
use admind_core::progress::{CollectingSink, ProgressSink};
use admind_core::{AttachOptions, JobManagerService};
use admind_commons::{JobId, JobOutcome, OwnerId};
use admind_store::{InMemoryBackend, JsonFileBackend, StorageBackend};
use std::path::Path;
use std::sync::Arc;

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}

pub fn sample_registry() -> Arc<CommandRegistry> {
    let mut registry = CommandRegistry::new();
    register_samples(&mut registry);
    Arc::new(registry)
}

pub fn memory_manager() -> Arc<JobManagerService> {
    Arc::new(JobManagerService::new(
        Arc::new(InMemoryBackend::new()),
        sample_registry(),
    ))
}

pub fn file_manager(jobs_file: &Path) -> Arc<JobManagerService> {
    let backend: Arc<dyn StorageBackend> =
        Arc::new(JsonFileBackend::open(jobs_file).expect("open job store file"));
    Arc::new(JobManagerService::new(backend, sample_registry()))
}

pub fn owner(name: &str) -> OwnerId {
    OwnerId::new(name)
}

/// Attach as an uninvolved observer and block until the job finishes.
/// Observers are never the owner, so this does not purge the record.
pub async fn await_completion(manager: &JobManagerService, id: &JobId) -> JobOutcome {
    let sink = Arc::new(CollectingSink::new()) as Arc<dyn ProgressSink>;
    manager
        .attach(id, &owner("observer"), AttachOptions::default(), sink)
        .await
        .expect("observer attach")
}
