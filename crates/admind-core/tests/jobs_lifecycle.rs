//! Job lifecycle tests.
//!
//! Covers the visible state machine: running jobs show up in listings,
//! terminal jobs keep their state until purged, owners consume their own
//! results, and records survive a stop/start cycle of the service.

mod common;

use admind_commons::{ExitCode, Job, JobId, JobListFilter, JobState, OwnerId};
use admind_core::jobs::JobStore;
use admind_core::progress::{CollectingSink, ProgressSink};
use admind_core::{AttachOptions, JobError, JobManagerService};
use admind_store::{InMemoryBackend, JsonFileBackend, StorageBackend, StorageError};
use common::{await_completion, file_manager, init_logging, memory_manager, owner, sample_registry};
use serde_json::Value;
use std::sync::Arc;

fn collecting_sink() -> Arc<dyn ProgressSink> {
    Arc::new(CollectingSink::new())
}

#[tokio::test]
async fn test_detached_job_runs_to_completed() {
    init_logging();
    let manager = memory_manager();

    let id = manager
        .start_detached(
            "sample-steps",
            vec!["steps=10".into(), "step_delay_ms=30".into()],
            owner("alice"),
        )
        .unwrap();

    // Visible as RUNNING immediately after start
    let listed = manager.list(&JobListFilter::all()).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].job_id, id);
    assert_eq!(listed[0].state, JobState::Running);
    assert!(listed[0].finished_at.is_none());

    let outcome = await_completion(&manager, &id).await;
    assert!(outcome.is_success());

    // Terminal state remains visible until purged
    let listed = manager.list(&JobListFilter::all()).unwrap();
    assert_eq!(listed[0].state, JobState::Completed);
    assert_eq!(listed[0].exit_code, Some(ExitCode::Success));
    assert!(listed[0].finished_at.is_some());
}

#[tokio::test]
async fn test_failed_job_keeps_message() {
    init_logging();
    let manager = memory_manager();

    let id = manager
        .start_detached(
            "sample-fail",
            vec!["message=backup volume unreachable".into()],
            owner("alice"),
        )
        .unwrap();

    let outcome = await_completion(&manager, &id).await;
    assert!(!outcome.is_success());
    assert_eq!(outcome.message, "backup volume unreachable");

    let listed = manager.list(&JobListFilter::all()).unwrap();
    assert_eq!(listed[0].state, JobState::Failed);
    assert_eq!(listed[0].exit_code, Some(ExitCode::Failure));
    assert_eq!(
        listed[0].message.as_deref(),
        Some("backup volume unreachable")
    );
}

#[tokio::test]
async fn test_owner_attach_purges_second_attach_not_found() {
    init_logging();
    let manager = memory_manager();
    let alice = owner("alice");

    let id = manager
        .start_detached("sample-steps", vec!["steps=3".into()], alice.clone())
        .unwrap();
    await_completion(&manager, &id).await;

    // Observer attaches do not purge
    assert_eq!(manager.list(&JobListFilter::all()).unwrap().len(), 1);

    // The owner retrieves the result; the record is purged afterwards
    let outcome = manager
        .attach(&id, &alice, AttachOptions::default(), collecting_sink())
        .await
        .unwrap();
    assert!(outcome.is_success());

    let second = manager
        .attach(&id, &alice, AttachOptions::default(), collecting_sink())
        .await;
    assert!(matches!(second, Err(JobError::NotFound(_))));
    assert!(manager.list(&JobListFilter::all()).unwrap().is_empty());
}

#[tokio::test]
async fn test_nonowner_attach_replays_without_purging() {
    init_logging();
    let manager = memory_manager();
    let alice = owner("alice");

    let id = manager
        .start_detached("sample-steps", vec!["steps=10".into()], alice.clone())
        .unwrap();
    await_completion(&manager, &id).await;

    let sink = Arc::new(CollectingSink::new());
    let outcome = manager
        .attach(
            &id,
            &owner("bob"),
            AttachOptions::default(),
            Arc::clone(&sink) as Arc<dyn ProgressSink>,
        )
        .await
        .unwrap();
    assert!(outcome.is_success());

    // Full buffered history replayed to the late attacher
    let values: Vec<u32> = sink.events().iter().map(|e| e.value).collect();
    assert_eq!(values, vec![0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);

    // Record still present for the owner
    assert_eq!(manager.list(&JobListFilter::all()).unwrap().len(), 1);
}

#[tokio::test]
async fn test_attach_unknown_and_purged_ids_not_found() {
    init_logging();
    let manager = memory_manager();

    let result = manager
        .attach(
            &JobId::new("4711"),
            &owner("alice"),
            AttachOptions::default(),
            collecting_sink(),
        )
        .await;
    assert!(matches!(result, Err(JobError::NotFound(_))));

    // Nothing to list is an empty result, not an error
    assert!(manager.list(&JobListFilter::all()).unwrap().is_empty());
}

#[tokio::test]
async fn test_list_owner_filter() {
    init_logging();
    let manager = memory_manager();

    let a = manager
        .start_detached("sample-steps", vec!["steps=1".into()], owner("alice"))
        .unwrap();
    let b = manager
        .start_detached("sample-steps", vec!["steps=1".into()], owner("bob"))
        .unwrap();
    await_completion(&manager, &a).await;
    await_completion(&manager, &b).await;

    let alice_jobs = manager
        .list(&JobListFilter::all().with_owner(owner("alice")))
        .unwrap();
    assert_eq!(alice_jobs.len(), 1);
    assert_eq!(alice_jobs[0].job_id, a);
}

#[tokio::test]
async fn test_job_survives_restart() {
    init_logging();
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let jobs_file = temp_dir.path().join("jobs.json");

    let id;
    // Phase 1: run a job to completion, then stop the service
    {
        let manager = file_manager(&jobs_file);
        id = manager
            .start_detached("sample-steps", vec!["steps=5".into()], owner("alice"))
            .unwrap();
        let outcome = await_completion(&manager, &id).await;
        assert!(outcome.is_success());
        // Manager dropped here (simulates shutdown)
    }

    // Phase 2: restart with the same data directory and verify the record
    {
        let manager = file_manager(&jobs_file);
        manager.recover_interrupted().unwrap();

        let listed = manager.list(&JobListFilter::all()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].job_id, id);
        assert_eq!(listed[0].state, JobState::Completed);
        assert_eq!(listed[0].exit_code, Some(ExitCode::Success));

        // The buffered output survived too: a late attacher replays it
        let sink = Arc::new(CollectingSink::new());
        manager
            .attach(
                &id,
                &owner("bob"),
                AttachOptions::default(),
                Arc::clone(&sink) as Arc<dyn ProgressSink>,
            )
            .await
            .unwrap();
        assert_eq!(sink.events().len(), 6);
    }
}

#[tokio::test]
async fn test_interrupted_running_record_fails_on_recovery() {
    init_logging();
    let temp_dir = tempfile::TempDir::new().unwrap();
    let jobs_file = temp_dir.path().join("jobs.json");

    // A prior process crashed mid-job: its record is still RUNNING on disk.
    {
        let backend: Arc<dyn StorageBackend> = Arc::new(JsonFileBackend::open(&jobs_file).unwrap());
        let store = JobStore::new(backend);
        let orphan = Job::new_running(
            JobId::new("9"),
            OwnerId::new("alice"),
            "sample-steps",
            vec!["steps=100".into()],
        );
        store.insert(&orphan).unwrap();
    }

    let manager = file_manager(&jobs_file);
    let recovered = manager.recover_interrupted().unwrap();
    assert_eq!(recovered, 1);

    let listed = manager.list(&JobListFilter::all()).unwrap();
    assert_eq!(listed[0].state, JobState::Failed);
    assert_eq!(
        listed[0].message.as_deref(),
        Some("interrupted by server restart")
    );
    assert!(listed[0].finished_at.is_some());

    // Recovery seeded the allocator past the orphan's id
    let next = manager
        .start_detached("sample-steps", vec!["steps=1".into()], owner("alice"))
        .unwrap();
    assert_eq!(next.as_u32(), Some(10));
}

#[tokio::test]
async fn test_sync_run_creates_no_record() {
    init_logging();
    let manager = memory_manager();

    let outcome = manager
        .run_sync(
            "sample-steps",
            vec!["steps=2".into()],
            collecting_sink(),
            false,
        )
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(manager.list(&JobListFilter::all()).unwrap().is_empty());
}

/// Backend that accepts reads but refuses every write.
struct ReadOnlyBackend {
    inner: InMemoryBackend,
}

impl StorageBackend for ReadOnlyBackend {
    fn get(&self, key: &str) -> admind_store::Result<Option<Value>> {
        self.inner.get(key)
    }

    fn put(&self, _key: &str, _value: &Value) -> admind_store::Result<()> {
        Err(StorageError::Io("store is read-only".into()))
    }

    fn delete(&self, _key: &str) -> admind_store::Result<()> {
        Err(StorageError::Io("store is read-only".into()))
    }

    fn scan_all(&self) -> admind_store::Result<Vec<(String, Value)>> {
        self.inner.scan_all()
    }
}

#[tokio::test]
async fn test_persistence_failure_fails_the_start() {
    init_logging();
    let backend = Arc::new(ReadOnlyBackend {
        inner: InMemoryBackend::new(),
    });
    let manager = JobManagerService::new(backend, sample_registry());

    let result = manager.start_detached("sample-steps", vec!["steps=1".into()], owner("alice"));
    assert!(matches!(result, Err(JobError::Persistence(_))));
}
