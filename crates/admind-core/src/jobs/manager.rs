//! The job manager service.
//!
//! Single authority for job identity assignment, execution dispatch and
//! query. The manager owns the durable [`JobStore`], the [`CommandRegistry`]
//! and the [`AttachRegistry`], and holds the shared retention policy cell
//! the cleanup scheduler reads.
//!
//! ## Concurrency contract
//!
//! Exactly one worker task executes a given job, and that worker is the only
//! writer of the job's record after creation (startup recovery aside, which
//! runs before any worker exists). The terminal transition is persisted
//! *before* attachers are released, so a subsequent `attach` or `list` never
//! observes a state storage does not have. Attach calls may block their
//! caller until the terminal event or an explicit timeout; the timeout
//! cancels only the waiting, never the job.

use crate::commands::{CommandContext, CommandRegistry, RunnableCommand};
use crate::error::{JobError, Result};
use crate::jobs::attach::{AttachRegistry, ChannelSink, JobEvent, Subscription};
use crate::jobs::job_store::JobStore;
use crate::progress::{NullSink, ProgressReporter, ProgressSink};
use admind_commons::{
    Job, JobId, JobListFilter, JobOutcome, JobState, JobSummary, OwnerId, ProgressMessage,
    RetentionPolicy,
};
use admind_store::StorageBackend;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Highest id the allocator hands out before wrapping back to 1.
const MAX_JOB_ID: u32 = 65535;

/// Options for one attach call.
#[derive(Debug, Clone, Default)]
pub struct AttachOptions {
    /// Bound the wait; `None` blocks until the terminal event.
    pub timeout: Option<Duration>,
    /// Suppress all progress output to this caller. Pure output
    /// suppression: replay and streaming are skipped, the result is not.
    pub terse: bool,
}

impl AttachOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }
}

pub struct JobManagerService {
    store: JobStore,
    registry: Arc<CommandRegistry>,
    attach: Arc<AttachRegistry>,
    retention: RwLock<RetentionPolicy>,
    last_id: AtomicU32,
}

impl JobManagerService {
    pub fn new(backend: Arc<dyn StorageBackend>, registry: Arc<CommandRegistry>) -> Self {
        Self {
            store: JobStore::new(backend),
            registry,
            attach: Arc::new(AttachRegistry::new()),
            retention: RwLock::new(RetentionPolicy::default()),
            last_id: AtomicU32::new(0),
        }
    }

    /// Run a command synchronously on the calling task, streaming progress
    /// straight to the caller's sink. No job record is created.
    pub async fn run_sync(
        &self,
        name: &str,
        args: Vec<String>,
        sink: Arc<dyn ProgressSink>,
        terse: bool,
    ) -> Result<JobOutcome> {
        let command = self.registry.resolve(name)?;
        let effective: Arc<dyn ProgressSink> = if terse { Arc::new(NullSink) } else { sink };
        let ctx = CommandContext::new(args, ProgressReporter::root(effective));
        match command.execute(&ctx).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => Err(JobError::Execution(e.to_string())),
        }
    }

    /// Start a command as a detached job and return its id immediately.
    ///
    /// The `Running` record is persisted before this returns; a persistence
    /// failure fails the start. The spawned worker fans progress out to the
    /// attach channel, and on completion persists the terminal transition
    /// before releasing attachers.
    pub fn start_detached(&self, name: &str, args: Vec<String>, owner: OwnerId) -> Result<JobId> {
        let command = self.registry.resolve(name)?;
        let id = self.allocate_id()?;

        let job = Job::new_running(id.clone(), owner, name, args);
        self.store.insert(&job)?;
        self.attach.open(&id);

        log::info!("[{}] Job started: command={}", id, name);
        spawn_worker(self.store.clone(), Arc::clone(&self.attach), command, job);
        Ok(id)
    }

    /// Attach to a job to observe its progress and final result.
    ///
    /// Running jobs replay the buffered history, then stream live until the
    /// terminal event or the timeout (a [`JobError::Timeout`], distinct from
    /// failure; the job keeps running and can be attached again). Terminal
    /// jobs replay once and return immediately; if the caller is the job's
    /// owner, the record is purged after that replay, so a second owner
    /// attach fails with [`JobError::NotFound`] — expected, not a bug.
    pub async fn attach(
        &self,
        id: &JobId,
        caller: &OwnerId,
        opts: AttachOptions,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<JobOutcome> {
        let job = self
            .store
            .get(id)?
            .ok_or_else(|| JobError::NotFound(id.clone()))?;

        if job.is_terminal() {
            return self.replay_terminal(job, caller, &opts, sink.as_ref());
        }

        match self.attach.subscribe(id) {
            Some(Subscription::Live { history, events }) => {
                replay(&history, &opts, sink.as_ref());
                self.stream_live(id, events, &opts, sink.as_ref()).await
            }
            Some(Subscription::Finished { history, outcome }) => {
                replay(&history, &opts, sink.as_ref());
                Ok(outcome)
            }
            None => {
                // Finished between the record lookup and the subscribe; the
                // terminal transition was persisted before the channel was
                // retired, so the store has it now.
                let job = self
                    .store
                    .get(id)?
                    .ok_or_else(|| JobError::NotFound(id.clone()))?;
                if job.is_terminal() {
                    self.replay_terminal(job, caller, &opts, sink.as_ref())
                } else {
                    Err(JobError::Execution(format!(
                        "job {} finished but its result was not recorded",
                        id
                    )))
                }
            }
        }
    }

    async fn stream_live(
        &self,
        id: &JobId,
        mut events: tokio::sync::broadcast::Receiver<JobEvent>,
        opts: &AttachOptions,
        sink: &dyn ProgressSink,
    ) -> Result<JobOutcome> {
        let wait = async {
            loop {
                match events.recv().await {
                    Ok(JobEvent::Progress(message)) => {
                        if !opts.terse {
                            sink.report(message);
                        }
                    }
                    Ok(JobEvent::Finished(outcome)) => return Ok(outcome),
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!(
                            "[{}] Attacher lagged; skipped {} progress events",
                            id,
                            skipped
                        );
                    }
                    Err(RecvError::Closed) => {
                        // Channel dropped without a terminal event; fall back
                        // to the persisted record.
                        let job = self
                            .store
                            .get(id)?
                            .ok_or_else(|| JobError::NotFound(id.clone()))?;
                        return job.outcome().ok_or_else(|| {
                            JobError::Execution(format!(
                                "job {} finished but its result was not recorded",
                                id
                            ))
                        });
                    }
                }
            }
        };

        match opts.timeout {
            None => wait.await,
            Some(limit) => match tokio::time::timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => Err(JobError::Timeout {
                    id: id.clone(),
                    elapsed: limit,
                }),
            },
        }
    }

    fn replay_terminal(
        &self,
        job: Job,
        caller: &OwnerId,
        opts: &AttachOptions,
        sink: &dyn ProgressSink,
    ) -> Result<JobOutcome> {
        replay(&job.output, opts, sink);
        let outcome = job.outcome().expect("terminal job has an outcome");

        if caller == &job.owner {
            // The owner has retrieved their result; the record is no longer
            // needed, independent of the retention scheduler.
            self.store.remove(&job.job_id)?;
            log::debug!("[{}] Purged after owner attach", job.job_id);
        }
        Ok(outcome)
    }

    /// All non-purged jobs, newest first. An empty store yields an empty
    /// list, not an error.
    pub fn list(&self, filter: &JobListFilter) -> Result<Vec<JobSummary>> {
        let mut jobs = self.store.load_all()?;
        if let Some(owner) = &filter.owner {
            jobs.retain(|job| &job.owner == owner);
        }
        jobs.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| numeric_id(&b.job_id).cmp(&numeric_id(&a.job_id)))
        });
        if let Some(limit) = filter.limit {
            jobs.truncate(limit);
        }
        Ok(jobs.iter().map(Job::summary).collect())
    }

    /// Atomically swap the retention policy. Applies from the scheduler's
    /// next tick; already-elapsed checks are not redone.
    pub fn configure_retention(&self, policy: RetentionPolicy) {
        log::info!(
            "Retention reconfigured: period={:?}, initial delay={:?}, poll interval={:?}",
            policy.job_retention_period,
            policy.cleanup_initial_delay,
            policy.cleanup_poll_interval
        );
        *self
            .retention
            .write()
            .unwrap_or_else(PoisonError::into_inner) = policy;
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        self.retention
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Purge terminal records older than the retention period. Returns the
    /// number purged.
    pub fn purge_expired(&self) -> Result<usize> {
        let retention = self.retention_policy().job_retention_period;
        let now = admind_commons::now_millis();
        let mut purged = 0;

        for job in self.store.load_all()? {
            if !job.is_terminal() {
                continue;
            }
            let Some(finished_at) = job.finished_at else {
                continue;
            };
            if now.saturating_sub(finished_at) >= retention.as_millis() as i64 {
                self.store.remove(&job.job_id)?;
                purged += 1;
                log::debug!("[{}] Purged by retention expiry", job.job_id);
            }
        }
        Ok(purged)
    }

    /// Startup reconciliation.
    ///
    /// A `Running` record found at startup was interrupted by a crash or
    /// restart of the previous process; it cannot be resumed safely, so it
    /// is marked `Failed` with an explanatory message and persisted. Also
    /// seeds the id allocator past every persisted id. Returns the number of
    /// records recovered.
    pub fn recover_interrupted(&self) -> Result<usize> {
        let jobs = self.store.load_all()?;

        let highest = jobs
            .iter()
            .filter_map(|job| job.job_id.as_u32())
            .max()
            .unwrap_or(0);
        self.last_id.store(highest, Ordering::SeqCst);

        let interrupted: Vec<Job> = jobs
            .into_iter()
            .filter(|job| job.state == JobState::Running)
            .collect();
        if interrupted.is_empty() {
            log::info!("No interrupted jobs to recover");
            return Ok(0);
        }

        log::warn!(
            "Recovering {} interrupted jobs from previous run",
            interrupted.len()
        );
        let mut recovered = 0;
        for job in interrupted {
            let id = job.job_id.clone();
            let output = job.output.clone();
            let failed = job.fail("interrupted by server restart", output);
            self.store.update(&failed)?;
            log::warn!("[{}] Marked failed (interrupted by server restart)", id);
            recovered += 1;
        }
        Ok(recovered)
    }

    /// Next unique job id: increment, wrap at [`MAX_JOB_ID`], skip any id
    /// still known to the registry or the store.
    fn allocate_id(&self) -> Result<JobId> {
        loop {
            let next = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
            if next > MAX_JOB_ID {
                self.last_id.store(0, Ordering::SeqCst);
                continue;
            }
            let id = JobId::new(next.to_string());
            if self.attach.is_open(&id) || self.store.contains(&id)? {
                continue;
            }
            return Ok(id);
        }
    }
}

fn numeric_id(id: &JobId) -> u32 {
    id.as_u32().unwrap_or(0)
}

fn replay(history: &[ProgressMessage], opts: &AttachOptions, sink: &dyn ProgressSink) {
    if opts.terse {
        return;
    }
    for message in history {
        sink.report(message.clone());
    }
}

/// Run one detached job to its terminal state.
///
/// The command future runs in its own task so that even a panicking command
/// is captured as a failed job rather than taking the manager down.
fn spawn_worker(
    store: JobStore,
    attach: Arc<AttachRegistry>,
    command: Arc<dyn RunnableCommand>,
    job: Job,
) {
    tokio::spawn(async move {
        let id = job.job_id.clone();

        let sink: Arc<dyn ProgressSink> =
            Arc::new(ChannelSink::new(Arc::clone(&attach), id.clone()));
        let args = job.command_args.clone();
        let execution = tokio::spawn(async move {
            let ctx = CommandContext::new(args, ProgressReporter::root(sink));
            command.execute(&ctx).await
        });

        let outcome = match execution.await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => JobOutcome::failure(e.to_string()),
            Err(join_error) => JobOutcome::failure(format!("command aborted: {}", join_error)),
        };

        let output = attach.history(&id);
        let record = if outcome.is_success() {
            job.complete(outcome.message.clone(), output)
        } else {
            job.fail(outcome.message.clone(), output)
        };

        // Persist the terminal transition before anyone blocked on the
        // channel is released.
        if let Err(e) = store.update(&record) {
            log::error!("[{}] Failed to persist terminal state: {}", id, e);
        }

        match record.state {
            JobState::Completed => log::info!("[{}] Job completed: {}", id, outcome.message),
            _ => log::error!("[{}] Job failed: {}", id, outcome.message),
        }

        attach.finish(&id, outcome);
    });
}
