//! Job entity for the managed job store.
//!
//! Represents one invocation of a long-running administrative command tracked
//! by the job manager.
//!
//! ## Fields
//! - `job_id`: unique handle, assigned at creation, never reused while retained
//! - `owner`: identity of the user/session that started the job
//! - `command_name` / `command_args`: the operation, opaque to the manager
//! - `state`: `Running`, `Completed` or `Failed` (the latter two are terminal)
//! - `exit_code` / `message`: set only on the terminal transition
//! - `output`: buffered progress history, frozen at the terminal transition so
//!   a late or second attacher sees the full history
//! - `created_at` / `finished_at`: Unix timestamps in milliseconds
//!
//! ## Invariant
//! `finished_at` is set if and only if `state` is terminal. The consuming
//! transition builders (`complete`, `fail`) are the only way to reach a
//! terminal state, which keeps the invariant by construction.

use crate::ids::{JobId, OwnerId};
use crate::models::progress::ProgressMessage;
use crate::now_millis;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a job.
///
/// `Running -> Completed | Failed`; both are terminal. Record removal
/// ("purged") is external: the record simply disappears from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Running => write!(f, "RUNNING"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

/// Final success/failure flag of a terminal job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitCode {
    Success,
    Failure,
}

/// The tagged result a command produces and an attacher receives.
///
/// Used both as the command's return value and as the terminal payload
/// released to attachers, so failure crosses the worker boundary as data
/// rather than as an unwinding error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub exit_code: ExitCode,
    pub message: String,
}

impl JobOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::Success,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::Failure,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == ExitCode::Success
    }
}

/// Durable record of one managed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub job_id: JobId,
    pub owner: OwnerId,
    pub command_name: String,
    pub command_args: Vec<String>,
    pub state: JobState,
    pub exit_code: Option<ExitCode>,
    pub message: Option<String>,
    pub output: Vec<ProgressMessage>,
    pub created_at: i64,
    pub finished_at: Option<i64>,
}

impl Job {
    /// Create a new record in `Running` state.
    pub fn new_running(
        job_id: JobId,
        owner: OwnerId,
        command_name: impl Into<String>,
        command_args: Vec<String>,
    ) -> Self {
        Self {
            job_id,
            owner,
            command_name: command_name.into(),
            command_args,
            state: JobState::Running,
            exit_code: None,
            message: None,
            output: Vec::new(),
            created_at: now_millis(),
            finished_at: None,
        }
    }

    /// Terminal transition: the command finished successfully.
    pub fn complete(mut self, message: impl Into<String>, output: Vec<ProgressMessage>) -> Self {
        self.state = JobState::Completed;
        self.exit_code = Some(ExitCode::Success);
        self.message = Some(message.into());
        self.output = output;
        self.finished_at = Some(now_millis());
        self
    }

    /// Terminal transition: the command failed or was interrupted.
    pub fn fail(mut self, message: impl Into<String>, output: Vec<ProgressMessage>) -> Self {
        self.state = JobState::Failed;
        self.exit_code = Some(ExitCode::Failure);
        self.message = Some(message.into());
        self.output = output;
        self.finished_at = Some(now_millis());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Terminal payload, `None` while the job is still running.
    pub fn outcome(&self) -> Option<JobOutcome> {
        if !self.is_terminal() {
            return None;
        }
        let exit_code = self.exit_code.unwrap_or(match self.state {
            JobState::Completed => ExitCode::Success,
            _ => ExitCode::Failure,
        });
        Some(JobOutcome {
            exit_code,
            message: self.message.clone().unwrap_or_default(),
        })
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            job_id: self.job_id.clone(),
            owner: self.owner.clone(),
            command_name: self.command_name.clone(),
            state: self.state,
            exit_code: self.exit_code,
            message: self.message.clone(),
            created_at: self.created_at,
            finished_at: self.finished_at,
        }
    }
}

/// Listing view of a job: everything except the buffered output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub job_id: JobId,
    pub owner: OwnerId,
    pub command_name: String,
    pub state: JobState,
    pub exit_code: Option<ExitCode>,
    pub message: Option<String>,
    pub created_at: i64,
    pub finished_at: Option<i64>,
}

/// Filter criteria for job listings.
#[derive(Debug, Clone, Default)]
pub struct JobListFilter {
    /// Only jobs started by this owner.
    pub owner: Option<OwnerId>,
    /// Most recent N jobs (applied after the newest-first sort).
    pub limit: Option<usize>,
}

impl JobListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_owner(mut self, owner: OwnerId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
