//! # admind-commons
//!
//! Shared leaf types for the admind managed job system:
//! - Typed identifiers ([`JobId`], [`OwnerId`])
//! - The durable job record ([`Job`]) and its state machine
//! - Progress events ([`ProgressMessage`], [`ProgressScope`])
//! - Admin duration strings (`"90s"`, `"20m"`, `"24h"`, `"7d"`)
//! - The retention policy knobs ([`RetentionPolicy`])
//!
//! This crate has no async or storage dependencies; everything here is plain
//! data shared between the store, the core subsystem and the server binary.

pub mod duration;
pub mod ids;
pub mod models;
pub mod retention;

pub use ids::{JobId, OwnerId};
pub use models::job::{ExitCode, Job, JobListFilter, JobOutcome, JobState, JobSummary};
pub use models::progress::{ProgressMessage, ProgressScope};
pub use retention::RetentionPolicy;

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
