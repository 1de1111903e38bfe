//! # admind-core
//!
//! The managed job subsystem of admind. Long-running administrative commands
//! run out-of-band from the invoking client as *jobs*: started detached,
//! observed live by any number of attached clients, persisted across server
//! restarts, and purged by a retention scheduler.
//!
//! ## Architecture
//!
//! ```text
//! JobManagerService
//! ├── CommandRegistry     (name -> RunnableCommand, resolved at startup)
//! ├── JobStore            (durable records over a StorageBackend)
//! ├── AttachRegistry      (per-job broadcast of live progress)
//! └── RetentionScheduler  (background purge of expired terminal records)
//! ```
//!
//! ## Job lifecycle
//!
//! ```text
//! RUNNING ──► COMPLETED ─┐
//!    │                   ├──► purged (owner attach, or retention expiry)
//!    └─────► FAILED ─────┘
//! ```
//!
//! A detached start persists the `RUNNING` record before returning the job
//! id. The worker executes the command, fanning progress out to attachers
//! and into the record's buffered history. The terminal transition is
//! persisted before any blocked attacher is released, so `list` and `attach`
//! never observe state that storage does not yet have.

pub mod commands;
pub mod error;
pub mod jobs;
pub mod progress;

pub use error::{JobError, Result};
pub use jobs::attach::{AttachRegistry, JobEvent, Subscription};
pub use jobs::manager::{AttachOptions, JobManagerService};
pub use jobs::retention::RetentionScheduler;
