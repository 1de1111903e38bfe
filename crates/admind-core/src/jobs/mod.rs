//! The job subsystem: store, attach fan-out, manager and retention.

pub mod attach;
pub mod job_store;
pub mod manager;
pub mod retention;

pub use attach::{AttachRegistry, JobEvent, Subscription};
pub use job_store::JobStore;
pub use manager::{AttachOptions, JobManagerService};
pub use retention::RetentionScheduler;
