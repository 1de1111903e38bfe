//! Runnable command boundary.
//!
//! The job manager is agnostic to what its commands do: anything implementing
//! [`RunnableCommand`] can be managed. Commands are looked up by name in a
//! [`CommandRegistry`] that is populated once at startup.

pub mod registry;
pub mod runnable;
pub mod samples;

pub use registry::CommandRegistry;
pub use runnable::{CommandContext, RunnableCommand};
pub use samples::register_samples;
