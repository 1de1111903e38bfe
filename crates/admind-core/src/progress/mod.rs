//! Progress reporting, accumulation and the line codec.
//!
//! A running command reports through a [`ProgressReporter`], which normalizes
//! raw step counts into [`ProgressMessage`] events and pushes them into a
//! [`ProgressSink`]. The sink boundary is where the subsystem fans events out
//! (to attachers, buffers, or a client's output).

pub mod reporter;
pub mod tree;
pub mod wire;

pub use reporter::{CollectingSink, NullSink, ProgressReporter, ProgressSink};
pub use tree::ProgressTree;
