//! Progress events emitted by running commands.
//!
//! A command reports progress against a *scope path*: the root command owns
//! the empty scope, and any supplemental sub-command it invokes reports under
//! a dotted child scope (e.g. `"backup.archive"`). Sibling scopes are
//! independent counters; the tree has no fixed depth.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hierarchical scope path of a progress event. Root is the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressScope(String);

impl ProgressScope {
    /// The root scope (the top-level command itself).
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Child scope one level below this one.
    pub fn child(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}.{}", self.0, name))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgressScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One progress event.
///
/// `value` is a 0–100 percentage of completion for its scope when
/// `percentage` is true; otherwise it is a raw step counter used by commands
/// that do not know their total step count up front (only the conventional
/// start `0` and end `100` sentinels are flagged as percentages for those).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressMessage {
    pub scope: ProgressScope,
    pub value: u32,
    pub percentage: bool,
    pub message: Option<String>,
}

impl ProgressMessage {
    pub fn percentage(scope: ProgressScope, value: u32, message: Option<String>) -> Self {
        Self {
            scope,
            value,
            percentage: true,
            message,
        }
    }

    pub fn counter(scope: ProgressScope, value: u32, message: Option<String>) -> Self {
        Self {
            scope,
            value,
            percentage: false,
            message,
        }
    }
}
