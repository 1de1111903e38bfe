//! Typed identifiers.
//!
//! Plain string newtypes so job ids and owner identities cannot be mixed up
//! with each other or with arbitrary strings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique handle of one managed job.
///
/// Ids are allocated by the job manager as decimal integers (wrapping at an
/// upper bound, skipping ids still in use), but the type itself is opaque:
/// any non-empty string round-trips through storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value for counter-allocated ids; `None` for foreign ids.
    pub fn as_u32(&self) -> Option<u32> {
        self.0.parse().ok()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identity of the user/session that started a job.
///
/// Used to decide purge-on-attach: an owner who has retrieved their own
/// terminal job's result no longer needs the record retained.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OwnerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for OwnerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
