//! Retention policy for terminal job records.

use crate::duration::serde_str;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long terminal job records are kept and how often the cleanup
/// scheduler sweeps them.
///
/// Reconfigurable at runtime; the scheduler re-reads the policy on every
/// tick, so changes take effect for the next tick without a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    /// Minimum age (since `finished_at`) before a terminal record may be purged.
    #[serde(with = "serde_str")]
    pub job_retention_period: Duration,

    /// Delay before the scheduler's first sweep after (re)start.
    #[serde(with = "serde_str")]
    pub cleanup_initial_delay: Duration,

    /// Interval between sweeps.
    #[serde(with = "serde_str")]
    pub cleanup_poll_interval: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            job_retention_period: Duration::from_secs(24 * 60 * 60),
            cleanup_initial_delay: Duration::from_secs(20 * 60),
            cleanup_poll_interval: Duration::from_secs(20 * 60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.job_retention_period, Duration::from_secs(86400));
        assert_eq!(policy.cleanup_initial_delay, Duration::from_secs(1200));
        assert_eq!(policy.cleanup_poll_interval, Duration::from_secs(1200));
    }

    #[test]
    fn test_serde_as_strings() {
        let policy = RetentionPolicy::default();
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"24h\""));
        assert!(json.contains("\"20m\""));

        let back: RetentionPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
