//! Admin duration strings.
//!
//! Durations in configuration and in `configure-managed-jobs` style
//! operations are written as `<number><unit>` where the unit is one of
//! `s` (seconds), `m` (minutes), `h` (hours) or `d` (days), e.g. `"90s"`,
//! `"20m"`, `"24h"`, `"7d"`. Units are case-insensitive.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("Empty duration string")]
    Empty,

    #[error("Invalid duration number: {0}")]
    InvalidNumber(String),

    #[error("Invalid duration unit '{0}' (expected s, m, h or d)")]
    InvalidUnit(char),
}

/// Parse a `<number><unit>` admin duration.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let unit = input.chars().last().unwrap();
    let number = &input[..input.len() - unit.len_utf8()];
    let value: u64 = number
        .parse()
        .map_err(|_| DurationParseError::InvalidNumber(number.to_string()))?;

    let secs = match unit.to_ascii_lowercase() {
        's' => value,
        'm' => value * 60,
        'h' => value * 60 * 60,
        'd' => value * 60 * 60 * 24,
        other => return Err(DurationParseError::InvalidUnit(other)),
    };
    Ok(Duration::from_secs(secs))
}

/// Render a duration back to its shortest exact admin form.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    const DAY: u64 = 24 * 60 * 60;
    const HOUR: u64 = 60 * 60;
    const MINUTE: u64 = 60;

    if secs > 0 && secs % DAY == 0 {
        format!("{}d", secs / DAY)
    } else if secs > 0 && secs % HOUR == 0 {
        format!("{}h", secs / HOUR)
    } else if secs > 0 && secs % MINUTE == 0 {
        format!("{}m", secs / MINUTE)
    } else {
        format!("{}s", secs)
    }
}

/// Serde adapter storing a `Duration` as an admin duration string.
pub mod serde_str {
    use super::{format_duration, parse_duration};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
