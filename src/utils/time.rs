//! Time and age formatting utilities

use chrono::{DateTime, Utc};

/// Age shown for resources without a usable creation timestamp
pub const UNKNOWN_AGE: &str = "Unknown";

/// Human-readable age of a resource created at `created`, as seen at `now`.
///
/// Uses the largest fitting unit, rounded: `42s`, `5m`, `3h`, `12d`.
pub fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created).num_milliseconds().max(0) as f64 / 1000.0;

    if secs < 60.0 {
        format!("{:.0}s", secs)
    } else if secs < 3600.0 {
        format!("{:.0}m", secs / 60.0)
    } else if secs < 86400.0 {
        format!("{:.0}h", secs / 3600.0)
    } else {
        format!("{:.0}d", secs / 86400.0)
    }
}

/// Age from an RFC 3339 creation timestamp, or [`UNKNOWN_AGE`] when the
/// timestamp is empty or malformed.
pub fn age_from_rfc3339(creation_time: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(creation_time) {
        Ok(created) => format_age(created.with_timezone(&Utc), now),
        Err(_) => UNKNOWN_AGE.to_string(),
    }
}
