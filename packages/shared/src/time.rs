//! Time-related utilities for displaying activity.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};

/// Get the current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix timestamp (milliseconds) as `HH:MM:SS` in the given offset.
///
/// Returns `None` when the timestamp is out of chrono's representable range.
pub fn format_clock_time(timestamp_millis: i64, offset: &FixedOffset) -> Option<String> {
    let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_millis)?;
    Some(utc.with_timezone(offset).format("%H:%M:%S").to_string())
}

/// Format a Unix timestamp (milliseconds) as `HH:MM:SS` in the local time zone.
pub fn format_local_clock_time(timestamp_millis: i64) -> Option<String> {
    let local = Local.timestamp_millis_opt(timestamp_millis).single()?;
    Some(local.format("%H:%M:%S").to_string())
}
