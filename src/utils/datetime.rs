//! Date and time utility functions
//!
//! Whole-day arithmetic used by the retention sweep and the display format
//! used for due dates in the task list (e.g. "Oct 18, 2026").

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

/// Display format for due dates, matching the list's "Oct 18, 2026" style
pub const DUE_DATE_FORMAT: &str = "%b %-d, %Y";

/// Number of whole days elapsed between `earlier` and `later`.
///
/// Partial days are truncated toward zero, so 6 days 23 hours is 6 and a
/// negative span (an `earlier` in the future) yields zero or a negative count.
pub fn whole_days_between(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    (later - earlier).num_days()
}

/// Format a due date for display in the local time zone
pub fn format_due_date(due: DateTime<Utc>) -> String {
    format_due_date_in(due, &Local)
}

/// Format a due date for display in `tz`
pub fn format_due_date_in<Tz: TimeZone>(due: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    due.with_timezone(tz).format(DUE_DATE_FORMAT).to_string()
}

/// Parse an RFC 3339 timestamp, treating empty strings as absent
///
/// # Returns
/// * `Ok(None)` for an empty or whitespace-only input
pub fn parse_optional_timestamp(value: &str) -> Result<Option<DateTime<Utc>>, chrono::ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(trimmed).map(|dt| Some(dt.with_timezone(&Utc)))
}
