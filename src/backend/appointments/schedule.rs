/**
 * Appointment Time Windows
 *
 * Timestamps arrive as RFC 3339 strings. Values without an offset are
 * taken as UTC, and a bare date means midnight UTC.
 *
 * A window is valid when the end is strictly after the start and the
 * length is between 15 and 480 minutes, both bounds included. New
 * appointments must also not start in the past.
 */

use crate::shared::SharedError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const MIN_DURATION_MINUTES: i64 = 15;
pub const MAX_DURATION_MINUTES: i64 = 8 * 60;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a client-supplied timestamp
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, SharedError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    Err(SharedError::validation(field, format!("'{}' is not an ISO 8601 timestamp", raw)))
}

/// Check ordering and length; returns the duration in minutes
pub fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, SharedError> {
    if end <= start {
        return Err(SharedError::validation("end_datetime", "End time must be after start time"));
    }
    let minutes = (end - start).num_minutes();
    if !(MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        return Err(SharedError::validation(
            "end_datetime",
            format!(
                "Appointment must last between {} and {} minutes, got {}",
                MIN_DURATION_MINUTES, MAX_DURATION_MINUTES, minutes
            ),
        ));
    }
    Ok(minutes)
}

/// Reject a start time before `now`
pub fn ensure_not_past(start: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), SharedError> {
    if start < now {
        Err(SharedError::validation("start_datetime", "Cannot schedule appointments in the past"))
    } else {
        Ok(())
    }
}
