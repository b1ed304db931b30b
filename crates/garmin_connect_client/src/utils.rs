//! Date parsing helpers for the timestamps Garmin Connect emits.

use chrono::{NaiveDate, NaiveDateTime};

/// Parse a local start timestamp into a naive datetime.
///
/// Accepts:
/// - `YYYY-MM-DD HH:MM:SS` (what the activity list returns)
/// - `YYYY-MM-DDTHH:MM:SS` with optional fractional seconds
/// - RFC3339 with an offset, which is reduced to its local wall time
/// - `YYYY-MM-DD`, taken as midnight
pub fn parse_local_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt);
        }
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Date portion of a local timestamp.
///
/// Falls back to the leading `YYYY-MM-DD` token when the time part is in a
/// shape [`parse_local_datetime`] does not know.
pub fn parse_local_date(s: &str) -> Option<NaiveDate> {
    if let Some(ndt) = parse_local_datetime(s) {
        return Some(ndt.date());
    }
    let head = s.trim().split(['T', ' ']).next()?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}
