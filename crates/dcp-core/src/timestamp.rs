// crates/dcp-core/src/timestamp.rs
//
// Timestamp normalization to the fixed ISO-8601 form used by every document:
// `YYYY-MM-DDTHH:MM:SS.000000Z` in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::error::DcpError;

const NORMALIZED_SUFFIX: &str = ".000000Z";
const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000000Z";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
];

/// Normalize a timestamp to whole seconds with a `.000000Z` suffix.
///
/// Inputs already ending in `.000000Z` are returned unchanged. Anything else
/// is parsed as a free-form datetime (RFC 3339 with any offset, RFC 2822, or
/// a naive date/time taken as UTC) and reformatted; fractional seconds are
/// dropped.
pub fn normalize_timestamp(input: &str) -> Result<String, DcpError> {
    let trimmed = input.trim();
    if trimmed.ends_with(NORMALIZED_SUFFIX) {
        return Ok(trimmed.to_string());
    }

    parse_datetime(trimmed)
        .map(|dt| dt.format(OUTPUT_FORMAT).to_string())
        .ok_or_else(|| DcpError::Validation(format!("Unparseable timestamp: {:?}", input)))
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
