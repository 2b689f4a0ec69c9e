//! Timestamp parsing and formatting for record `created_at` fields.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serializer;

const OFFSET_MINUTE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M%:z"];
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 `created_at` value.
///
/// A trailing `Z` is read as `+00:00`. Values without an offset are taken as
/// UTC. Returns `None` for anything unparsable; callers treat that the same
/// as a missing timestamp.
pub fn parse_created_at(raw: &str) -> Option<DateTime<FixedOffset>> {
    let normalized = match raw.strip_suffix('Z') {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(dt) = normalized.parse::<DateTime<FixedOffset>>() {
        return Some(dt);
    }

    for fmt in OFFSET_MINUTE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt);
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }

    let midnight = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).fixed_offset())
}

/// Format as ISO-8601 with an explicit numeric offset (`+00:00`, never `Z`).
pub fn format_timestamp<Tz: TimeZone>(dt: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    dt.to_rfc3339()
}

/// serde helper: `Option<DateTime>` as an ISO-8601 string or `null`.
pub fn serialize_opt<S, Tz>(value: &Option<DateTime<Tz>>, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match value {
        Some(dt) => ser.serialize_str(&format_timestamp(dt)),
        None => ser.serialize_none(),
    }
}
