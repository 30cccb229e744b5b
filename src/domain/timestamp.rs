//! Timestamp parsing and serde helpers.
//!
//! Readings arrive from two places: CSV files written by the simulator
//! (`2025-10-19T12:15:00+00:00`) and the hosted REST tables, which return
//! either RFC 3339 or naive ISO date-times depending on the column type.
//! Naive values are interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a timestamp in any of the accepted forms.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Postgres renders `timestamptz` with a space separator and a short offset.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!(
        "Invalid timestamp '{s}'. Expected RFC 3339 or YYYY-MM-DD[T ]HH:MM:SS."
    ))
}

/// Render a timestamp the way the simulator stores it.
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, false)
}

pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(dt))
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_common_forms() {
        let expected = Utc.with_ymd_and_hms(2025, 10, 19, 12, 15, 0).unwrap();
        for raw in [
            "2025-10-19T12:15:00+00:00",
            "2025-10-19T12:15:00Z",
            "2025-10-19T14:15:00+02:00",
            "2025-10-19T12:15:00",
            "2025-10-19 12:15:00",
            "2025-10-19T12:15:00.000",
            "2025-10-19 12:15:00+00",
        ] {
            assert_eq!(parse_timestamp(raw).unwrap(), expected, "input {raw}");
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_err());
        assert!(parse_timestamp("").is_err());
    }

    #[test]
    fn format_round_trips() {
        let dt = Utc.with_ymd_and_hms(2024, 2, 29, 23, 45, 0).unwrap();
        let s = format_timestamp(&dt);
        assert_eq!(s, "2024-02-29T23:45:00+00:00");
        assert_eq!(parse_timestamp(&s).unwrap(), dt);
    }
}
