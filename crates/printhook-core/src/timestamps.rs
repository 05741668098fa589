//! Normalization of the timestamp strings found in request logs.
//!
//! The request-log API is not consistent about how it renders `created_at`:
//! some payloads carry an ISO 8601 string with a `Z` suffix or a numeric
//! offset, some carry a naive ISO string, and the default listing uses
//! `YYYY-MM-DD HH:MM:SS` with no zone at all. Every naive form is UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;

/// Format used by the request-log listing when no zone is rendered.
pub const LISTING_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_ISO_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

/// Instant returned for timestamps that cannot be parsed.
///
/// It is older than any watermark the relay can hold, so malformed events
/// are always treated as already processed and never move the cursor.
pub fn sentinel_timestamp() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Parse an upstream timestamp, falling back to [`sentinel_timestamp`].
///
/// This never fails; use [`try_parse_timestamp`] when the caller needs to
/// know whether the input was understood.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    match try_parse_timestamp(raw) {
        Some(parsed) => {
            debug!("Parsed timestamp {:?} to UTC {}", raw, parsed.to_rfc3339());
            parsed
        }
        None => {
            debug!("Unparseable timestamp {:?}, using sentinel", raw);
            sentinel_timestamp()
        }
    }
}

/// Parse an upstream timestamp into a UTC instant.
///
/// Rules, in order:
/// 1. `T` separator and a trailing `Z`: parsed as UTC.
/// 2. An explicit numeric offset: parsed with that offset, converted to UTC.
/// 3. `T` separator without offset: parsed naive and assumed UTC.
/// 4. Otherwise the listing format `YYYY-MM-DD HH:MM:SS`, assumed UTC.
pub fn try_parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let has_separator = raw.contains('T');

    if has_separator && (raw.ends_with('Z') || raw.ends_with('z')) {
        let without_marker = &raw[..raw.len() - 1];
        return NAIVE_ISO_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(without_marker, fmt).ok())
            .map(|naive| naive.and_utc());
    }

    if has_explicit_offset(raw) {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        return OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
            .map(|parsed| parsed.with_timezone(&Utc));
    }

    if has_separator {
        return NAIVE_ISO_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc());
    }

    NaiveDateTime::parse_from_str(raw, LISTING_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Whether the time portion (past the 10 character date) carries an offset.
fn has_explicit_offset(raw: &str) -> bool {
    match raw.get(10..) {
        Some(time) => time.contains('+') || time.contains('-'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_zulu_suffix() {
        assert_eq!(
            parse_timestamp("2024-03-10T14:05:09Z"),
            utc(2024, 3, 10, 14, 5, 9)
        );
    }

    #[test]
    fn test_parse_zulu_with_fraction() {
        let parsed = parse_timestamp("2024-03-10T14:05:09.250Z");
        assert_eq!(parsed.timestamp_millis(), utc(2024, 3, 10, 14, 5, 9).timestamp_millis() + 250);
    }

    #[test]
    fn test_parse_positive_offset_converts_to_utc() {
        assert_eq!(
            parse_timestamp("2024-03-10T16:05:09+02:00"),
            utc(2024, 3, 10, 14, 5, 9)
        );
    }

    #[test]
    fn test_parse_negative_offset_converts_to_utc() {
        assert_eq!(
            parse_timestamp("2024-03-10T09:05:09-05:00"),
            utc(2024, 3, 10, 14, 5, 9)
        );
    }

    #[test]
    fn test_parse_offset_without_colon() {
        assert_eq!(
            parse_timestamp("2024-03-10T16:05:09+0200"),
            utc(2024, 3, 10, 14, 5, 9)
        );
    }

    #[test]
    fn test_parse_naive_iso_assumes_utc() {
        assert_eq!(
            parse_timestamp("2024-03-10T14:05:09"),
            utc(2024, 3, 10, 14, 5, 9)
        );
        assert_eq!(
            parse_timestamp("2024-03-10T14:05:09.123456").timestamp_micros(),
            utc(2024, 3, 10, 14, 5, 9).timestamp_micros() + 123_456
        );
    }

    #[test]
    fn test_parse_listing_format() {
        assert_eq!(
            parse_timestamp("2024-03-10 14:05:09"),
            utc(2024, 3, 10, 14, 5, 9)
        );
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace() {
        assert_eq!(
            parse_timestamp("  2024-03-10 14:05:09\n"),
            utc(2024, 3, 10, 14, 5, 9)
        );
    }

    #[test]
    fn test_malformed_inputs_return_sentinel() {
        let sentinel = sentinel_timestamp();
        for raw in [
            "",
            "yesterday",
            "2024-13-40 99:99:99",
            "2024-03-10",
            "2024/03/10 14:05:09",
            "2024-03-10T14:05:09+25:00",
            "T",
            "Z",
        ] {
            assert_eq!(parse_timestamp(raw), sentinel, "input {:?}", raw);
            assert!(try_parse_timestamp(raw).is_none(), "input {:?}", raw);
        }
    }

    #[test]
    fn test_sentinel_is_year_2000() {
        assert_eq!(sentinel_timestamp(), utc(2000, 1, 1, 0, 0, 0));
    }
}
