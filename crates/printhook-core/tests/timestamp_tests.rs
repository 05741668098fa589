use chrono::{DateTime, FixedOffset, SecondsFormat, TimeZone, Utc};
use printhook_core::timestamps::{parse_timestamp, sentinel_timestamp, try_parse_timestamp};
use proptest::prelude::*;

fn arb_datetime() -> impl Strategy<Value = DateTime<Utc>> {
    // Year 2001 through 2100, whole microseconds
    (978_307_200_000_000i64..4_102_444_800_000_000i64)
        .prop_map(|micros| Utc.timestamp_micros(micros).unwrap())
}

fn arb_offset() -> impl Strategy<Value = FixedOffset> {
    // Whole minutes between -14:00 and +14:00
    (-14 * 60..=14 * 60i32).prop_map(|minutes| FixedOffset::east_opt(minutes * 60).unwrap())
}

proptest! {
    #[test]
    fn zulu_timestamps_round_trip(instant in arb_datetime()) {
        let raw = instant.to_rfc3339_opts(SecondsFormat::Micros, true);
        prop_assert_eq!(parse_timestamp(&raw), instant);
    }

    #[test]
    fn offset_timestamps_recover_utc_instant(instant in arb_datetime(), offset in arb_offset()) {
        let raw = instant
            .with_timezone(&offset)
            .to_rfc3339_opts(SecondsFormat::Secs, false);
        let expected = Utc.timestamp_opt(instant.timestamp(), 0).unwrap();
        prop_assert_eq!(parse_timestamp(&raw), expected);
    }

    #[test]
    fn listing_format_is_utc(instant in arb_datetime()) {
        let raw = instant.format("%Y-%m-%d %H:%M:%S").to_string();
        let expected = Utc.timestamp_opt(instant.timestamp(), 0).unwrap();
        prop_assert_eq!(parse_timestamp(&raw), expected);
    }

    #[test]
    fn arbitrary_strings_never_panic(raw in "\\PC{0,40}") {
        let parsed = parse_timestamp(&raw);
        match try_parse_timestamp(&raw) {
            Some(instant) => prop_assert_eq!(parsed, instant),
            None => prop_assert_eq!(parsed, sentinel_timestamp()),
        }
    }

    #[test]
    fn alphabetic_garbage_is_sentinel(raw in "[a-zA-Z ]{0,30}") {
        prop_assert_eq!(parse_timestamp(&raw), sentinel_timestamp());
    }
}

#[test]
fn test_sentinel_is_older_than_any_real_event() {
    let recent = parse_timestamp("2001-01-01 00:00:00");
    assert!(sentinel_timestamp() < recent);
}

#[test]
fn test_watermark_record_format_is_accepted() {
    // The watermark record's own format must parse as an upstream timestamp
    let instant = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    let raw = printhook_core::format_watermark(instant);
    assert_eq!(parse_timestamp(&raw), instant);
}
