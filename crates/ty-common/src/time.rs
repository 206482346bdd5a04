//! Time handling for 10-minute radar sequences.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};

/// Spacing between consecutive radar frames.
pub const STEP_MINUTES: i64 = 10;

/// Format of frame labels and file timestamps, e.g. `202001010030`.
pub const LABEL_FORMAT: &str = "%Y%m%d%H%M";

/// Naive formats accepted for event lists and scalar tables, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    LABEL_FORMAT,
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

/// `n` frame steps as a duration.
pub fn steps(n: i64) -> Duration {
    Duration::minutes(STEP_MINUTES * n)
}

/// Whole frame steps from `from` to `to`, rounded toward negative infinity.
pub fn whole_steps_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().div_euclid(STEP_MINUTES * 60)
}

/// Parse a date-time string. RFC 3339 strings keep their offset; naive
/// strings are taken as UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

/// Fixed-width label for a frame time.
pub fn format_label(dt: &DateTime<Utc>) -> String {
    dt.format(LABEL_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 2, 0, 0).unwrap();
        for s in [
            "2020-01-01 02:00:00",
            "2020-01-01 02:00",
            "2020-01-01T02:00:00",
            "2020-01-01T02:00:00Z",
            "2020/01/01 02:00",
            "202001010200",
        ] {
            assert_eq!(parse_datetime(s).unwrap(), expected, "format {}", s);
        }
    }

    #[test]
    fn test_parse_datetime_offset() {
        let dt = parse_datetime("2020-01-01T10:00:00+08:00").unwrap();
        assert_eq!(dt.day(), 1);
        assert_eq!(dt.hour(), 2);
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(matches!(
            parse_datetime("yesterday"),
            Err(TimeParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_format_label() {
        let dt = Utc.with_ymd_and_hms(2019, 8, 9, 3, 40, 0).unwrap();
        assert_eq!(format_label(&dt), "201908090340");
        assert_eq!(format_label(&dt).len(), 12);
        assert_eq!(parse_datetime(&format_label(&dt)).unwrap().year(), 2019);
    }

    #[test]
    fn test_whole_steps_between() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(whole_steps_between(start, start + Duration::minutes(80)), 8);
        assert_eq!(whole_steps_between(start, start + Duration::minutes(89)), 8);
        assert_eq!(whole_steps_between(start, start - Duration::minutes(5)), -1);
        assert_eq!(whole_steps_between(start, start + steps(3)), 3);
    }
}
