//! Time zone helpers centred on Japan Standard Time
//!
//! JST is a fixed UTC+09:00 offset with no daylight saving, so every helper
//! works with `chrono::FixedOffset`. Aware input is converted directly; naive
//! input is first localized to an offset the caller chooses.

use crate::errors::{Result, SqlmyError};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Offset of Japan Standard Time from UTC, in seconds
pub const JST_OFFSET_SECS: i32 = 9 * 3600;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Japan Standard Time (UTC+09:00)
pub fn jst() -> FixedOffset {
    FixedOffset::east_opt(JST_OFFSET_SECS).expect("JST offset is within one day")
}

/// UTC as a fixed offset
pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is valid")
}

/// The current time in Japan
pub fn current_japan_time() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&jst())
}

/// Convert an aware timestamp to JST
pub fn to_jst<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<FixedOffset> {
    convert(dt, jst())
}

/// Convert an aware timestamp to `target`, keeping the instant
pub fn convert<Tz: TimeZone>(dt: &DateTime<Tz>, target: FixedOffset) -> DateTime<FixedOffset> {
    dt.with_timezone(&target)
}

/// Attach `offset` to a naive timestamp, reading it as wall-clock time there
///
/// # Errors
///
/// `InvalidTimestamp` when the result falls outside chrono's range.
pub fn localize(naive: NaiveDateTime, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| SqlmyError::InvalidTimestamp {
            input: naive.to_string(),
            reason: format!("out of range for offset {}", offset),
        })
}

/// Parse a timestamp string
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS[.f][±HH:MM]`,
/// `YYYY-MM-DDTHH:MM:SS[.f]` and `YYYY-MM-DD`. Forms without an offset are
/// localized to `naive_offset`.
///
/// # Errors
///
/// `InvalidTimestamp` carrying chrono's parse error for malformed input.
pub fn parse_timestamp(input: &str, naive_offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let trimmed = input.trim();

    let rfc3339_err = match DateTime::parse_from_rfc3339(trimmed) {
        Ok(dt) => return Ok(dt),
        Err(e) => e,
    };
    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt);
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return localize(naive, naive_offset);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return localize(midnight, naive_offset);
        }
    }

    Err(SqlmyError::InvalidTimestamp {
        input: input.to_string(),
        reason: rfc3339_err.to_string(),
    })
}

/// Parse a UTC offset: `Z`, `UTC`, `GMT`, `JST`, `±HH`, `±HHMM` or `±HH:MM`
///
/// # Errors
///
/// `InvalidOffset` for anything else, or for offsets of a day or more.
pub fn parse_offset(input: &str) -> Result<FixedOffset> {
    let trimmed = input.trim();
    match trimmed.to_ascii_uppercase().as_str() {
        "Z" | "UTC" | "GMT" => return Ok(utc()),
        "JST" => return Ok(jst()),
        _ => {}
    }

    let invalid = || SqlmyError::InvalidOffset {
        input: input.to_string(),
    };
    let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = trimmed.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(invalid());
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().map_err(|_| invalid())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| invalid())?,
            digits[2..].parse::<i32>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };
    if minutes >= 60 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_jst_is_plus_nine() {
        assert_eq!(jst().local_minus_utc(), 9 * 3600);
        assert_eq!(current_japan_time().offset().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_to_jst_shifts_wall_clock() {
        let utc_noon = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let jst_time = to_jst(&utc_noon);
        assert_eq!(jst_time.hour(), 21);
        assert_eq!(jst_time, utc_noon);
    }

    #[test]
    fn test_to_jst_crosses_midnight() {
        let late = Utc.with_ymd_and_hms(2024, 12, 31, 20, 30, 0).unwrap();
        let jst_time = to_jst(&late);
        assert_eq!(jst_time.to_rfc3339(), "2025-01-01T05:30:00+09:00");
    }

    #[test]
    fn test_localize_reads_wall_clock() {
        let naive = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let dt = localize(naive, jst()).unwrap();
        assert_eq!(dt.with_timezone(&Utc).hour(), 0);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = "2024-05-01T10:15:30+09:00";
        for input in [
            "2024-05-01T10:15:30+09:00",
            "2024-05-01 10:15:30+09:00",
            "2024-05-01 10:15:30",
            "2024-05-01T10:15:30",
        ] {
            let dt = parse_timestamp(input, jst()).unwrap();
            assert_eq!(dt.to_rfc3339(), expected, "input: {}", input);
        }

        let date_only = parse_timestamp("2024-05-01", utc()).unwrap();
        assert_eq!(date_only.to_rfc3339(), "2024-05-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_timestamp_keeps_fraction() {
        let dt = parse_timestamp("2024-05-01 10:15:30.250", utc()).unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        let err = parse_timestamp("not a date", jst()).unwrap_err();
        match err {
            SqlmyError::InvalidTimestamp { input, reason } => {
                assert_eq!(input, "not a date");
                assert!(!reason.is_empty());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("JST").unwrap(), jst());
        assert_eq!(parse_offset("Z").unwrap(), utc());
        assert_eq!(parse_offset("+09:00").unwrap(), jst());
        assert_eq!(parse_offset("+0900").unwrap(), jst());
        assert_eq!(parse_offset("-05").unwrap().local_minus_utc(), -5 * 3600);
        assert_eq!(parse_offset("+05:30").unwrap().local_minus_utc(), 19_800);
    }

    #[test]
    fn test_parse_offset_rejects_invalid() {
        for input in ["", "09:00", "+9", "+09:75", "+24:00", "EST5EDT"] {
            assert!(parse_offset(input).is_err(), "input: {}", input);
        }
    }
}
