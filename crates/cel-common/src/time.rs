//! Duration and timestamp support
//!
//! CEL durations and timestamps follow the ranges of the protobuf
//! well-known types: durations span roughly ±10,000 years and timestamps
//! cover years 0001 through 9999. Values outside those ranges can exist in
//! memory but fail at every serialization boundary.

use crate::{ValueError, ValueResult};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use std::fmt::Write;

/// Largest magnitude of a serializable duration, in seconds
pub const MAX_DURATION_SECONDS: i64 = 315_576_000_000;

/// Seconds since the epoch of 0001-01-01T00:00:00Z
pub const MIN_TIMESTAMP_SECONDS: i64 = -62_135_596_800;

/// Seconds since the epoch of 9999-12-31T23:59:59Z
pub const MAX_TIMESTAMP_SECONDS: i64 = 253_402_300_799;

const NANOS_PER_SECOND: u128 = 1_000_000_000;
const NANOS_PER_MINUTE: u128 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MINUTE;

/// Split a duration into protobuf `(seconds, nanos)`
///
/// Both parts carry the sign of the duration.
pub fn duration_to_parts(duration: TimeDelta) -> (i64, i32) {
    (duration.num_seconds(), duration.subsec_nanos())
}

/// Split a timestamp into protobuf `(seconds, nanos)`, nanos always positive
pub fn timestamp_to_parts(timestamp: DateTime<Utc>) -> (i64, i32) {
    let nanos = timestamp.timestamp_subsec_nanos().min(999_999_999);
    (timestamp.timestamp(), nanos as i32)
}

/// Check that `duration` is within the serializable range
pub fn validate_duration(duration: TimeDelta) -> ValueResult<()> {
    let (seconds, _) = duration_to_parts(duration);
    if (-MAX_DURATION_SECONDS..=MAX_DURATION_SECONDS).contains(&seconds) {
        Ok(())
    } else {
        Err(ValueError::invalid_argument(format!(
            "duration out of range: {}",
            format_duration(duration)
        )))
    }
}

/// Check that `timestamp` is within the serializable range
pub fn validate_timestamp(timestamp: DateTime<Utc>) -> ValueResult<()> {
    let seconds = timestamp.timestamp();
    if (MIN_TIMESTAMP_SECONDS..=MAX_TIMESTAMP_SECONDS).contains(&seconds) {
        Ok(())
    } else {
        Err(ValueError::invalid_argument(format!(
            "timestamp out of range: {seconds}s since epoch"
        )))
    }
}

/// Protobuf JSON form of a duration, e.g. `"1.500s"`
///
/// The fraction uses 0, 3, 6 or 9 digits.
pub fn encode_duration_to_json(duration: TimeDelta) -> ValueResult<String> {
    validate_duration(duration)?;
    let (seconds, nanos) = duration_to_parts(duration);
    let mut out = String::new();
    if seconds < 0 || nanos < 0 {
        out.push('-');
    }
    let _ = write!(out, "{}", seconds.unsigned_abs());
    let nanos = nanos.unsigned_abs();
    if nanos != 0 {
        if nanos % 1_000_000 == 0 {
            let _ = write!(out, ".{:03}", nanos / 1_000_000);
        } else if nanos % 1_000 == 0 {
            let _ = write!(out, ".{:06}", nanos / 1_000);
        } else {
            let _ = write!(out, ".{nanos:09}");
        }
    }
    out.push('s');
    Ok(out)
}

/// Protobuf JSON form of a timestamp, RFC 3339 in UTC with a `Z` suffix
pub fn encode_timestamp_to_json(timestamp: DateTime<Utc>) -> ValueResult<String> {
    validate_timestamp(timestamp)?;
    Ok(timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Human readable form of a duration, e.g. `1h2m3.5s`, `250ms` or `0`
pub fn format_duration(duration: TimeDelta) -> String {
    let total = i128::from(duration.num_seconds()) * NANOS_PER_SECOND as i128
        + i128::from(duration.subsec_nanos());
    if total == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    if total < 0 {
        out.push('-');
    }
    let mut nanos = total.unsigned_abs();
    if nanos < NANOS_PER_SECOND {
        let (unit, suffix) = if nanos < 1_000 {
            (1, "ns")
        } else if nanos < 1_000_000 {
            (1_000, "us")
        } else {
            (1_000_000, "ms")
        };
        push_fraction(&mut out, nanos, unit);
        out.push_str(suffix);
        return out;
    }
    let hours = nanos / NANOS_PER_HOUR;
    if hours > 0 {
        let _ = write!(out, "{hours}h");
        nanos %= NANOS_PER_HOUR;
    }
    let minutes = nanos / NANOS_PER_MINUTE;
    if minutes > 0 {
        let _ = write!(out, "{minutes}m");
        nanos %= NANOS_PER_MINUTE;
    }
    if nanos > 0 {
        push_fraction(&mut out, nanos, NANOS_PER_SECOND);
        out.push('s');
    }
    out
}

/// Human readable form of a timestamp, RFC 3339 with the fraction trimmed
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    let mut out = timestamp.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = timestamp.timestamp_subsec_nanos();
    if nanos != 0 {
        let fraction = format!("{nanos:09}");
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    out.push('Z');
    out
}

fn push_fraction(out: &mut String, value: u128, unit: u128) {
    let _ = write!(out, "{}", value / unit);
    let remainder = value % unit;
    if remainder != 0 {
        let width = unit.to_string().len() - 1;
        let digits = format!("{remainder:0width$}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
}
