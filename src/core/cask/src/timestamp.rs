//! Minute-granularity allocation timestamps.
//!
//! A timestamp occupies five base64url characters: year offset from
//! [`MIN_YEAR`], zero-based month, zero-based day, hour and minute (UTC).

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};

use crate::error::CaskError;

/// First year a timestamp can encode.
pub const MIN_YEAR: i32 = 2024;

/// Last year a timestamp can encode.
pub const MAX_YEAR: i32 = MIN_YEAR + 63;

/// Encodes a UTC instant as timestamp sextets, truncated to the minute.
pub(crate) fn encode(now: DateTime<Utc>) -> Result<[u8; 5], CaskError> {
    let year = now.year();
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(CaskError::YearOutOfRange(year));
    }

    Ok([
        (year - MIN_YEAR) as u8,
        now.month0() as u8,
        now.day0() as u8,
        now.hour() as u8,
        now.minute() as u8,
    ])
}

/// Decodes timestamp sextets, returning `None` unless they form a real
/// calendar date and time of day.
pub(crate) fn decode(timestamp: [u8; 5]) -> Option<DateTime<Utc>> {
    let [year, month, day, hour, minute] = timestamp.map(u32::from);

    NaiveDate::from_ymd_opt(MIN_YEAR + year as i32, month + 1, day + 1)?
        .and_hms_opt(hour, minute, 0)
        .map(|naive| naive.and_utc())
}
