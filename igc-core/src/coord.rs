//! Fixed-width coordinate and date/time decoding.
//!
//! IGC coordinates are degrees / minutes / thousandths-of-minutes with a
//! trailing hemisphere letter:
//! - Latitude:  `DDMMmmmH`  (8 chars, H in {N, S})
//! - Longitude: `DDDMMmmmH` (9 chars, H in {E, W})
//!
//! Timestamps come in two fixed forms: `HHMMSS` time of day and `DDMMYY`
//! dates, composed into `DDMMYYHHMMSS` for the task declaration.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::types::{IgcError, Result};

/// chrono format string for IGC time of day.
pub const TIME_FORMAT: &str = "%H%M%S";

/// chrono format string for IGC dates.
pub const DATE_FORMAT: &str = "%d%m%y";

/// Decode a fixed-width degree/minute/decimal-minute string into decimal
/// degrees. Sign comes from the trailing hemisphere letter (S and W are
/// negative). Malformed input yields 0.0; this is a pure utility with no
/// error channel, validation belongs to the record decoders.
pub fn dmd_to_decimal(raw: &str) -> f64 {
    if !raw.is_ascii() {
        return 0.0;
    }

    let deg_len = match raw.len() {
        8 => 2,  // latitude
        9 => 3,  // longitude
        _ => return 0.0,
    };

    let sign = match raw.as_bytes()[raw.len() - 1] {
        b'N' | b'E' => 1.0,
        b'S' | b'W' => -1.0,
        _ => return 0.0,
    };

    let degrees: f64 = match raw[..deg_len].parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    let minutes: f64 = match raw[deg_len..deg_len + 2].parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };
    let thousandths: f64 = match raw[deg_len + 2..raw.len() - 1].parse() {
        Ok(v) => v,
        Err(_) => return 0.0,
    };

    sign * (degrees + (minutes + thousandths / 1000.0) / 60.0)
}

/// Parse an `HHMMSS` time of day.
pub fn parse_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, TIME_FORMAT).map_err(|_| IgcError::InvalidField {
        field: "time",
        line: raw.to_string(),
    })
}

/// Parse a `DDMMYY` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| IgcError::InvalidField {
        field: "date",
        line: raw.to_string(),
    })
}

/// Parse the combined `DDMMYYHHMMSS` form used by the task declaration.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%d%m%y%H%M%S").map_err(|_| IgcError::InvalidField {
        field: "date and time",
        line: raw.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
