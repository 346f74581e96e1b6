//! Conversions from raw field text to typed values
//!
//! Every function here is pure: it looks only at the string it is given and
//! fails with a [`CsvError::Coerce`] whose [`CoerceErrorKind`] names the
//! target type family. Surrounding whitespace is trimmed before parsing,
//! since unquoted fields keep their leading spaces.

use crate::error::{CoerceErrorKind, CsvError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::num::ParseIntError;
use std::str::FromStr;

/// Date layout accepted by [`parse_date`]
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Date-time layouts accepted by [`parse_datetime`] besides RFC 3339
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse an integer of any primitive width
pub fn parse_int<T>(value: &str) -> Result<T>
where
    T: FromStr<Err = ParseIntError>,
{
    value
        .trim()
        .parse()
        .map_err(|e| CsvError::coerce(value, CoerceErrorKind::Integer, e))
}

/// Parse a 64-bit float
pub fn parse_f64(value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|e| CsvError::coerce(value, CoerceErrorKind::Float, e))
}

/// Parse a 32-bit float
pub fn parse_f32(value: &str) -> Result<f32> {
    value
        .trim()
        .parse()
        .map_err(|e| CsvError::coerce(value, CoerceErrorKind::Float, e))
}

/// Parse a boolean: `true`/`yes`/`1` or `false`/`no`/`0`, case-insensitive
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(CsvError::coerce(
            value,
            CoerceErrorKind::Bool,
            "expected true/false, yes/no or 1/0",
        )),
    }
}

/// Parse a calendar date in `YYYY-MM-DD` form
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| CsvError::coerce(value, CoerceErrorKind::Date, e))
}

/// Parse a date-time: RFC 3339 (normalized to UTC) or `YYYY-MM-DD HH:MM:SS`
pub fn parse_datetime(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_utc());
    }

    let mut last_err = None;
    for format in DATETIME_FORMATS {
        match NaiveDateTime::parse_from_str(trimmed, format) {
            Ok(dt) => return Ok(dt),
            Err(e) => last_err = Some(e),
        }
    }

    Err(CsvError::coerce(
        value,
        CoerceErrorKind::DateTime,
        last_err.map_or_else(|| "unrecognized format".to_string(), |e| e.to_string()),
    ))
}

/// Types a field can be converted into by [`CsvCursor::get_as`](crate::CsvCursor::get_as)
pub trait FromField: Sized {
    /// Convert raw field text
    fn from_field(value: &str) -> Result<Self>;
}

impl FromField for String {
    fn from_field(value: &str) -> Result<Self> {
        Ok(value.to_string())
    }
}

macro_rules! impl_from_field_int {
    ($($ty:ty),*) => {
        $(
            impl FromField for $ty {
                fn from_field(value: &str) -> Result<Self> {
                    parse_int(value)
                }
            }
        )*
    };
}

impl_from_field_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl FromField for f32 {
    fn from_field(value: &str) -> Result<Self> {
        parse_f32(value)
    }
}

impl FromField for f64 {
    fn from_field(value: &str) -> Result<Self> {
        parse_f64(value)
    }
}

impl FromField for bool {
    fn from_field(value: &str) -> Result<Self> {
        parse_bool(value)
    }
}

impl FromField for NaiveDate {
    fn from_field(value: &str) -> Result<Self> {
        parse_date(value)
    }
}

impl FromField for NaiveDateTime {
    fn from_field(value: &str) -> Result<Self> {
        parse_datetime(value)
    }
}
