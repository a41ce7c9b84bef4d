//! SQL value types for database-agnostic row handling.
//!
//! Extracted rows and bound statement parameters share one value
//! representation, so classification rules (numeric, temporal, binary) are
//! applied consistently by the emission and redaction layers.

use std::borrow::Cow;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

/// SQL value enum for type-safe row handling with efficient memory usage.
///
/// Uses `Cow` for string and byte data to enable zero-copy handling when
/// values are borrowed from driver buffers.
///
/// # Lifetime
///
/// The `'a` lifetime allows borrowing from source buffers during read
/// operations. For owned data that outlives the source buffer, use
/// `.into_owned()`.
///
/// # Example
///
/// ```rust
/// use std::borrow::Cow;
/// use diff_changelog::core::SqlValue;
///
/// // Zero-copy from a source buffer
/// let borrowed: SqlValue<'_> = SqlValue::Text(Cow::Borrowed("hello"));
///
/// // Convert to owned for storage
/// let owned: SqlValue<'static> = borrowed.into_owned();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue<'a> {
    /// NULL value.
    Null,

    /// Boolean value.
    Bool(bool),

    /// 16-bit signed integer (smallint).
    I16(i16),

    /// 32-bit signed integer (int).
    I32(i32),

    /// 64-bit signed integer (bigint).
    I64(i64),

    /// 32-bit floating point (real/float4).
    F32(f32),

    /// 64-bit floating point (double precision/float8).
    F64(f64),

    /// Text/string data with zero-copy support.
    Text(Cow<'a, str>),

    /// Binary data with zero-copy support.
    Bytes(Cow<'a, [u8]>),

    /// UUID/GUID value.
    Uuid(Uuid),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Timestamp with timezone offset.
    DateTimeOffset(DateTime<FixedOffset>),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),
}

impl<'a> SqlValue<'a> {
    /// Convert to a fully owned value with `'static` lifetime.
    #[must_use]
    pub fn into_owned(self) -> SqlValue<'static> {
        match self {
            SqlValue::Null => SqlValue::Null,
            SqlValue::Bool(v) => SqlValue::Bool(v),
            SqlValue::I16(v) => SqlValue::I16(v),
            SqlValue::I32(v) => SqlValue::I32(v),
            SqlValue::I64(v) => SqlValue::I64(v),
            SqlValue::F32(v) => SqlValue::F32(v),
            SqlValue::F64(v) => SqlValue::F64(v),
            SqlValue::Text(v) => SqlValue::Text(Cow::Owned(v.into_owned())),
            SqlValue::Bytes(v) => SqlValue::Bytes(Cow::Owned(v.into_owned())),
            SqlValue::Uuid(v) => SqlValue::Uuid(v),
            SqlValue::Decimal(v) => SqlValue::Decimal(v),
            SqlValue::DateTime(v) => SqlValue::DateTime(v),
            SqlValue::DateTimeOffset(v) => SqlValue::DateTimeOffset(v),
            SqlValue::Date(v) => SqlValue::Date(v),
            SqlValue::Time(v) => SqlValue::Time(v),
        }
    }

    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Check if this value is numeric (integer, float, or decimal).
    ///
    /// Redaction only rewrites numeric values; the emitter writes numerics
    /// under a typed key.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            SqlValue::I16(_)
                | SqlValue::I32(_)
                | SqlValue::I64(_)
                | SqlValue::F32(_)
                | SqlValue::F64(_)
                | SqlValue::Decimal(_)
        )
    }

    /// Check if this value carries a date or time component.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            SqlValue::DateTime(_)
                | SqlValue::DateTimeOffset(_)
                | SqlValue::Date(_)
                | SqlValue::Time(_)
        )
    }

    /// Narrow to `i64` for scalar query results such as row counts.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I16(v) => Some(i64::from(*v)),
            SqlValue::I32(v) => Some(i64::from(*v)),
            SqlValue::I64(v) => Some(*v),
            SqlValue::Decimal(v) => v.to_i64(),
            _ => None,
        }
    }

    /// Render the value as text for changelog and tabular output.
    ///
    /// Returns `None` for NULL. Temporals use ISO-8601, bytes are
    /// hex-encoded, everything else uses its natural string form.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Bool(v) => Some(v.to_string()),
            SqlValue::I16(v) => Some(v.to_string()),
            SqlValue::I32(v) => Some(v.to_string()),
            SqlValue::I64(v) => Some(v.to_string()),
            SqlValue::F32(v) => Some(v.to_string()),
            SqlValue::F64(v) => Some(v.to_string()),
            SqlValue::Text(v) => Some(v.to_string()),
            SqlValue::Bytes(v) => Some(hex::encode(v)),
            SqlValue::Uuid(v) => Some(v.to_string()),
            SqlValue::Decimal(v) => Some(v.to_string()),
            SqlValue::DateTime(v) => Some(iso_datetime(v)),
            SqlValue::DateTimeOffset(v) => Some(v.format("%Y-%m-%dT%H:%M:%S%.3f%:z").to_string()),
            SqlValue::Date(v) => Some(v.format("%Y-%m-%d").to_string()),
            SqlValue::Time(v) => Some(v.format("%H:%M:%S").to_string()),
        }
    }
}

fn iso_datetime(v: &NaiveDateTime) -> String {
    if v.nanosecond() == 0 {
        v.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        v.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
    }
}

// Convenience constructors for common cases
impl<'a> SqlValue<'a> {
    /// Create a text value from a borrowed string slice.
    #[must_use]
    pub fn text_borrowed(s: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(s))
    }

    /// Create a text value from an owned String.
    #[must_use]
    pub fn text_owned(s: String) -> SqlValue<'static> {
        SqlValue::Text(Cow::Owned(s))
    }

    /// Create a bytes value from a borrowed byte slice.
    #[must_use]
    pub fn bytes_borrowed(b: &'a [u8]) -> Self {
        SqlValue::Bytes(Cow::Borrowed(b))
    }

    /// Create a bytes value from an owned Vec<u8>.
    #[must_use]
    pub fn bytes_owned(b: Vec<u8>) -> SqlValue<'static> {
        SqlValue::Bytes(Cow::Owned(b))
    }
}

// From implementations for common types
impl From<bool> for SqlValue<'static> {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue<'static> {
    fn from(v: i16) -> Self {
        SqlValue::I16(v)
    }
}

impl From<i32> for SqlValue<'static> {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue<'static> {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<f64> for SqlValue<'static> {
    fn from(v: f64) -> Self {
        SqlValue::F64(v)
    }
}

impl From<String> for SqlValue<'static> {
    fn from(v: String) -> Self {
        SqlValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a str> for SqlValue<'a> {
    fn from(v: &'a str) -> Self {
        SqlValue::Text(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for SqlValue<'static> {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(Cow::Owned(v))
    }
}

impl From<Uuid> for SqlValue<'static> {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(v)
    }
}

impl From<Decimal> for SqlValue<'static> {
    fn from(v: Decimal) -> Self {
        SqlValue::Decimal(v)
    }
}

impl From<NaiveDateTime> for SqlValue<'static> {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl From<NaiveDate> for SqlValue<'static> {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sql_value_into_owned() {
        let borrowed: SqlValue<'_> = SqlValue::Text(Cow::Borrowed("hello"));
        let owned: SqlValue<'static> = borrowed.into_owned();
        assert_eq!(owned, SqlValue::Text(Cow::Owned("hello".to_string())));
    }

    #[test]
    fn test_is_null() {
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::I32(42).is_null());
    }

    #[test]
    fn test_is_numeric_covers_decimal() {
        assert!(SqlValue::I64(7).is_numeric());
        assert!(SqlValue::Decimal(Decimal::from_str("1.25").unwrap()).is_numeric());
        assert!(!SqlValue::text_borrowed("7").is_numeric());
        assert!(!SqlValue::Bool(true).is_numeric());
    }

    #[test]
    fn test_as_i64_from_decimal() {
        let count = SqlValue::Decimal(Decimal::from(25_000));
        assert_eq!(count.as_i64(), Some(25_000));
        assert_eq!(SqlValue::text_borrowed("25000").as_i64(), None);
    }

    #[test]
    fn test_to_text_formats() {
        assert_eq!(SqlValue::Null.to_text(), None);
        assert_eq!(SqlValue::I32(3).to_text().as_deref(), Some("3"));
        assert_eq!(SqlValue::Bool(false).to_text().as_deref(), Some("false"));
        assert_eq!(
            SqlValue::bytes_borrowed(&[0xde, 0xad]).to_text().as_deref(),
            Some("dead")
        );

        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(13, 5, 0)
            .unwrap();
        assert_eq!(
            SqlValue::DateTime(dt).to_text().as_deref(),
            Some("2024-03-01T13:05:00")
        );
    }

    #[test]
    fn test_from_implementations() {
        let v: SqlValue<'static> = 42i32.into();
        assert_eq!(v, SqlValue::I32(42));

        let v: SqlValue<'static> = "hello".to_string().into();
        assert_eq!(v, SqlValue::Text(Cow::Owned("hello".to_string())));
    }
}
