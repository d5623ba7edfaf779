//! Dynamically typed cell values.
//!
//! SQLite stores every cell with its own storage class, regardless of the
//! type a column was declared with. A [`Value`] carries that storage class
//! as-is; [`Value::coerce`] is the single place where a value is converted
//! into the [`ValueKind`] a column was declared with.

use std::fmt;

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Storage class of a value, also used as the declared kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Blob => "blob",
        }
    }

    /// Parses a kind name. Accepts the common SQL spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "null" => Some(Self::Null),
            "integer" | "int" | "int64" => Some(Self::Integer),
            "real" | "float" | "double" => Some(Self::Real),
            "text" | "string" => Some(Self::Text),
            "blob" | "bytes" => Some(Self::Blob),
            _ => None,
        }
    }

    /// The zero/empty value a NULL cell reads as in a column of this kind.
    pub fn default_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer => Value::Integer(0),
            Self::Real => Value::Real(0.0),
            Self::Text => Value::Text(String::new()),
            Self::Blob => Value::Blob(Vec::new()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value that could not be represented in the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot convert {from} to {to}: {reason}")]
pub struct ConversionError {
    pub from: ValueKind,
    pub to: ValueKind,
    pub reason: String,
}

impl ConversionError {
    fn new(from: ValueKind, to: ValueKind, reason: impl Into<String>) -> Self {
        Self {
            from,
            to,
            reason: reason.into(),
        }
    }
}

/// One cell: a SQLite storage class together with its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Integer(_) => ValueKind::Integer,
            Self::Real(_) => ValueKind::Real,
            Self::Text(_) => ValueKind::Text,
            Self::Blob(_) => ValueKind::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Self::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// Converts this value into `to`.
    ///
    /// NULL converts to every kind and stays NULL. Conversions that would
    /// lose information (a fractional real into an integer, non-numeric text
    /// into a number, an integer beyond the exact range of a real, invalid
    /// UTF-8 into text) fail instead of producing a different value. NaN
    /// converts to nothing.
    pub fn coerce(self, to: ValueKind) -> Result<Value, ConversionError> {
        let from = self.kind();
        if let Self::Real(f) = &self {
            if f.is_nan() {
                // SQLite stores NaN as NULL.
                return Err(ConversionError::new(from, to, "NaN has no stored form"));
            }
        }
        if from == to || from == ValueKind::Null {
            return Ok(self);
        }

        match (self, to) {
            (_, ValueKind::Null) => Err(ConversionError::new(
                from,
                to,
                "only NULL is representable as null",
            )),

            (Self::Integer(i), ValueKind::Real) => integer_to_real(i)
                .map(Self::Real)
                .ok_or_else(|| ConversionError::new(from, to, format!("{i} has no exact real form"))),
            (Self::Integer(i), ValueKind::Text) => Ok(Self::Text(i.to_string())),

            (Self::Real(f), ValueKind::Integer) => real_to_integer(f)
                .map(Self::Integer)
                .ok_or_else(|| ConversionError::new(from, to, format!("{f} is not an exact integer"))),
            (Self::Real(f), ValueKind::Text) => Ok(Self::Text(real_to_text(f))),

            (Self::Text(s), ValueKind::Integer) => text_to_integer(&s)
                .map(Self::Integer)
                .ok_or_else(|| ConversionError::new(from, to, format!("{s:?} is not an integer literal"))),
            (Self::Text(s), ValueKind::Real) => text_to_real(&s)
                .map(Self::Real)
                .ok_or_else(|| ConversionError::new(from, to, format!("{s:?} is not a numeric literal"))),
            (Self::Text(s), ValueKind::Blob) => Ok(Self::Blob(s.into_bytes())),

            (Self::Blob(b), ValueKind::Text) => String::from_utf8(b)
                .map(Self::Text)
                .map_err(|e| ConversionError::new(from, to, e.to_string())),

            (_, _) => Err(ConversionError::new(from, to, "no conversion rule")),
        }
    }

    /// Reads a stored cell into a column of `declared` kind.
    ///
    /// NULL cells read as the kind's zero/empty value.
    pub fn read_as(self, declared: ValueKind) -> Result<Value, ConversionError> {
        if self.is_null() {
            return Ok(declared.default_value());
        }
        self.coerce(declared)
    }
}

/// Largest magnitude below which every integer has an exact `f64`.
const EXACT_REAL_LIMIT: f64 = 9_007_199_254_740_992.0;

fn integer_to_real(i: i64) -> Option<f64> {
    // i64::MAX rounds up to 2^63, which saturates back to i64::MAX.
    let f = i as f64;
    (i != i64::MAX && f as i64 == i).then_some(f)
}

fn real_to_integer(f: f64) -> Option<i64> {
    // i64::MAX is not exactly representable; the upper bound is exclusive.
    if f.is_finite() && f.fract() == 0.0 && f >= -9_223_372_036_854_775_808.0 && f < 9_223_372_036_854_775_808.0
    {
        Some(f as i64)
    } else {
        None
    }
}

fn real_to_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

fn text_to_integer(s: &str) -> Option<i64> {
    let trimmed = s.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| {
            text_to_real(trimmed)
                .filter(|f| f.abs() < EXACT_REAL_LIMIT)
                .and_then(real_to_integer)
        })
}

fn text_to_real(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|f| f.is_finite())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => f.write_str(&real_to_text(*r)),
            Self::Text(s) => f.write_str(s),
            Self::Blob(b) => {
                f.write_str("x'")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<ValueRef<'_>> for Value {
    /// Text that is not valid UTF-8 is kept byte-for-byte as a blob.
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self::Null,
            ValueRef::Integer(i) => Self::Integer(i),
            ValueRef::Real(f) => Self::Real(f),
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(s) => Self::Text(s.to_owned()),
                Err(_) => Self::Blob(t.to_vec()),
            },
            ValueRef::Blob(b) => Self::Blob(b.to_vec()),
        }
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Self::from(value))
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::Borrowed(match self {
            Self::Null => ValueRef::Null,
            Self::Integer(i) => ValueRef::Integer(*i),
            Self::Real(f) => ValueRef::Real(*f),
            Self::Text(s) => ValueRef::Text(s.as_bytes()),
            Self::Blob(b) => ValueRef::Blob(b),
        }))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Real(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Blob(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Self::Blob(b.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_is_identity() {
        assert_eq!(Value::Integer(7).coerce(ValueKind::Integer), Ok(Value::Integer(7)));
        assert_eq!(
            Value::Text("x".into()).coerce(ValueKind::Text),
            Ok(Value::Text("x".into()))
        );
    }

    #[test]
    fn null_coerces_to_null_but_reads_as_default() {
        assert_eq!(Value::Null.coerce(ValueKind::Integer), Ok(Value::Null));
        assert_eq!(Value::Null.read_as(ValueKind::Integer), Ok(Value::Integer(0)));
        assert_eq!(Value::Null.read_as(ValueKind::Real), Ok(Value::Real(0.0)));
        assert_eq!(Value::Null.read_as(ValueKind::Text), Ok(Value::Text(String::new())));
        assert_eq!(Value::Null.read_as(ValueKind::Blob), Ok(Value::Blob(Vec::new())));
    }

    #[test]
    fn numeric_text_converts_to_numbers() {
        assert_eq!(
            Value::Text(" 42 ".into()).coerce(ValueKind::Integer),
            Ok(Value::Integer(42))
        );
        assert_eq!(
            Value::Text("3.0".into()).coerce(ValueKind::Integer),
            Ok(Value::Integer(3))
        );
        assert_eq!(
            Value::Text("2.5".into()).coerce(ValueKind::Real),
            Ok(Value::Real(2.5))
        );
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        let err = Value::Text("abc".into())
            .coerce(ValueKind::Integer)
            .unwrap_err();
        assert_eq!(err.from, ValueKind::Text);
        assert_eq!(err.to, ValueKind::Integer);

        assert!(Value::Text("2.5".into()).coerce(ValueKind::Integer).is_err());
        assert!(Value::Text("inf".into()).coerce(ValueKind::Real).is_err());
    }

    #[test]
    fn numbers_convert_to_text() {
        assert_eq!(
            Value::Integer(100).coerce(ValueKind::Text),
            Ok(Value::Text("100".into()))
        );
        assert_eq!(
            Value::Real(100.0).coerce(ValueKind::Text),
            Ok(Value::Text("100.0".into()))
        );
        assert_eq!(
            Value::Real(0.25).coerce(ValueKind::Text),
            Ok(Value::Text("0.25".into()))
        );
    }

    #[test]
    fn real_to_integer_requires_exact_value() {
        assert_eq!(Value::Real(4.0).coerce(ValueKind::Integer), Ok(Value::Integer(4)));
        assert!(Value::Real(4.5).coerce(ValueKind::Integer).is_err());
        assert!(Value::Real(f64::NAN).coerce(ValueKind::Integer).is_err());
        assert!(Value::Real(1e300).coerce(ValueKind::Integer).is_err());
    }

    #[test]
    fn integer_to_real_refuses_rounding() {
        assert_eq!(
            Value::Integer(9_007_199_254_740_992).coerce(ValueKind::Real),
            Ok(Value::Real(9_007_199_254_740_992.0))
        );
        assert!(Value::Integer(9_007_199_254_740_993)
            .coerce(ValueKind::Real)
            .is_err());
        assert!(Value::Integer(i64::MAX).coerce(ValueKind::Real).is_err());
        assert_eq!(
            Value::Integer(i64::MIN).coerce(ValueKind::Real),
            Ok(Value::Real(-9_223_372_036_854_775_808.0))
        );
    }

    #[test]
    fn text_to_integer_refuses_inexact_reals() {
        assert_eq!(
            Value::Text("9007199254740993".into()).coerce(ValueKind::Integer),
            Ok(Value::Integer(9_007_199_254_740_993))
        );
        assert!(Value::Text("9007199254740993.0".into())
            .coerce(ValueKind::Integer)
            .is_err());
        assert_eq!(
            Value::Text("1e3".into()).coerce(ValueKind::Integer),
            Ok(Value::Integer(1000))
        );
    }

    #[test]
    fn nan_has_no_conversion() {
        assert!(Value::Real(f64::NAN).coerce(ValueKind::Real).is_err());
        assert!(Value::Real(f64::NAN).coerce(ValueKind::Text).is_err());
        assert!(Value::Real(f64::NAN).read_as(ValueKind::Real).is_err());
        assert_eq!(
            Value::Real(f64::INFINITY).coerce(ValueKind::Real),
            Ok(Value::Real(f64::INFINITY))
        );
    }

    #[test]
    fn blob_conversions() {
        assert_eq!(
            Value::Blob(b"hi".to_vec()).coerce(ValueKind::Text),
            Ok(Value::Text("hi".into()))
        );
        assert!(Value::Blob(vec![0xff, 0xfe]).coerce(ValueKind::Text).is_err());
        assert!(Value::Blob(vec![1]).coerce(ValueKind::Integer).is_err());
        assert!(Value::Integer(1).coerce(ValueKind::Blob).is_err());
        assert_eq!(
            Value::Text("ab".into()).coerce(ValueKind::Blob),
            Ok(Value::Blob(b"ab".to_vec()))
        );
    }

    #[test]
    fn non_null_never_becomes_null() {
        assert!(Value::Integer(1).coerce(ValueKind::Null).is_err());
    }

    #[test]
    fn invalid_utf8_text_is_kept_as_blob() {
        let value = Value::from(ValueRef::Text(&[0xc3, 0x28]));
        assert_eq!(value, Value::Blob(vec![0xc3, 0x28]));
    }

    #[test]
    fn kind_parse_accepts_sql_spellings() {
        assert_eq!(ValueKind::parse("INT"), Some(ValueKind::Integer));
        assert_eq!(ValueKind::parse("double"), Some(ValueKind::Real));
        assert_eq!(ValueKind::parse("String"), Some(ValueKind::Text));
        assert_eq!(ValueKind::parse("varchar"), None);
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Blob(vec![0xab, 0x01]).to_string(), "x'ab01'");
        assert_eq!(Value::Real(1.0).to_string(), "1.0");
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
    }
}
