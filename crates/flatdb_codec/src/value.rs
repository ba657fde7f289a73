//! Dynamic field value type.

use crate::error::{CodecError, CodecResult};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// A dynamic field value.
///
/// Values are what converters produce from raw row fields and what entity
/// field accessors hand back to the marshal routine. Closed enumerations are
/// carried as `Text` holding the variant name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value (an empty field).
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Free text or an enumeration variant name.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
}

impl Value {
    /// Returns the name of this value's kind, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Text(_) => "text",
            Value::Date(_) => "date",
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as a date, if it is one.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Converts an optional value, mapping `None` to [`Value::Null`].
    pub fn optional<T: Into<Value>>(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }

    /// Consumes a possibly-null value into an `Option<T>`.
    pub fn into_optional<T>(self) -> CodecResult<Option<T>>
    where
        T: TryFrom<Value, Error = CodecError>,
    {
        match self {
            Value::Null => Ok(None),
            other => T::try_from(other).map(Some),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(crate::registry::DATE_FORMAT)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Text(s.clone())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl TryFrom<Value> for bool {
    type Error = CodecError;

    fn try_from(value: Value) -> CodecResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(CodecError::type_mismatch("bool", other.kind())),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = CodecError;

    fn try_from(value: Value) -> CodecResult<Self> {
        match value {
            Value::Integer(n) => Ok(n),
            other => Err(CodecError::type_mismatch("integer", other.kind())),
        }
    }
}

impl TryFrom<Value> for u32 {
    type Error = CodecError;

    fn try_from(value: Value) -> CodecResult<Self> {
        match value {
            Value::Integer(n) => u32::try_from(n).map_err(|_| {
                CodecError::invalid_value("int", n.to_string(), "out of range for u32")
            }),
            other => Err(CodecError::type_mismatch("integer", other.kind())),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = CodecError;

    fn try_from(value: Value) -> CodecResult<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(CodecError::type_mismatch("text", other.kind())),
        }
    }
}

impl TryFrom<Value> for NaiveDate {
    type Error = CodecError;

    fn try_from(value: Value) -> CodecResult<Self> {
        match value {
            Value::Date(d) => Ok(d),
            other => Err(CodecError::type_mismatch("date", other.kind())),
        }
    }
}
