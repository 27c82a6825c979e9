//! Cell values.
//!
//! This module provides the scalar (and occasionally nested) values held by a
//! [`Table`](crate::Table) column and used as literals inside rules.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Display format for timestamps, also accepted when parsing.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A value in a table cell.
///
/// Columns may be homogeneous or mixed; nothing forces every cell of a column
/// to share a variant. Floating point `NaN` counts as null.
///
/// Deserialized text always stays `String`; timestamps only come from
/// `dtype: datetime` coercion or from code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Timestamp value without time zone
    #[serde(skip_deserializing)]
    Timestamp(NaiveDateTime),
    /// String value
    String(String),
    /// List/array value
    List(Vec<Value>),
    /// Map/struct value
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns true if this value is null (including float `NaN`).
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Returns true for integer and float values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_)) && !self.is_null()
    }

    /// Returns true for list and map values.
    pub fn is_nested(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Timestamp(_) => "datetime",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Attempts to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) if !f.is_nan() => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get this value as a timestamp.
    pub fn as_timestamp(&self) -> Option<&NaiveDateTime> {
        match self {
            Value::Timestamp(ts) => Some(ts),
            _ => None,
        }
    }

    /// Orders two values when they are comparable.
    ///
    /// Numbers compare across integer and float, strings lexicographically,
    /// timestamps and booleans within their own kind. Anything else (including
    /// nulls) is incomparable.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => a.as_float()?.partial_cmp(&b.as_float()?),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Equality that treats `Int(1)` and `Float(1.0)` as the same value.
    pub fn loose_eq(&self, other: &Value) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return self.compare(other) == Some(Ordering::Equal);
        }
        if self.is_null() && other.is_null() {
            return true;
        }
        self == other
    }

    /// Builds a hashable key such that `a.loose_eq(b)` implies equal keys.
    ///
    /// Used for grouping duplicates. All nulls share one key.
    pub fn group_key(&self) -> String {
        match self {
            v if v.is_null() => "null:".to_string(),
            Value::Int(i) => format!("num:{}", i),
            Value::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => {
                format!("num:{}", *f as i64)
            }
            Value::Float(f) => format!("num:{}", f),
            Value::Bool(b) => format!("bool:{}", b),
            Value::Timestamp(ts) => format!("ts:{}", ts.format(TIMESTAMP_FORMAT)),
            Value::String(s) => format!("str:{}", s),
            other => format!("obj:{}", other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) if x.is_finite() && x.fract() == 0.0 && x.abs() < 1.0e16 => {
                write!(f, "{:.1}", x)
            }
            Value::Float(x) => write!(f, "{}", x),
            Value::Timestamp(ts) => write!(f, "{}", ts.format(TIMESTAMP_FORMAT)),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, item)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, item)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(ts: NaiveDateTime) -> Self {
        Value::Timestamp(ts)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
