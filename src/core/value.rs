//! Database value types
//!
//! Values flow in both directions: as bound statement arguments and as the cells
//! of decoded result rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Database value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatabaseValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 64-bit floating point
    Double(f64),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Timestamp (Unix timestamp in microseconds)
    Timestamp(i64),
}

impl DatabaseValue {
    /// Get the value as a boolean
    ///
    /// Integers must be 0 or 1. Text accepts `1`, `t`, `true` and `0`, `f`,
    /// `false` in lower, upper or title case.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DatabaseValue::Bool(v) => Some(*v),
            DatabaseValue::Int(v) => int_to_bool(*v as i64),
            DatabaseValue::Long(v) => int_to_bool(*v),
            DatabaseValue::String(_) | DatabaseValue::Bytes(_) => match self.as_str()?.trim() {
                "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
                "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the value as an i64
    ///
    /// Floats only convert when they carry no fractional part.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            DatabaseValue::Long(v) => Some(*v),
            DatabaseValue::Int(v) => Some(*v as i64),
            DatabaseValue::Double(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            DatabaseValue::String(_) | DatabaseValue::Bytes(_) => self.as_str()?.trim().parse().ok(),
            DatabaseValue::Bool(v) => Some(*v as i64),
            DatabaseValue::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            DatabaseValue::Double(v) => Some(*v),
            DatabaseValue::Int(v) => Some(*v as f64),
            DatabaseValue::Long(v) => Some(*v as f64),
            DatabaseValue::String(_) | DatabaseValue::Bytes(_) => self.as_str()?.trim().parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a string (zero-copy for String values)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s.as_str()),
            DatabaseValue::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Get the value as a string (with conversion)
    pub fn as_string(&self) -> String {
        match self {
            DatabaseValue::Null => "null".to_string(),
            DatabaseValue::Bool(v) => v.to_string(),
            DatabaseValue::Int(v) => v.to_string(),
            DatabaseValue::Long(v) => v.to_string(),
            DatabaseValue::Double(v) => v.to_string(),
            DatabaseValue::String(s) => s.clone(),
            DatabaseValue::Bytes(b) => format!("<{} bytes>", b.len()),
            DatabaseValue::Timestamp(v) => v.to_string(),
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            DatabaseValue::Null => "null",
            DatabaseValue::Bool(_) => "bool",
            DatabaseValue::Int(_) => "int",
            DatabaseValue::Long(_) => "long",
            DatabaseValue::Double(_) => "double",
            DatabaseValue::String(_) => "string",
            DatabaseValue::Bytes(_) => "bytes",
            DatabaseValue::Timestamp(_) => "timestamp",
        }
    }

    /// Short description used in decode errors, e.g. `string 'abc'`
    pub(crate) fn describe(&self) -> String {
        match self {
            DatabaseValue::String(s) => format!("string '{}'", s),
            DatabaseValue::Bytes(b) => format!("bytes ({} bytes)", b.len()),
            DatabaseValue::Null => "null".to_string(),
            other => format!("{} {}", other.type_name(), other.as_string()),
        }
    }
}

fn int_to_bool(v: i64) -> Option<bool> {
    match v {
        0 => Some(false),
        1 => Some(true),
        _ => None,
    }
}

impl From<bool> for DatabaseValue {
    fn from(v: bool) -> Self {
        DatabaseValue::Bool(v)
    }
}

impl From<i32> for DatabaseValue {
    fn from(v: i32) -> Self {
        DatabaseValue::Int(v)
    }
}

impl From<i64> for DatabaseValue {
    fn from(v: i64) -> Self {
        DatabaseValue::Long(v)
    }
}

impl From<f64> for DatabaseValue {
    fn from(v: f64) -> Self {
        DatabaseValue::Double(v)
    }
}

impl From<String> for DatabaseValue {
    fn from(v: String) -> Self {
        DatabaseValue::String(v)
    }
}

impl From<&str> for DatabaseValue {
    fn from(v: &str) -> Self {
        DatabaseValue::String(v.to_string())
    }
}

impl From<&String> for DatabaseValue {
    fn from(v: &String) -> Self {
        DatabaseValue::String(v.clone())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(v: Vec<u8>) -> Self {
        DatabaseValue::Bytes(v)
    }
}

impl From<DateTime<Utc>> for DatabaseValue {
    fn from(v: DateTime<Utc>) -> Self {
        DatabaseValue::Timestamp(v.timestamp_micros())
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// A row of database results (column name -> value mapping)
pub type DatabaseRow = HashMap<String, DatabaseValue>;

/// Multiple rows returned from a query
pub type DatabaseResult = Vec<DatabaseRow>;
