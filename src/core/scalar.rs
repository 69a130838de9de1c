//! NULL-tolerant scalar adapters
//!
//! Each `Safe*` type wraps one scalar kind and decodes NULL as that kind's zero
//! value, so record types can hold plain values for nullable columns. Values that
//! are present but cannot be coerced still fail with [`DatabaseError::Decode`].

use super::error::{DatabaseError, Result};
use super::value::DatabaseValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Conversion from a driver value into a typed field
pub trait Decode: Sized {
    /// Decode `value`, failing only when it cannot be represented as `Self`
    fn decode(value: &DatabaseValue) -> Result<Self>;
}

macro_rules! safe_scalar {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, PartialOrd, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Wrap a value
            pub fn new(value: impl Into<$inner>) -> Self {
                Self(value.into())
            }

            /// Unwrap the value
            pub fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl Deref for $name {
            type Target = $inner;

            fn deref(&self) -> &$inner {
                &self.0
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

safe_scalar!(
    /// Text column that reads NULL as the empty string
    SafeString(String)
);
safe_scalar!(
    /// Floating-point column that reads NULL as `0.0`
    SafeFloat(f64)
);
safe_scalar!(
    /// Integer column that reads NULL as `0`
    ///
    /// Also deserializes from JSON `null`, numbers, and quoted numerals.
    SafeInt(i64)
);
safe_scalar!(
    /// Boolean column that reads NULL as `false`
    SafeBool(bool)
);
safe_scalar!(
    /// Timestamp column stored as Unix seconds; NULL reads as `0`
    SafeTime(i64)
);

impl Eq for SafeString {}
impl Eq for SafeInt {}
impl Eq for SafeBool {}
impl Eq for SafeTime {}

impl Copy for SafeFloat {}
impl Copy for SafeInt {}
impl Copy for SafeBool {}
impl Copy for SafeTime {}

impl SafeString {
    /// Borrow the text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SafeString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl SafeTime {
    /// Convert to a UTC datetime, `None` when out of chrono's range
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    /// Whether the timestamp holds the zero time
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<DateTime<Utc>> for SafeTime {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp())
    }
}

impl Decode for SafeString {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Ok(Self::default()),
            DatabaseValue::String(s) => Ok(Self(s.clone())),
            DatabaseValue::Bytes(b) => String::from_utf8(b.clone())
                .map(Self)
                .map_err(|_| DatabaseError::decode("string", value.describe())),
            other => Ok(Self(other.as_string())),
        }
    }
}

impl Decode for SafeFloat {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        value
            .as_double()
            .map(Self)
            .ok_or_else(|| DatabaseError::decode("f64", value.describe()))
    }
}

impl Decode for SafeInt {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Ok(Self::default()),
            DatabaseValue::String(s) => s.parse(),
            DatabaseValue::Bytes(_) => value
                .as_str()
                .ok_or_else(|| DatabaseError::decode("i64", value.describe()))?
                .parse(),
            DatabaseValue::Timestamp(_) => Err(DatabaseError::decode("i64", value.describe())),
            other => other
                .as_long()
                .map(Self)
                .ok_or_else(|| DatabaseError::decode("i64", other.describe())),
        }
    }
}

/// Textual form: `null` is zero, surrounding double quotes are stripped, the rest
/// must be a base-10 integer.
impl FromStr for SafeInt {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed == "null" {
            return Ok(Self::default());
        }
        let unquoted = trimmed
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(trimmed);
        unquoted
            .parse::<i64>()
            .map(Self)
            .map_err(|_| DatabaseError::decode("i64", format!("string '{}'", s)))
    }
}

impl<'de> Deserialize<'de> for SafeInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SafeIntVisitor;

        impl<'de> de::Visitor<'de> for SafeIntVisitor {
            type Value = SafeInt;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer, a quoted integer, or null")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<SafeInt, E> {
                Ok(SafeInt(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<SafeInt, E> {
                i64::try_from(v)
                    .map(SafeInt)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<SafeInt, E> {
                v.parse()
                    .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<SafeInt, E> {
                Ok(SafeInt::default())
            }

            fn visit_none<E: de::Error>(self) -> std::result::Result<SafeInt, E> {
                Ok(SafeInt::default())
            }

            fn visit_some<D: Deserializer<'de>>(
                self,
                deserializer: D,
            ) -> std::result::Result<SafeInt, D::Error> {
                deserializer.deserialize_any(self)
            }
        }

        deserializer.deserialize_any(SafeIntVisitor)
    }
}

macro_rules! transparent_deserialize {
    ($($name:ident($inner:ty)),*) => {$(
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                <$inner>::deserialize(deserializer).map(Self)
            }
        }
    )*};
}

transparent_deserialize!(
    SafeString(String),
    SafeFloat(f64),
    SafeBool(bool),
    SafeTime(i64)
);

impl Decode for SafeBool {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        value
            .as_bool()
            .map(Self)
            .ok_or_else(|| DatabaseError::decode("bool", value.describe()))
    }
}

impl Decode for SafeTime {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Ok(Self::default()),
            DatabaseValue::Timestamp(micros) => Ok(Self(micros.div_euclid(1_000_000))),
            DatabaseValue::Int(secs) => Ok(Self(*secs as i64)),
            DatabaseValue::Long(secs) => Ok(Self(*secs)),
            DatabaseValue::String(_) | DatabaseValue::Bytes(_) => value
                .as_str()
                .and_then(parse_time)
                .map(Self)
                .ok_or_else(|| DatabaseError::decode("timestamp", value.describe())),
            other => Err(DatabaseError::decode("timestamp", other.describe())),
        }
    }
}

/// Parse RFC 3339 or `YYYY-MM-DD[ HH:MM:SS[.f]]` (UTC) into Unix seconds.
/// The MySQL zero date maps to 0.
fn parse_time(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.starts_with("0000-00-00") {
        return Some(0);
    }
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.timestamp());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(text, format) {
            return Some(at.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|at| at.and_utc().timestamp())
}

impl Decode for String {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Err(DatabaseError::decode("string", "null")),
            _ => SafeString::decode(value).map(SafeString::into_inner),
        }
    }
}

impl Decode for i64 {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Err(DatabaseError::decode("i64", "null")),
            _ => SafeInt::decode(value).map(SafeInt::into_inner),
        }
    }
}

impl Decode for i32 {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        let wide = i64::decode(value)?;
        i32::try_from(wide).map_err(|_| DatabaseError::decode("i32", value.describe()))
    }
}

impl Decode for f64 {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Err(DatabaseError::decode("f64", "null")),
            _ => SafeFloat::decode(value).map(SafeFloat::into_inner),
        }
    }
}

impl Decode for bool {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Err(DatabaseError::decode("bool", "null")),
            _ => SafeBool::decode(value).map(SafeBool::into_inner),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(value: &DatabaseValue) -> Result<Self> {
        match value {
            DatabaseValue::Null => Ok(None),
            _ => T::decode(value).map(Some),
        }
    }
}

impl From<SafeString> for DatabaseValue {
    fn from(v: SafeString) -> Self {
        DatabaseValue::String(v.0)
    }
}

impl From<&SafeString> for DatabaseValue {
    fn from(v: &SafeString) -> Self {
        DatabaseValue::String(v.0.clone())
    }
}

impl From<SafeFloat> for DatabaseValue {
    fn from(v: SafeFloat) -> Self {
        DatabaseValue::Double(v.0)
    }
}

impl From<SafeInt> for DatabaseValue {
    fn from(v: SafeInt) -> Self {
        DatabaseValue::Long(v.0)
    }
}

impl From<SafeBool> for DatabaseValue {
    fn from(v: SafeBool) -> Self {
        DatabaseValue::Bool(v.0)
    }
}

/// Bound as Unix seconds, the same unit the column is read back in.
impl From<SafeTime> for DatabaseValue {
    fn from(v: SafeTime) -> Self {
        DatabaseValue::Long(v.0)
    }
}
