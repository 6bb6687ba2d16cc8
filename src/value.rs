//! Dynamic value representation for config trees.
//!
//! This module provides the [`ConfigValue`] enum which represents any value a
//! config tree can hold, independently of the file format it came from.
//!
//! ## Core Types
//!
//! - [`ConfigValue`]: null marker, bool, number, string, list, nested tree, date-time, big integer
//! - [`Number`]: an integer or a floating-point number
//!
//! ## Null marker
//!
//! [`ConfigValue::Null`] is an explicit null stored in the tree. It is distinct
//! from an absent entry, which is represented by [`crate::Entry::Absent`] when
//! looking a path up.
//!
//! ## Usage Patterns
//!
//! ```rust
//! use cfgtree::{config, ConfigValue};
//!
//! let null = ConfigValue::Null;
//! let number = ConfigValue::from(42);
//! let text = ConfigValue::from("hello");
//!
//! let tree = config!({
//!     "name": "Alice",
//!     "age": 30
//! });
//! assert_eq!(tree.get("age"), Some(&ConfigValue::from(30)));
//! assert!(ConfigValue::Config(tree).is_config());
//! assert!(null.is_null());
//! assert!(number.is_number() && text.is_string());
//! ```

use crate::ConfigMap;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A dynamically-typed representation of any config tree value.
///
/// # Examples
///
/// ```rust
/// use cfgtree::{ConfigValue, Number};
///
/// let num = ConfigValue::Number(Number::Integer(42));
/// let text = ConfigValue::String("hello".to_string());
///
/// assert!(ConfigValue::Null.is_null());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, PartialEq, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<ConfigValue>),
    Config(ConfigMap),
    DateTime(DateTime<Utc>),
    BigInt(BigInt),
}

/// A numeric config value.
///
/// # Examples
///
/// ```rust
/// use cfgtree::Number;
///
/// let integer = Number::Integer(42);
/// let float = Number::Float(3.5);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(float.as_f64(), 3.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    /// Returns `true` if this is an integer value.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Returns `true` if this is a floating-point value.
    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Converts this number to an `i64` if possible.
    ///
    /// Floats convert only when they have no fractional part and fit in range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::Number;
    ///
    /// assert_eq!(Number::Integer(42).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// assert_eq!(Number::Float(f64::INFINITY).as_i64(), None);
/// assert_eq!(Number::Float(9_223_372_036_854_775_808.0).as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                // i64::MAX as f64 rounds up to 2^63, which is out of range
                if f.is_finite() && f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                {
                    Some(*f as i64)
                } else {
                    None
                }
            }
        }
    }

    /// Converts this number to an `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
        }
    }
}

impl ConfigValue {
    /// Returns `true` if the value is the null marker.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Returns `true` if the value is a boolean.
    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, ConfigValue::Bool(_))
    }

    /// Returns `true` if the value is a number.
    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, ConfigValue::Number(_))
    }

    /// Returns `true` if the value is a string.
    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, ConfigValue::String(_))
    }

    /// Returns `true` if the value is a list.
    #[inline]
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, ConfigValue::List(_))
    }

    /// Returns `true` if the value is a nested tree.
    #[inline]
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, ConfigValue::Config(_))
    }

    /// Returns `true` if the value is a date-time.
    #[inline]
    #[must_use]
    pub const fn is_date_time(&self) -> bool {
        matches!(self, ConfigValue::DateTime(_))
    }

    /// Returns `true` if the value is a big integer.
    #[inline]
    #[must_use]
    pub const fn is_bigint(&self) -> bool {
        matches!(self, ConfigValue::BigInt(_))
    }

    /// Returns `Some(true)` for zero-length strings, lists and trees,
    /// `Some(false)` for non-empty ones and `None` for values that have no
    /// notion of emptiness.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::ConfigValue;
    ///
    /// assert_eq!(ConfigValue::from("").is_empty(), Some(true));
    /// assert_eq!(ConfigValue::List(vec![]).is_empty(), Some(true));
    /// assert_eq!(ConfigValue::from(0).is_empty(), None);
    /// ```
    #[must_use]
    pub fn is_empty(&self) -> Option<bool> {
        match self {
            ConfigValue::String(s) => Some(s.is_empty()),
            ConfigValue::List(l) => Some(l.is_empty()),
            ConfigValue::Config(c) => Some(c.is_empty()),
            _ => None,
        }
    }

    /// A short name for the kind of value, used in error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Number(Number::Integer(_)) => "integer",
            ConfigValue::Number(Number::Float(_)) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::List(_) => "list",
            ConfigValue::Config(_) => "config",
            ConfigValue::DateTime(_) => "date-time",
            ConfigValue::BigInt(_) => "big integer",
        }
    }

    /// If the value is a boolean, returns it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// If the value is a string, returns a reference to it. Otherwise returns `None`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::ConfigValue;
    ///
    /// assert_eq!(ConfigValue::from("hello").as_str(), Some("hello"));
    /// assert_eq!(ConfigValue::from(42).as_str(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an integer or a whole-number float, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// If the value is a number, returns it as `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// If the value is a list, returns a reference to it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_list(&self) -> Option<&Vec<ConfigValue>> {
        match self {
            ConfigValue::List(list) => Some(list),
            _ => None,
        }
    }

    /// If the value is a nested tree, returns a reference to it. Otherwise returns `None`.
    #[inline]
    #[must_use]
    pub fn as_config(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Config(map) => Some(map),
            _ => None,
        }
    }

    /// If the value is a nested tree, returns a mutable reference to it.
    #[inline]
    pub fn as_config_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            ConfigValue::Config(map) => Some(map),
            _ => None,
        }
    }

    /// If the value is a date-time, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            ConfigValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// If the value is a big integer, returns a reference to it.
    #[inline]
    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            ConfigValue::BigInt(bi) => Some(bi),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Number(n) => write!(f, "{}", n),
            ConfigValue::String(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            ConfigValue::List(list) => {
                write!(
                    f,
                    "[{}]",
                    list.iter()
                        .map(|v| v.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            ConfigValue::Config(map) => {
                write!(
                    f,
                    "{{{}}}",
                    map.iter()
                        .map(|(k, v)| format!("{} = {}", k, v))
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
            ConfigValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            ConfigValue::BigInt(bi) => write!(f, "{}", bi),
        }
    }
}

impl Serialize for ConfigValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ConfigValue::Null => serializer.serialize_unit(),
            ConfigValue::Bool(b) => serializer.serialize_bool(*b),
            ConfigValue::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            ConfigValue::Number(Number::Float(f)) => serializer.serialize_f64(*f),
            ConfigValue::String(s) => serializer.serialize_str(s),
            ConfigValue::List(list) => {
                use serde::ser::SerializeSeq;
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for element in list {
                    seq.serialize_element(element)?;
                }
                seq.end()
            }
            ConfigValue::Config(map) => {
                use serde::ser::SerializeMap;
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            ConfigValue::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            ConfigValue::BigInt(bi) => serializer.serialize_str(&bi.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct ConfigValueVisitor;

        impl<'de> Visitor<'de> for ConfigValueVisitor {
            type Value = ConfigValue;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid config value")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E> {
                Ok(ConfigValue::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
                Ok(ConfigValue::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
                Ok(ConfigValue::from(value))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
                Ok(ConfigValue::Number(Number::Float(value)))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E> {
                Ok(ConfigValue::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E> {
                Ok(ConfigValue::String(value))
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E> {
                Ok(ConfigValue::Null)
            }

            fn visit_none<E>(self) -> Result<Self::Value, E> {
                Ok(ConfigValue::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut vec = Vec::new();
                while let Some(elem) = seq.next_element()? {
                    vec.push(elem);
                }
                Ok(ConfigValue::List(vec))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: de::MapAccess<'de>,
            {
                let mut values = ConfigMap::new();
                while let Some((key, value)) = map.next_entry()? {
                    values.insert(key, value);
                }
                Ok(ConfigValue::Config(values))
            }
        }

        deserializer.deserialize_any(ConfigValueVisitor)
    }
}

impl TryFrom<ConfigValue> for i64 {
    type Error = crate::Error;

    fn try_from(value: ConfigValue) -> crate::Result<Self> {
        match &value {
            ConfigValue::Number(n) => n
                .as_i64()
                .ok_or_else(|| crate::Error::conversion(format!("cannot convert {} to i64", n))),
            ConfigValue::BigInt(bi) => i64::try_from(bi)
                .map_err(|_| crate::Error::conversion(format!("{} is out of range for i64", bi))),
            _ => Err(crate::Error::conversion(format!(
                "expected integer, found {}",
                value
            ))),
        }
    }
}

impl TryFrom<ConfigValue> for f64 {
    type Error = crate::Error;

    fn try_from(value: ConfigValue) -> crate::Result<Self> {
        match value {
            ConfigValue::Number(n) => Ok(n.as_f64()),
            _ => Err(crate::Error::conversion(format!(
                "expected number, found {}",
                value
            ))),
        }
    }
}

impl TryFrom<ConfigValue> for bool {
    type Error = crate::Error;

    fn try_from(value: ConfigValue) -> crate::Result<Self> {
        match value {
            ConfigValue::Bool(b) => Ok(b),
            _ => Err(crate::Error::conversion(format!(
                "expected bool, found {}",
                value
            ))),
        }
    }
}

impl TryFrom<ConfigValue> for String {
    type Error = crate::Error;

    fn try_from(value: ConfigValue) -> crate::Result<Self> {
        match value {
            ConfigValue::String(s) => Ok(s),
            _ => Err(crate::Error::conversion(format!(
                "expected string, found {}",
                value
            ))),
        }
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConfigValue {
                fn from(value: $ty) -> Self {
                    ConfigValue::Number(Number::Integer(value as i64))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => ConfigValue::Number(Number::Integer(i)),
            Err(_) => ConfigValue::BigInt(BigInt::from(value)),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<f32> for ConfigValue {
    fn from(value: f32) -> Self {
        ConfigValue::Number(Number::Float(value as f64))
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Number(Number::Float(value))
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::List(value)
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        ConfigValue::Config(value)
    }
}

impl From<DateTime<Utc>> for ConfigValue {
    fn from(value: DateTime<Utc>) -> Self {
        ConfigValue::DateTime(value)
    }
}

impl From<BigInt> for ConfigValue {
    fn from(value: BigInt) -> Self {
        ConfigValue::BigInt(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn test_tryfrom_i64() {
        let value = ConfigValue::Number(Number::Integer(42));
        assert_eq!(i64::try_from(value).unwrap(), 42);

        let value = ConfigValue::Number(Number::Float(42.0));
        assert_eq!(i64::try_from(value).unwrap(), 42);

        let value = ConfigValue::BigInt(BigInt::from(7));
        assert_eq!(i64::try_from(value).unwrap(), 7);

        let value = ConfigValue::String("test".to_string());
        assert!(i64::try_from(value).is_err());
    }

    #[test]
    fn test_float_to_integer_bounds() {
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert_eq!(Number::Float(two_pow_63).as_i64(), None);
        assert!(i64::try_from(ConfigValue::from(two_pow_63)).is_err());
        assert_eq!(Number::Float(-two_pow_63).as_i64(), Some(i64::MIN));
    }

    #[test]
    fn test_tryfrom_f64() {
        let value = ConfigValue::Number(Number::Float(3.5));
        assert_eq!(f64::try_from(value).unwrap(), 3.5);

        let value = ConfigValue::Number(Number::Integer(42));
        assert_eq!(f64::try_from(value).unwrap(), 42.0);
    }

    #[test]
    fn test_tryfrom_bool_and_string() {
        assert!(bool::try_from(ConfigValue::Bool(true)).unwrap());
        assert!(bool::try_from(ConfigValue::from(1)).is_err());
        assert_eq!(String::try_from(ConfigValue::from("hi")).unwrap(), "hi");
        assert!(String::try_from(ConfigValue::Null).is_err());
    }

    #[test]
    fn test_large_u64_becomes_bigint() {
        assert_eq!(ConfigValue::from(7u64), ConfigValue::from(7i64));
        assert!(ConfigValue::from(u64::MAX).is_bigint());
    }

    #[test]
    fn test_emptiness() {
        assert_eq!(ConfigValue::from("").is_empty(), Some(true));
        assert_eq!(ConfigValue::from("x").is_empty(), Some(false));
        assert_eq!(ConfigValue::Config(ConfigMap::new()).is_empty(), Some(true));
        assert_eq!(ConfigValue::Null.is_empty(), None);
        assert_eq!(ConfigValue::Bool(false).is_empty(), None);
    }

    #[test]
    fn test_display() {
        let list = ConfigValue::List(vec![ConfigValue::from(1), ConfigValue::from("a")]);
        assert_eq!(list.to_string(), "[1, \"a\"]");
        assert_eq!(ConfigValue::Null.to_string(), "null");
    }

    #[test]
    fn test_serializes_through_serde_json() {
        let mut map = ConfigMap::new();
        map.insert("name".to_string(), ConfigValue::from("Alice"));
        map.insert("tags".to_string(), ConfigValue::List(vec![ConfigValue::from("a")]));
        map.insert("none".to_string(), ConfigValue::Null);
        let json = serde_json::to_value(ConfigValue::Config(map)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Alice", "tags": ["a"], "none": null})
        );

        let back: ConfigValue = serde_json::from_value(json).unwrap();
        assert_eq!(
            back.as_config().and_then(|m| m.get("name")),
            Some(&ConfigValue::from("Alice"))
        );
    }
}
