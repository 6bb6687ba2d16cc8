//! Member types understood by the object mapper.
//!
//! Every member registered in a [`Schema`](crate::Schema) has a type implementing
//! [`ConfigType`]. The trait ties a Rust type to its [`TypeConstraint`] and to
//! its *native* form: the [`ConfigValue`] the converter registry works on.
//!
//! Implementations are provided for the primitives, `String`, `char`,
//! `Option<T>`, `Vec<T>`, string-keyed `HashMap`/`BTreeMap`/`IndexMap`,
//! `DateTime<Utc>`, `BigInt`, [`ConfigValue`] and [`ConfigMap`]. Schema-backed
//! objects get theirs from [`impl_config_type!`](crate::impl_config_type), and
//! any serde type can be used through the [`Serde`] wrapper.

use crate::{
    ConfigMap, ConfigValue, DeserializerContext, Error, Number, Result, SerializerContext, Shape,
    TypeConstraint,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::{Deref, DerefMut};

/// A Rust type that can be stored in a config tree.
///
/// `to_native` and `from_native` convert between the value and its native
/// form. They do not run converters themselves; the contexts do that around
/// them, using [`ConfigType::type_constraint`] to pick one.
pub trait ConfigType: Sized + fmt::Debug + 'static {
    /// Describes the declared type.
    fn type_constraint() -> TypeConstraint;

    /// Produces the native form of the value.
    ///
    /// # Errors
    ///
    /// Returns an error if a nested object fails to serialize.
    fn to_native(&self, ctx: &SerializerContext<'_>) -> Result<ConfigValue>;

    /// Builds a value from its native form. The value has already been
    /// checked against [`ConfigType::type_constraint`].
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the value does not fit the type.
    fn from_native(value: ConfigValue, ctx: &DeserializerContext<'_>) -> Result<Self>;

    /// Returns `true` if the value is the native null (`None`).
    fn is_null(&self) -> bool {
        false
    }

    /// Returns whether the value is empty, or `None` if the type has no
    /// notion of emptiness.
    fn is_empty(&self) -> Option<bool> {
        None
    }
}

/// The type name without module paths, e.g. `Vec<String>` or `Server`.
pub(crate) fn type_name_of<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn mismatch<T: ?Sized>(value: &ConfigValue) -> Error {
    Error::conversion(format!(
        "cannot convert {} `{}` into {}",
        value.kind_name(),
        value,
        type_name_of::<T>()
    ))
}

macro_rules! integer_type {
    ($($ty:ty),*) => {
        $(
            impl ConfigType for $ty {
                fn type_constraint() -> TypeConstraint {
                    TypeConstraint::new(Shape::Integer, stringify!($ty))
                }

                fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
                    Ok(ConfigValue::from(*self))
                }

                fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
                    let wide = i64::try_from(value)?;
                    <$ty>::try_from(wide).map_err(|_| {
                        Error::conversion(format!("{} is out of range for {}", wide, stringify!($ty)))
                    })
                }
            }
        )*
    };
}

integer_type!(i8, i16, i32, i64, u8, u16, u32);

impl ConfigType for isize {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Integer, "isize")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::from(*self as i64))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        let wide = i64::try_from(value)?;
        isize::try_from(wide)
            .map_err(|_| Error::conversion(format!("{} is out of range for isize", wide)))
    }
}

// u64 and usize go beyond i64, so their native form may be a big integer.
impl ConfigType for u64 {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::BigInt, "u64")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::from(*self))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        fn out_of_range(v: impl fmt::Display) -> Error {
            Error::conversion(format!("{} is out of range for u64", v))
        }
        match &value {
            ConfigValue::Number(Number::Integer(i)) => {
                u64::try_from(*i).map_err(|_| out_of_range(i))
            }
            ConfigValue::BigInt(bi) => u64::try_from(bi).map_err(|_| out_of_range(bi)),
            _ => Err(mismatch::<u64>(&value)),
        }
    }
}

impl ConfigType for usize {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::BigInt, "usize")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::from(*self as u64))
    }

    fn from_native(value: ConfigValue, ctx: &DeserializerContext<'_>) -> Result<Self> {
        let wide = u64::from_native(value, ctx)?;
        usize::try_from(wide)
            .map_err(|_| Error::conversion(format!("{} is out of range for usize", wide)))
    }
}

impl ConfigType for f64 {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Float, "f64")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::from(*self))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        f64::try_from(value)
    }
}

impl ConfigType for f32 {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Float, "f32")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::from(*self))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        f64::try_from(value).map(|f| f as f32)
    }
}

impl ConfigType for bool {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Bool, "bool")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::Bool(*self))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        bool::try_from(value)
    }
}

impl ConfigType for char {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Char, "char")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::String(self.to_string()))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        if let Some(s) = value.as_str() {
            let mut chars = s.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                return Ok(c);
            }
        }
        Err(mismatch::<char>(&value))
    }
}

impl ConfigType for String {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::String, "String")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::String(self.clone()))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        String::try_from(value)
    }

    fn is_empty(&self) -> Option<bool> {
        Some(String::is_empty(self))
    }
}

impl<T: ConfigType> ConfigType for Option<T> {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Optional, type_name_of::<Self>())
            .with_argument(T::type_constraint())
    }

    fn to_native(&self, ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        match self {
            Some(value) => value.to_native(ctx),
            None => Ok(ConfigValue::Null),
        }
    }

    fn from_native(value: ConfigValue, ctx: &DeserializerContext<'_>) -> Result<Self> {
        match value {
            ConfigValue::Null => Ok(None),
            value => T::from_native(value, ctx).map(Some),
        }
    }

    fn is_null(&self) -> bool {
        self.is_none()
    }

    /// `None` is null, not empty.
    fn is_empty(&self) -> Option<bool> {
        self.as_ref().and_then(ConfigType::is_empty)
    }
}

impl<T: ConfigType> ConfigType for Vec<T> {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::List, type_name_of::<Self>()).with_argument(T::type_constraint())
    }

    fn to_native(&self, ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        self.iter()
            .map(|item| item.to_native(ctx))
            .collect::<Result<Vec<_>>>()
            .map(ConfigValue::List)
    }

    fn from_native(value: ConfigValue, ctx: &DeserializerContext<'_>) -> Result<Self> {
        match value {
            ConfigValue::List(items) => items
                .into_iter()
                .map(|item| T::from_native(item, ctx))
                .collect(),
            value => Err(mismatch::<Self>(&value)),
        }
    }

    fn is_empty(&self) -> Option<bool> {
        Some(Vec::is_empty(self))
    }
}

macro_rules! map_type {
    ($($map:ident),*) => {
        $(
            impl<T: ConfigType> ConfigType for $map<String, T> {
                fn type_constraint() -> TypeConstraint {
                    TypeConstraint::new(Shape::Map, type_name_of::<Self>())
                        .with_argument(T::type_constraint())
                }

                fn to_native(&self, ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
                    let mut map = ConfigMap::with_capacity(self.len());
                    for (key, value) in self {
                        map.insert(key.clone(), value.to_native(ctx)?);
                    }
                    Ok(ConfigValue::Config(map))
                }

                fn from_native(value: ConfigValue, ctx: &DeserializerContext<'_>) -> Result<Self> {
                    match value {
                        ConfigValue::Config(map) => map
                            .into_iter()
                            .map(|(key, value)| Ok((key, T::from_native(value, ctx)?)))
                            .collect(),
                        value => Err(mismatch::<Self>(&value)),
                    }
                }

                fn is_empty(&self) -> Option<bool> {
                    Some(self.len() == 0)
                }
            }
        )*
    };
}

map_type!(HashMap, BTreeMap, IndexMap);

impl ConfigType for DateTime<Utc> {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::DateTime, "DateTime<Utc>")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::DateTime(*self))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        match value {
            ConfigValue::DateTime(dt) => Ok(dt),
            value => Err(mismatch::<Self>(&value)),
        }
    }
}

impl ConfigType for BigInt {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::BigInt, "BigInt")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::BigInt(self.clone()))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        match value {
            ConfigValue::BigInt(bi) => Ok(bi),
            ConfigValue::Number(Number::Integer(i)) => Ok(BigInt::from(i)),
            value => Err(mismatch::<Self>(&value)),
        }
    }
}

impl ConfigType for ConfigValue {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::any()
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(self.clone())
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        Ok(value)
    }

    fn is_null(&self) -> bool {
        ConfigValue::is_null(self)
    }

    fn is_empty(&self) -> Option<bool> {
        ConfigValue::is_empty(self)
    }
}

impl ConfigType for ConfigMap {
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Config, "ConfigMap")
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        Ok(ConfigValue::Config(self.clone()))
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        match value {
            ConfigValue::Config(map) => Ok(map),
            value => Err(mismatch::<Self>(&value)),
        }
    }

    fn is_empty(&self) -> Option<bool> {
        Some(ConfigMap::is_empty(self))
    }
}

/// Stores any serde type as a member, going through [`crate::to_value`] and
/// [`crate::from_value`].
///
/// # Examples
///
/// ```rust
/// use cfgtree::{ConfigObject, Schema, Serde};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
/// enum Level { #[default] Info, Debug }
///
/// #[derive(Debug, Default)]
/// struct Logging { level: Serde<Level> }
///
/// impl ConfigObject for Logging {
///     fn schema() -> Schema<Self> {
///         Schema::builder()
///             .field("level", |l: &Logging| &l.level, |l: &mut Logging| &mut l.level)
///             .build()
///     }
/// }
///
/// let tree = cfgtree::serialize_fields(&Logging { level: Serde(Level::Debug) }).unwrap();
/// assert_eq!(tree.get("level").and_then(|v| v.as_str()), Some("Debug"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Serde<T>(pub T);

impl<T> Serde<T> {
    /// Unwraps the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Serde<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Serde<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T> From<T> for Serde<T> {
    fn from(value: T) -> Self {
        Serde(value)
    }
}

impl<T> ConfigType for Serde<T>
where
    T: Serialize + DeserializeOwned + fmt::Debug + 'static,
{
    fn type_constraint() -> TypeConstraint {
        TypeConstraint::new(Shape::Any, type_name_of::<T>())
    }

    fn to_native(&self, _ctx: &SerializerContext<'_>) -> Result<ConfigValue> {
        crate::to_value(&self.0)
    }

    fn from_native(value: ConfigValue, _ctx: &DeserializerContext<'_>) -> Result<Self> {
        crate::from_value(value).map(Serde)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_name_strips_paths() {
        assert_eq!(type_name_of::<Vec<String>>(), "Vec<String>");
        assert_eq!(
            type_name_of::<HashMap<String, Option<i32>>>(),
            "HashMap<String, Option<i32>>"
        );
        assert_eq!(type_name_of::<u8>(), "u8");
    }

    #[test]
    fn test_option_emptiness() {
        assert_eq!(ConfigType::is_empty(&None::<String>), None);
        assert_eq!(ConfigType::is_empty(&Some(String::new())), Some(true));
        assert_eq!(ConfigType::is_empty(&Some("x".to_string())), Some(false));
        assert_eq!(ConfigType::is_empty(&Some(3)), None);
        assert!(ConfigType::is_null(&None::<i32>));
    }

    #[test]
    fn test_u64_is_wide() {
        assert_eq!(u64::type_constraint().shape(), Shape::BigInt);
        assert!(u64::type_constraint().accepts(&ConfigValue::from(u64::MAX)));
        assert!(u64::type_constraint().accepts(&ConfigValue::from(1)));
    }
}
