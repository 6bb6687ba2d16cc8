//! The converter registry.
//!
//! Converters sit between the native form of a member (see
//! [`ConfigType`](crate::ConfigType)) and the value stored in the tree. They are
//! selected by the value at hand and the member's [`TypeConstraint`]; the first
//! converter that accepts both wins.
//!
//! Lookup order is fixed: converters registered by the user come first, in
//! registration order, then the built-ins.
//!
//! Built-in serializers, in order:
//!
//! 1. [`NullSerializer`]: the native null becomes the null marker
//! 2. [`OptionalSerializer`]: unwraps `Option` constraints
//! 3. [`ListSerializer`]: converts each element
//! 4. [`TreeSerializer`]: converts map values, passes nested objects through
//! 5. [`ScalarSerializer`]: booleans, numbers, strings, date-times and big integers
//!
//! Built-in deserializers, in order:
//!
//! 1. [`NullDeserializer`]: "no value" becomes the native null
//! 2. [`OptionalDeserializer`]: unwraps `Option` targets
//! 3. [`NumberDeserializer`]: integer, float and big integer coercion
//! 4. [`DateTimeDeserializer`]: RFC 3339 strings into date-times
//! 5. [`ListDeserializer`]: converts each element
//! 6. [`TreeDeserializer`]: converts map values, passes nested objects through
//! 7. [`PassThroughDeserializer`]: anything the target already accepts
//!
//! ## Custom converters
//!
//! ```rust
//! use cfgtree::registry::{ConverterRegistry, ValueSerializer};
//! use cfgtree::{ConfigValue, Result, SerializerContext, Shape, TypeConstraint};
//!
//! /// Writes date-times as UNIX timestamps.
//! struct EpochSeconds;
//!
//! impl ValueSerializer for EpochSeconds {
//!     fn accepts(&self, value: &ConfigValue, _constraint: &TypeConstraint) -> bool {
//!         value.is_date_time()
//!     }
//!
//!     fn serialize(
//!         &self,
//!         value: ConfigValue,
//!         _constraint: &TypeConstraint,
//!         _ctx: &SerializerContext<'_>,
//!     ) -> Result<ConfigValue> {
//!         Ok(value
//!             .as_date_time()
//!             .map(|dt| ConfigValue::from(dt.timestamp()))
//!             .unwrap_or(value))
//!     }
//! }
//!
//! let mut registry = ConverterRegistry::new();
//! registry.register_serializer(EpochSeconds);
//! ```

use crate::{
    ConfigValue, DeserializerContext, Error, Number, Result, SerializerContext, Shape,
    TypeConstraint,
};
use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Converts a native value into the value stored in the tree.
pub trait ValueSerializer: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns `true` if this converter handles `value` declared as `constraint`.
    fn accepts(&self, value: &ConfigValue, constraint: &TypeConstraint) -> bool;

    /// Converts `value`.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the value cannot be represented.
    fn serialize(
        &self,
        value: ConfigValue,
        constraint: &TypeConstraint,
        ctx: &SerializerContext<'_>,
    ) -> Result<ConfigValue>;
}

/// Converts a tree value, or the absence of one, into the native form of
/// the target type.
///
/// `None` stands for "no value": the tree held the null marker.
pub trait ValueDeserializer: Send + Sync {
    /// A short name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Returns `true` if this converter can turn `value` into `target`.
    fn accepts(&self, value: Option<&ConfigValue>, target: &TypeConstraint) -> bool;

    /// Converts `value`.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the value does not fit the target.
    fn deserialize(
        &self,
        value: Option<ConfigValue>,
        target: &TypeConstraint,
        ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue>;
}

/// Ordered collections of serializers and deserializers.
#[derive(Clone)]
pub struct ConverterRegistry {
    serializers: Vec<Arc<dyn ValueSerializer>>,
    deserializers: Vec<Arc<dyn ValueDeserializer>>,
    builtin_serializers: Vec<Arc<dyn ValueSerializer>>,
    builtin_deserializers: Vec<Arc<dyn ValueDeserializer>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        ConverterRegistry {
            serializers: Vec::new(),
            deserializers: Vec::new(),
            builtin_serializers: vec![
                Arc::new(NullSerializer),
                Arc::new(OptionalSerializer),
                Arc::new(ListSerializer),
                Arc::new(TreeSerializer),
                Arc::new(ScalarSerializer),
            ],
            builtin_deserializers: vec![
                Arc::new(NullDeserializer),
                Arc::new(OptionalDeserializer),
                Arc::new(NumberDeserializer),
                Arc::new(DateTimeDeserializer),
                Arc::new(ListDeserializer),
                Arc::new(TreeDeserializer),
                Arc::new(PassThroughDeserializer),
            ],
        }
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field(
                "serializers",
                &self.serializers().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field(
                "deserializers",
                &self.deserializers().map(|d| d.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ConverterRegistry {
    /// Creates a registry holding the built-in converters only.
    #[must_use]
    pub fn new() -> Self {
        ConverterRegistry::default()
    }

    /// Adds a serializer, consulted before the built-ins and after the
    /// serializers registered earlier.
    pub fn register_serializer<S: ValueSerializer + 'static>(&mut self, serializer: S) -> &mut Self {
        self.serializers.push(Arc::new(serializer));
        self
    }

    /// Adds a deserializer, consulted before the built-ins and after the
    /// deserializers registered earlier.
    pub fn register_deserializer<D: ValueDeserializer + 'static>(
        &mut self,
        deserializer: D,
    ) -> &mut Self {
        self.deserializers.push(Arc::new(deserializer));
        self
    }

    /// All serializers, in lookup order.
    pub fn serializers(&self) -> impl Iterator<Item = &dyn ValueSerializer> {
        self.serializers
            .iter()
            .chain(&self.builtin_serializers)
            .map(|s| s.as_ref())
    }

    /// All deserializers, in lookup order.
    pub fn deserializers(&self) -> impl Iterator<Item = &dyn ValueDeserializer> {
        self.deserializers
            .iter()
            .chain(&self.builtin_deserializers)
            .map(|d| d.as_ref())
    }

    /// Finds the first serializer accepting `value` declared as `constraint`.
    ///
    /// # Errors
    ///
    /// Returns a conversion error naming the value and the type if none does.
    pub fn find_serializer(
        &self,
        value: &ConfigValue,
        constraint: &TypeConstraint,
    ) -> Result<&dyn ValueSerializer> {
        let found = self
            .serializers()
            .find(|s| s.accepts(value, constraint))
            .ok_or_else(|| {
                Error::conversion(format!(
                    "no serializer found for value `{}` of type {}",
                    value, constraint
                ))
            })?;
        trace!(converter = found.name(), target = %constraint, "selected serializer");
        Ok(found)
    }

    /// Finds the first deserializer able to turn `value` into `target`.
    ///
    /// # Errors
    ///
    /// Returns a conversion error naming the value and the type if none does.
    pub fn find_deserializer(
        &self,
        value: Option<&ConfigValue>,
        target: &TypeConstraint,
    ) -> Result<&dyn ValueDeserializer> {
        let found = self
            .deserializers()
            .find(|d| d.accepts(value, target))
            .ok_or_else(|| {
                Error::conversion(format!(
                    "no deserializer found for value `{}` into {}",
                    value.map_or_else(|| "null".to_string(), ConfigValue::to_string),
                    target
                ))
            })?;
        trace!(converter = found.name(), target = %target, "selected deserializer");
        Ok(found)
    }
}

fn element_of(constraint: &TypeConstraint) -> TypeConstraint {
    constraint
        .element()
        .cloned()
        .unwrap_or_else(TypeConstraint::any)
}

/// Maps the null marker found inside lists and trees to "no value".
fn present(value: ConfigValue) -> Option<ConfigValue> {
    match value {
        ConfigValue::Null => None,
        value => Some(value),
    }
}

pub struct NullSerializer;

impl ValueSerializer for NullSerializer {
    fn name(&self) -> &str {
        "null"
    }

    fn accepts(&self, value: &ConfigValue, _constraint: &TypeConstraint) -> bool {
        value.is_null()
    }

    fn serialize(
        &self,
        _value: ConfigValue,
        _constraint: &TypeConstraint,
        _ctx: &SerializerContext<'_>,
    ) -> Result<ConfigValue> {
        Ok(ConfigValue::Null)
    }
}

pub struct OptionalSerializer;

impl ValueSerializer for OptionalSerializer {
    fn name(&self) -> &str {
        "optional"
    }

    fn accepts(&self, _value: &ConfigValue, constraint: &TypeConstraint) -> bool {
        constraint.shape() == Shape::Optional
    }

    fn serialize(
        &self,
        value: ConfigValue,
        constraint: &TypeConstraint,
        ctx: &SerializerContext<'_>,
    ) -> Result<ConfigValue> {
        ctx.serialize_native(value, &element_of(constraint))
    }
}

pub struct ListSerializer;

impl ValueSerializer for ListSerializer {
    fn name(&self) -> &str {
        "list"
    }

    fn accepts(&self, value: &ConfigValue, _constraint: &TypeConstraint) -> bool {
        value.is_list()
    }

    fn serialize(
        &self,
        value: ConfigValue,
        constraint: &TypeConstraint,
        ctx: &SerializerContext<'_>,
    ) -> Result<ConfigValue> {
        let element = match constraint.shape() {
            Shape::List => element_of(constraint),
            _ => TypeConstraint::any(),
        };
        match value {
            ConfigValue::List(items) => items
                .into_iter()
                .map(|item| ctx.serialize_native(item, &element))
                .collect::<Result<Vec<_>>>()
                .map(ConfigValue::List),
            value => Ok(value),
        }
    }
}

pub struct TreeSerializer;

impl ValueSerializer for TreeSerializer {
    fn name(&self) -> &str {
        "tree"
    }

    fn accepts(&self, value: &ConfigValue, _constraint: &TypeConstraint) -> bool {
        value.is_config()
    }

    fn serialize(
        &self,
        value: ConfigValue,
        constraint: &TypeConstraint,
        ctx: &SerializerContext<'_>,
    ) -> Result<ConfigValue> {
        let element = match constraint.shape() {
            // already serialized by its own schema
            Shape::Object | Shape::Config => return Ok(value),
            Shape::Map => element_of(constraint),
            _ => TypeConstraint::any(),
        };
        match value {
            ConfigValue::Config(mut map) => {
                for item in map.values_mut() {
                    let native = std::mem::take(item);
                    *item = ctx.serialize_native(native, &element)?;
                }
                Ok(ConfigValue::Config(map))
            }
            value => Ok(value),
        }
    }
}

pub struct ScalarSerializer;

impl ValueSerializer for ScalarSerializer {
    fn name(&self) -> &str {
        "scalar"
    }

    fn accepts(&self, value: &ConfigValue, _constraint: &TypeConstraint) -> bool {
        matches!(
            value,
            ConfigValue::Bool(_)
                | ConfigValue::Number(_)
                | ConfigValue::String(_)
                | ConfigValue::DateTime(_)
                | ConfigValue::BigInt(_)
        )
    }

    fn serialize(
        &self,
        value: ConfigValue,
        _constraint: &TypeConstraint,
        _ctx: &SerializerContext<'_>,
    ) -> Result<ConfigValue> {
        Ok(value)
    }
}

pub struct NullDeserializer;

impl ValueDeserializer for NullDeserializer {
    fn name(&self) -> &str {
        "null"
    }

    fn accepts(&self, value: Option<&ConfigValue>, _target: &TypeConstraint) -> bool {
        value.is_none()
    }

    fn deserialize(
        &self,
        _value: Option<ConfigValue>,
        _target: &TypeConstraint,
        _ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue> {
        Ok(ConfigValue::Null)
    }
}

pub struct OptionalDeserializer;

impl ValueDeserializer for OptionalDeserializer {
    fn name(&self) -> &str {
        "optional"
    }

    fn accepts(&self, _value: Option<&ConfigValue>, target: &TypeConstraint) -> bool {
        target.shape() == Shape::Optional
    }

    fn deserialize(
        &self,
        value: Option<ConfigValue>,
        target: &TypeConstraint,
        ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue> {
        ctx.deserialize_native(value, &element_of(target))
    }
}

pub struct NumberDeserializer;

impl ValueDeserializer for NumberDeserializer {
    fn name(&self) -> &str {
        "number"
    }

    fn accepts(&self, value: Option<&ConfigValue>, target: &TypeConstraint) -> bool {
        matches!(
            value,
            Some(ConfigValue::Number(_) | ConfigValue::BigInt(_))
        ) && matches!(target.shape(), Shape::Integer | Shape::Float | Shape::BigInt)
    }

    fn deserialize(
        &self,
        value: Option<ConfigValue>,
        target: &TypeConstraint,
        _ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue> {
        let out_of_range = |v: String| {
            Error::conversion(format!("cannot convert number `{}` into {}", v, target))
        };
        let converted = match (target.shape(), value) {
            (Shape::Integer, Some(ConfigValue::Number(n))) => n
                .as_i64()
                .map(|i| ConfigValue::Number(Number::Integer(i)))
                .ok_or_else(|| out_of_range(n.to_string()))?,
            (Shape::Integer, Some(ConfigValue::BigInt(bi))) => i64::try_from(&bi)
                .map(|i| ConfigValue::Number(Number::Integer(i)))
                .map_err(|_| out_of_range(bi.to_string()))?,
            (Shape::Float, Some(ConfigValue::Number(n))) => {
                ConfigValue::Number(Number::Float(n.as_f64()))
            }
            (Shape::Float, Some(ConfigValue::BigInt(bi))) => {
                let parsed: f64 = bi.to_string().parse().map_err(|_| out_of_range(bi.to_string()))?;
                ConfigValue::Number(Number::Float(parsed))
            }
            (Shape::BigInt, Some(ConfigValue::Number(n))) => n
                .as_i64()
                .map(|i| ConfigValue::BigInt(BigInt::from(i)))
                .ok_or_else(|| out_of_range(n.to_string()))?,
            (_, Some(value)) => value,
            (_, None) => ConfigValue::Null,
        };
        Ok(converted)
    }
}

pub struct DateTimeDeserializer;

impl ValueDeserializer for DateTimeDeserializer {
    fn name(&self) -> &str {
        "date-time"
    }

    fn accepts(&self, value: Option<&ConfigValue>, target: &TypeConstraint) -> bool {
        target.shape() == Shape::DateTime
            && matches!(value, Some(ConfigValue::String(_) | ConfigValue::DateTime(_)))
    }

    fn deserialize(
        &self,
        value: Option<ConfigValue>,
        target: &TypeConstraint,
        _ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue> {
        match value {
            Some(ConfigValue::String(s)) => DateTime::parse_from_rfc3339(&s)
                .map(|dt| ConfigValue::DateTime(dt.with_timezone(&Utc)))
                .map_err(|e| {
                    Error::conversion(format!("cannot parse `{}` into {}: {}", s, target, e))
                }),
            Some(value) => Ok(value),
            None => Ok(ConfigValue::Null),
        }
    }
}

pub struct ListDeserializer;

impl ValueDeserializer for ListDeserializer {
    fn name(&self) -> &str {
        "list"
    }

    fn accepts(&self, value: Option<&ConfigValue>, target: &TypeConstraint) -> bool {
        matches!(value, Some(ConfigValue::List(_)))
            && matches!(target.shape(), Shape::List | Shape::Any)
    }

    fn deserialize(
        &self,
        value: Option<ConfigValue>,
        target: &TypeConstraint,
        ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue> {
        let element = element_of(target);
        match value {
            Some(ConfigValue::List(items)) => items
                .into_iter()
                .map(|item| ctx.deserialize_native(present(item), &element))
                .collect::<Result<Vec<_>>>()
                .map(ConfigValue::List),
            Some(value) => Ok(value),
            None => Ok(ConfigValue::Null),
        }
    }
}

pub struct TreeDeserializer;

impl ValueDeserializer for TreeDeserializer {
    fn name(&self) -> &str {
        "tree"
    }

    fn accepts(&self, value: Option<&ConfigValue>, target: &TypeConstraint) -> bool {
        matches!(value, Some(ConfigValue::Config(_)))
            && matches!(
                target.shape(),
                Shape::Map | Shape::Object | Shape::Config | Shape::Any
            )
    }

    fn deserialize(
        &self,
        value: Option<ConfigValue>,
        target: &TypeConstraint,
        ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue> {
        let element = match target.shape() {
            // objects deserialize their own members
            Shape::Object | Shape::Config => return Ok(value.unwrap_or_default()),
            _ => element_of(target),
        };
        match value {
            Some(ConfigValue::Config(mut map)) => {
                for item in map.values_mut() {
                    let raw = std::mem::take(item);
                    *item = ctx.deserialize_native(present(raw), &element)?;
                }
                Ok(ConfigValue::Config(map))
            }
            Some(value) => Ok(value),
            None => Ok(ConfigValue::Null),
        }
    }
}

pub struct PassThroughDeserializer;

impl ValueDeserializer for PassThroughDeserializer {
    fn name(&self) -> &str {
        "pass-through"
    }

    fn accepts(&self, value: Option<&ConfigValue>, target: &TypeConstraint) -> bool {
        value.map_or(false, |v| target.accepts(v))
    }

    fn deserialize(
        &self,
        value: Option<ConfigValue>,
        _target: &TypeConstraint,
        _ctx: &DeserializerContext<'_>,
    ) -> Result<ConfigValue> {
        Ok(value.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigMap, SerdeOptions};

    fn with_de<R>(f: impl FnOnce(&DeserializerContext<'_>) -> R) -> R {
        let options = SerdeOptions::default();
        let registry = ConverterRegistry::new();
        f(&DeserializerContext::new(&options, &registry))
    }

    fn with_ser<R>(f: impl FnOnce(&SerializerContext<'_>) -> R) -> R {
        let options = SerdeOptions::default();
        let registry = ConverterRegistry::new();
        f(&SerializerContext::new(&options, &registry))
    }

    #[test]
    fn test_builtin_order() {
        let registry = ConverterRegistry::new();
        let names: Vec<_> = registry.serializers().map(|s| s.name()).collect();
        assert_eq!(names, vec!["null", "optional", "list", "tree", "scalar"]);
        let names: Vec<_> = registry.deserializers().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec!["null", "optional", "number", "date-time", "list", "tree", "pass-through"]
        );
    }

    #[test]
    fn test_user_converters_come_first() {
        struct Upper;
        impl ValueSerializer for Upper {
            fn name(&self) -> &str {
                "upper"
            }
            fn accepts(&self, value: &ConfigValue, _c: &TypeConstraint) -> bool {
                value.is_string()
            }
            fn serialize(
                &self,
                value: ConfigValue,
                _c: &TypeConstraint,
                _ctx: &SerializerContext<'_>,
            ) -> Result<ConfigValue> {
                Ok(ConfigValue::from(value.as_str().unwrap_or_default().to_uppercase()))
            }
        }

        let mut registry = ConverterRegistry::new();
        registry.register_serializer(Upper);
        let c = TypeConstraint::of::<String>();
        let found = registry.find_serializer(&ConfigValue::from("a"), &c).unwrap();
        assert_eq!(found.name(), "upper");
        let found = registry.find_serializer(&ConfigValue::from(1), &c).unwrap();
        assert_eq!(found.name(), "scalar");
    }

    #[test]
    fn test_number_coercion() {
        with_de(|ctx| {
            let int = TypeConstraint::of::<i32>();
            assert_eq!(
                ctx.deserialize_native(Some(ConfigValue::from(4.0)), &int).unwrap(),
                ConfigValue::from(4)
            );
            assert!(ctx.deserialize_native(Some(ConfigValue::from(4.5)), &int).is_err());
            let long = TypeConstraint::of::<i64>();
            let err = ctx
                .deserialize_native(Some(ConfigValue::from(9_223_372_036_854_775_808.0)), &long)
                .unwrap_err();
            assert_eq!(err.kind(), crate::ErrorKind::Conversion);

            let float = TypeConstraint::of::<f64>();
            assert_eq!(
                ctx.deserialize_native(Some(ConfigValue::from(4)), &float).unwrap(),
                ConfigValue::from(4.0)
            );

            let big = TypeConstraint::of::<BigInt>();
            assert_eq!(
                ctx.deserialize_native(Some(ConfigValue::from(4)), &big).unwrap(),
                ConfigValue::BigInt(BigInt::from(4))
            );
        });
    }

    #[test]
    fn test_date_time_from_string() {
        with_de(|ctx| {
            let target = TypeConstraint::of::<DateTime<Utc>>();
            let value = ctx
                .deserialize_native(Some(ConfigValue::from("2024-05-01T10:00:00+02:00")), &target)
                .unwrap();
            assert_eq!(
                value.as_date_time().map(|dt| dt.to_rfc3339()),
                Some("2024-05-01T08:00:00+00:00".to_string())
            );
            assert!(ctx
                .deserialize_native(Some(ConfigValue::from("yesterday")), &target)
                .is_err());
        });
    }

    #[test]
    fn test_no_deserializer_names_value_and_type() {
        with_de(|ctx| {
            let err = ctx
                .deserialize_native(Some(ConfigValue::from("abc")), &TypeConstraint::of::<i32>())
                .unwrap_err();
            let msg = err.to_string();
            assert!(msg.contains("\"abc\""), "{}", msg);
            assert!(msg.contains("i32"), "{}", msg);
        });
    }

    #[test]
    fn test_null_elements_in_lists() {
        with_de(|ctx| {
            let target = TypeConstraint::of::<Vec<Option<i32>>>();
            let value = ConfigValue::List(vec![ConfigValue::Null, ConfigValue::from(2)]);
            assert_eq!(
                ctx.deserialize_native(Some(value.clone()), &target).unwrap(),
                value
            );
        });
    }

    #[test]
    fn test_tree_serializer_keeps_comments() {
        with_ser(|ctx| {
            let mut map = ConfigMap::new();
            map.insert("a".to_string(), ConfigValue::from(1));
            map.insert_comment("a", "first".to_string());
            let out = ctx
                .serialize_native(ConfigValue::Config(map), &TypeConstraint::any())
                .unwrap();
            assert_eq!(out.as_config().and_then(|m| m.comment("a")), Some("first"));
        });
    }
}
