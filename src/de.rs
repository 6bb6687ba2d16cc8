//! Config tree to object deserialization.
//!
//! This module provides the [`DeserializerContext`], which reads the members
//! of a [`ConfigObject`] back from a [`Config`] tree, and the
//! [`ObjectDeserializer`] front end.
//!
//! ## Overview
//!
//! For every member, in schema order, the context:
//!
//! 1. ignores transient members while the transient modifier is on
//! 2. looks the resolved key up, keeping "absent" and "null" apart
//! 3. applies skip rules; a skipped member keeps its current value
//! 4. assigns a default when one is triggered, bypassing the converters
//! 5. otherwise converts the entry, checks it against the member type and
//!    assigns it after the assertions hold
//!
//! An absent entry without a default is a
//! [`MissingEntry`](crate::Error::MissingEntry) error.
//!
//! ## Usage
//!
//! ```rust
//! use cfgtree::{config, ConfigObject, ObjectDeserializer, Schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Pool {
//!     size: u16,
//!     name: Option<String>,
//! }
//!
//! impl ConfigObject for Pool {
//!     fn schema() -> Schema<Self> {
//!         Schema::builder()
//!             .field("size", |p: &Pool| &p.size, |p: &mut Pool| &mut p.size)
//!             .field("name", |p: &Pool| &p.name, |p: &mut Pool| &mut p.name)
//!             .build()
//!     }
//! }
//!
//! let tree = config!({ "size": 4, "name": null });
//! let pool: Pool = ObjectDeserializer::new().deserialize_new(&tree).unwrap();
//! assert_eq!(pool, Pool { size: 4, name: None });
//! ```
//!
//! ## Serde bridge
//!
//! [`ConfigValueDeserializer`] reads any `Deserialize` type from a
//! [`ConfigValue`]. It backs [`from_value`](crate::from_value) and the
//! [`Serde`](crate::Serde) member wrapper.

use crate::config::Config;
use crate::naming::NamingStrategy;
use crate::registry::{ConverterRegistry, ValueDeserializer};
use crate::{
    ConfigMap, ConfigObject, ConfigType, ConfigValue, Error, Number, Result, SerdeOptions,
    TypeConstraint,
};
use num_bigint::BigInt;
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::forward_to_deserialize_any;
use tracing::debug;

/// The state shared by every member deserialization of one call.
#[derive(Clone, Copy, Debug)]
pub struct DeserializerContext<'a> {
    options: &'a SerdeOptions,
    registry: &'a ConverterRegistry,
}

impl<'a> DeserializerContext<'a> {
    #[must_use]
    pub fn new(options: &'a SerdeOptions, registry: &'a ConverterRegistry) -> Self {
        DeserializerContext { options, registry }
    }

    #[must_use]
    pub fn options(&self) -> &'a SerdeOptions {
        self.options
    }

    #[must_use]
    pub fn registry(&self) -> &'a ConverterRegistry {
        self.registry
    }

    #[must_use]
    pub fn naming_strategy(&self) -> &'a dyn NamingStrategy {
        self.options.naming_strategy()
    }

    /// Converts a tree value, or "no value", into the native form of `target`
    /// using the first deserializer of the registry that accepts it.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if no deserializer accepts the value, or the
    /// selected one fails.
    pub fn deserialize_native(
        &self,
        value: Option<ConfigValue>,
        target: &TypeConstraint,
    ) -> Result<ConfigValue> {
        let deserializer = self.registry.find_deserializer(value.as_ref(), target)?;
        deserializer.deserialize(value, target, self)
    }

    /// Converts a tree value, or "no value", into a member value of type `F`.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the value cannot be converted, or the
    /// converted value does not have the shape of `F`.
    pub fn deserialize_value<F: ConfigType>(&self, value: Option<ConfigValue>) -> Result<F> {
        let target = F::type_constraint();
        let native = self.deserialize_native(value, &target)?;
        if !target.accepts(&native) {
            return Err(Error::conversion(format!(
                "converted value `{}` ({}) is not a valid {}",
                native,
                native.kind_name(),
                target
            )));
        }
        F::from_native(native, self)
    }

    /// Reads a fresh `T` from `source`, starting from `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member.
    pub fn deserialize_object<T: ConfigObject + Default>(&self, source: &dyn Config) -> Result<T> {
        let mut object = T::default();
        self.deserialize_fields(source, &mut object)?;
        Ok(object)
    }

    /// Reads the members of `dest` from `source`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member. Members processed before
    /// the failure keep their new values.
    pub fn deserialize_fields<T: ConfigObject>(&self, source: &dyn Config, dest: &mut T) -> Result<()> {
        let schema = T::schema();
        debug!(type_name = schema.type_name(), members = schema.len(), "deserializing object");
        for member in schema.members() {
            if self.options.apply_transient_modifier && member.is_transient() {
                debug!(field = member.name(), "ignoring transient field");
                continue;
            }
            member.deserialize(source, dest, schema.table(), self)?;
        }
        Ok(())
    }
}

/// Deserializes objects with a fixed set of options and converters.
///
/// # Examples
///
/// ```rust
/// use cfgtree::naming::SnakeCase;
/// use cfgtree::ObjectDeserializer;
///
/// let deserializer = ObjectDeserializer::builder().with_naming_strategy(SnakeCase);
/// assert_eq!(
///     deserializer.options().naming_strategy().transform_name("idleTimeout"),
///     "idle_timeout"
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct ObjectDeserializer {
    options: SerdeOptions,
    registry: ConverterRegistry,
}

impl ObjectDeserializer {
    /// Creates a deserializer with default options and the built-in converters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of [`ObjectDeserializer::new`], reads better in builder chains.
    #[must_use]
    pub fn builder() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(mut self, options: SerdeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_naming_strategy<N: NamingStrategy + 'static>(mut self, strategy: N) -> Self {
        self.options = self.options.with_naming_strategy(strategy);
        self
    }

    #[must_use]
    pub fn apply_transient_modifier(mut self, apply: bool) -> Self {
        self.options = self.options.with_transient_modifier(apply);
        self
    }

    /// Registers a deserializer, consulted before the built-ins.
    #[must_use]
    pub fn with_deserializer<D: ValueDeserializer + 'static>(mut self, deserializer: D) -> Self {
        self.registry.register_deserializer(deserializer);
        self
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ConverterRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn options(&self) -> &SerdeOptions {
        &self.options
    }

    #[must_use]
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    fn context(&self) -> DeserializerContext<'_> {
        DeserializerContext::new(&self.options, &self.registry)
    }

    /// Reads the members of an existing object from `source`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member.
    pub fn deserialize_fields<T: ConfigObject>(&self, source: &dyn Config, dest: &mut T) -> Result<()> {
        self.context().deserialize_fields(source, dest)
    }

    /// Reads a fresh object, starting from `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member.
    pub fn deserialize_new<T: ConfigObject + Default>(&self, source: &dyn Config) -> Result<T> {
        self.context().deserialize_object(source)
    }

    /// Reads a fresh object, starting from the instance `supplier` returns.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member.
    pub fn deserialize_with<T, S>(&self, source: &dyn Config, supplier: S) -> Result<T>
    where
        T: ConfigObject,
        S: FnOnce() -> T,
    {
        let mut object = supplier();
        self.context().deserialize_fields(source, &mut object)?;
        Ok(object)
    }

    /// Converts a single tree value. The null marker stands for "no value".
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the value does not fit `F`.
    pub fn deserialize_value<F: ConfigType>(&self, value: ConfigValue) -> Result<F> {
        let value = match value {
            ConfigValue::Null => None,
            value => Some(value),
        };
        self.context().deserialize_value(value)
    }
}

/// A serde deserializer reading from an owned [`ConfigValue`].
///
/// Date-times are offered as RFC 3339 strings and big integers as the
/// narrowest integer type that holds them, else as decimal strings.
pub struct ConfigValueDeserializer {
    value: ConfigValue,
}

impl ConfigValueDeserializer {
    #[must_use]
    pub fn new(value: ConfigValue) -> Self {
        ConfigValueDeserializer { value }
    }
}

impl<'de> IntoDeserializer<'de, Error> for ConfigValue {
    type Deserializer = ConfigValueDeserializer;

    fn into_deserializer(self) -> ConfigValueDeserializer {
        ConfigValueDeserializer::new(self)
    }
}

fn visit_bigint<'de, V>(bi: BigInt, visitor: V) -> Result<V::Value>
where
    V: de::Visitor<'de>,
{
    if let Ok(u) = u64::try_from(&bi) {
        visitor.visit_u64(u)
    } else if let Ok(i) = i128::try_from(&bi) {
        visitor.visit_i128(i)
    } else if let Ok(u) = u128::try_from(&bi) {
        visitor.visit_u128(u)
    } else {
        visitor.visit_string(bi.to_string())
    }
}

impl<'de> de::Deserializer<'de> for ConfigValueDeserializer {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            ConfigValue::Null => visitor.visit_unit(),
            ConfigValue::Bool(b) => visitor.visit_bool(b),
            ConfigValue::Number(Number::Integer(i)) => visitor.visit_i64(i),
            ConfigValue::Number(Number::Float(f)) => visitor.visit_f64(f),
            ConfigValue::String(s) => visitor.visit_string(s),
            ConfigValue::List(list) => visitor.visit_seq(SeqDeserializer::new(list)),
            ConfigValue::Config(map) => visitor.visit_map(MapDeserializer::new(map)),
            ConfigValue::DateTime(dt) => visitor.visit_string(dt.to_rfc3339()),
            ConfigValue::BigInt(bi) => visit_bigint(bi, visitor),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            ConfigValue::Null => visitor.visit_none(),
            value => visitor.visit_some(ConfigValueDeserializer::new(value)),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            ConfigValue::String(variant) => visitor.visit_enum(EnumDeserializer {
                variant,
                value: None,
            }),
            ConfigValue::Config(map) if map.len() == 1 => {
                let mut entries = map.into_iter();
                match entries.next() {
                    Some((variant, value)) => visitor.visit_enum(EnumDeserializer {
                        variant,
                        value: Some(value),
                    }),
                    None => Err(Error::custom("expected an enum variant")),
                }
            }
            other => Err(Error::custom(format!(
                "expected an enum variant, found {}",
                other.kind_name()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<ConfigValue>,
}

impl SeqDeserializer {
    fn new(vec: Vec<ConfigValue>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(ConfigValueDeserializer::new(value)).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, ConfigValue>,
    value: Option<ConfigValue>,
}

impl MapDeserializer {
    fn new(map: ConfigMap) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(ConfigValueDeserializer::new(ConfigValue::String(key)))
                    .map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(ConfigValueDeserializer::new(value)),
            None => Err(Error::custom("next_value_seed called before next_key_seed")),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        match self.iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(upper),
            _ => None,
        }
    }
}

struct EnumDeserializer {
    variant: String,
    value: Option<ConfigValue>,
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(ConfigValueDeserializer::new(ConfigValue::String(
            self.variant,
        )))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Option<ConfigValue>,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Some(ConfigValue::Null) | None => Ok(()),
            _ => Err(Error::custom("expected a unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.value {
            Some(value) => seed.deserialize(ConfigValueDeserializer::new(value)),
            None => Err(Error::custom("expected a newtype variant")),
        }
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(ConfigValue::List(list)) => visitor.visit_seq(SeqDeserializer::new(list)),
            _ => Err(Error::custom("expected a tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Some(ConfigValue::Config(map)) => visitor.visit_map(MapDeserializer::new(map)),
            _ => Err(Error::custom("expected a struct variant")),
        }
    }
}

/// Reads any `Deserialize` type from a [`ConfigValue`].
///
/// # Errors
///
/// Returns an error if the value does not match what the type expects.
pub fn from_value<T: DeserializeOwned>(value: ConfigValue) -> Result<T> {
    T::deserialize(ConfigValueDeserializer::new(value))
}
