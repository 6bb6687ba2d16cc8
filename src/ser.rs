//! Object to config tree serialization.
//!
//! This module provides the [`SerializerContext`], which walks the members of
//! a [`ConfigObject`] and writes them into a [`Config`] tree, and the
//! [`ObjectSerializer`] front end that owns the options and the converter
//! registry the context runs with.
//!
//! ## Overview
//!
//! For every member, in schema order, the context:
//!
//! 1. ignores transient members while the transient modifier is on
//! 2. computes the native form of the current value
//! 3. applies skip rules, then default rules, then assertions
//! 4. converts the value through the registry and writes it at the resolved key
//! 5. attaches the member's comment when the tree supports comments
//!
//! ## Usage
//!
//! ```rust
//! use cfgtree::naming::KebabCase;
//! use cfgtree::{ConfigObject, ObjectSerializer, Schema};
//!
//! #[derive(Default)]
//! struct Server {
//!     max_connections: u32,
//! }
//!
//! impl ConfigObject for Server {
//!     fn schema() -> Schema<Self> {
//!         Schema::builder()
//!             .field_with(
//!                 "maxConnections",
//!                 |s: &Server| &s.max_connections,
//!                 |s: &mut Server| &mut s.max_connections,
//!                 |r| r.comment("Upper bound on open sockets"),
//!             )
//!             .build()
//!     }
//! }
//!
//! let serializer = ObjectSerializer::builder().with_naming_strategy(KebabCase);
//! let tree = serializer.serialize_fields(&Server { max_connections: 64 }).unwrap();
//!
//! assert_eq!(tree.get("max-connections").and_then(|v| v.as_i64()), Some(64));
//! assert_eq!(tree.comment("max-connections"), Some("Upper bound on open sockets"));
//! ```
//!
//! ## Serde bridge
//!
//! [`ConfigValueSerializer`] turns any `Serialize` value into a
//! [`ConfigValue`]. It backs [`to_value`](crate::to_value) and the
//! [`Serde`](crate::Serde) member wrapper.

use crate::config::Config;
use crate::naming::NamingStrategy;
use crate::registry::{ConverterRegistry, ValueSerializer};
use crate::{
    ConfigMap, ConfigObject, ConfigType, ConfigValue, Error, Number, Result, SerdeOptions,
    TypeConstraint,
};
use serde::{ser, Serialize};
use tracing::debug;

/// The state shared by every member serialization of one call.
///
/// Converters receive the context so they can recurse into nested values.
#[derive(Clone, Copy, Debug)]
pub struct SerializerContext<'a> {
    options: &'a SerdeOptions,
    registry: &'a ConverterRegistry,
}

impl<'a> SerializerContext<'a> {
    #[must_use]
    pub fn new(options: &'a SerdeOptions, registry: &'a ConverterRegistry) -> Self {
        SerializerContext { options, registry }
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

    /// Converts a native value declared as `constraint` into a tree value,
    /// using the first serializer of the registry that accepts it.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if no serializer accepts the value, or the
    /// selected one fails.
    pub fn serialize_native(
        &self,
        value: ConfigValue,
        constraint: &TypeConstraint,
    ) -> Result<ConfigValue> {
        let serializer = self.registry.find_serializer(&value, constraint)?;
        serializer.serialize(value, constraint, self)
    }

    /// Converts a member value into a tree value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value or one of its nested objects fails to serialize.
    pub fn serialize_value<F: ConfigType>(&self, value: &F) -> Result<ConfigValue> {
        let native = value.to_native(self)?;
        self.serialize_native(native, &F::type_constraint())
    }

    /// Serializes `object` into a fresh [`ConfigMap`].
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member.
    pub fn serialize_object<T: ConfigObject>(&self, object: &T) -> Result<ConfigMap> {
        let mut tree = ConfigMap::new();
        self.serialize_fields(object, &mut tree)?;
        Ok(tree)
    }

    /// Writes the members of `source` into `dest`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member. Members processed before
    /// the failure stay written.
    pub fn serialize_fields<T: ConfigObject>(&self, source: &T, dest: &mut dyn Config) -> Result<()> {
        let schema = T::schema();
        debug!(type_name = schema.type_name(), members = schema.len(), "serializing object");
        for member in schema.members() {
            if self.options.apply_transient_modifier && member.is_transient() {
                debug!(field = member.name(), "ignoring transient field");
                continue;
            }
            member.serialize(source, schema.table(), self, dest)?;
        }
        Ok(())
    }
}

/// Serializes objects with a fixed set of options and converters.
///
/// # Examples
///
/// ```rust
/// use cfgtree::{ObjectSerializer, SerdeOptions};
///
/// let serializer = ObjectSerializer::builder()
///     .with_options(SerdeOptions::new().with_transient_modifier(false));
/// assert!(!serializer.options().apply_transient_modifier);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ObjectSerializer {
    options: SerdeOptions,
    registry: ConverterRegistry,
}

impl ObjectSerializer {
    /// Creates a serializer with default options and the built-in converters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of [`ObjectSerializer::new`], reads better in builder chains.
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

    /// Registers a serializer, consulted before the built-ins.
    #[must_use]
    pub fn with_serializer<S: ValueSerializer + 'static>(mut self, serializer: S) -> Self {
        self.registry.register_serializer(serializer);
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

    fn context(&self) -> SerializerContext<'_> {
        SerializerContext::new(&self.options, &self.registry)
    }

    /// Serializes `source` into a fresh [`ConfigMap`].
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member.
    pub fn serialize_fields<T: ConfigObject>(&self, source: &T) -> Result<ConfigMap> {
        self.context().serialize_object(source)
    }

    /// Writes the members of `source` into an existing tree.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any member.
    pub fn serialize_fields_into<T: ConfigObject>(
        &self,
        source: &T,
        dest: &mut dyn Config,
    ) -> Result<()> {
        self.context().serialize_fields(source, dest)
    }

    /// Converts a single value into a tree value.
    ///
    /// # Errors
    ///
    /// Returns a conversion error if the value cannot be represented.
    pub fn serialize_value<F: ConfigType>(&self, value: &F) -> Result<ConfigValue> {
        self.context().serialize_value(value)
    }
}

/// A serde serializer producing [`ConfigValue`]s.
///
/// Unit variants become strings; newtype, tuple and struct variants become a
/// single-entry tree keyed by the variant name.
pub struct ConfigValueSerializer;

pub struct SerializeVec {
    variant: Option<&'static str>,
    vec: Vec<ConfigValue>,
}

pub struct SerializeMap {
    variant: Option<&'static str>,
    map: ConfigMap,
    current_key: Option<String>,
}

fn tagged(variant: &'static str, value: ConfigValue) -> ConfigValue {
    let mut map = ConfigMap::with_capacity(1);
    map.insert(variant.to_string(), value);
    ConfigValue::Config(map)
}

impl ser::Serializer for ConfigValueSerializer {
    type Ok = ConfigValue;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<ConfigValue> {
        Ok(ConfigValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<ConfigValue> {
        Ok(ConfigValue::Number(Number::Integer(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<ConfigValue> {
        Ok(match i64::try_from(v) {
            Ok(i) => ConfigValue::Number(Number::Integer(i)),
            Err(_) => ConfigValue::BigInt(v.into()),
        })
    }

    fn serialize_u8(self, v: u8) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_u128(self, v: u128) -> Result<ConfigValue> {
        Ok(match i64::try_from(v) {
            Ok(i) => ConfigValue::Number(Number::Integer(i)),
            Err(_) => ConfigValue::BigInt(v.into()),
        })
    }

    fn serialize_f32(self, v: f32) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<ConfigValue> {
        Ok(ConfigValue::from(v))
    }

    fn serialize_char(self, v: char) -> Result<ConfigValue> {
        Ok(ConfigValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<ConfigValue> {
        Ok(ConfigValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ConfigValue> {
        Ok(ConfigValue::List(v.iter().map(|&b| ConfigValue::from(b)).collect()))
    }

    fn serialize_none(self) -> Result<ConfigValue> {
        Ok(ConfigValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<ConfigValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<ConfigValue> {
        Ok(ConfigValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<ConfigValue> {
        Ok(ConfigValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<ConfigValue> {
        Ok(ConfigValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<ConfigValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<ConfigValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(None, len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(None, len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(None, len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(Some(variant), len))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(variant: Option<&'static str>, capacity: usize) -> Self {
        SerializeVec {
            variant,
            vec: Vec::with_capacity(capacity),
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> ConfigValue {
        let list = ConfigValue::List(self.vec);
        match self.variant {
            Some(variant) => tagged(variant, list),
            None => list,
        }
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            variant,
            map: ConfigMap::new(),
            current_key: None,
        }
    }

    fn finish(self) -> ConfigValue {
        let tree = ConfigValue::Config(self.map);
        match self.variant {
            Some(variant) => tagged(variant, tree),
            None => tree,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = ConfigValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = ConfigValue;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = ConfigValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = ConfigValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<ConfigValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = ConfigValue;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match to_value(key)? {
            ConfigValue::String(s) => s,
            ConfigValue::Number(n) => n.to_string(),
            ConfigValue::Bool(b) => b.to_string(),
            other => {
                return Err(Error::custom(format!(
                    "map keys must be strings, found {}",
                    other.kind_name()
                )))
            }
        };
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ConfigValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = ConfigValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ConfigValue> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = ConfigValue;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<ConfigValue> {
        Ok(self.finish())
    }
}

/// Converts any `Serialize` value into a [`ConfigValue`].
///
/// # Errors
///
/// Returns an error if the value's `Serialize` impl fails, or a map key is
/// not a string, number or boolean.
pub fn to_value<T>(value: &T) -> Result<ConfigValue>
where
    T: ?Sized + Serialize,
{
    value.serialize(ConfigValueSerializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Schema, Serde};
    use num_bigint::BigInt;
    use serde::Serialize;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle(f64),
        Rect { w: u32, h: u32 },
    }

    #[test]
    fn test_to_value_scalars() {
        assert_eq!(to_value(&true).unwrap(), ConfigValue::Bool(true));
        assert_eq!(to_value(&7u8).unwrap(), ConfigValue::from(7));
        assert_eq!(to_value(&"hi").unwrap(), ConfigValue::from("hi"));
        assert_eq!(to_value(&None::<i32>).unwrap(), ConfigValue::Null);
        assert_eq!(
            to_value(&u64::MAX).unwrap(),
            ConfigValue::BigInt(BigInt::from(u64::MAX))
        );
    }

    #[test]
    fn test_to_value_enums() {
        assert_eq!(to_value(&Shape::Dot).unwrap(), ConfigValue::from("Dot"));

        let circle = to_value(&Shape::Circle(1.5)).unwrap();
        assert_eq!(
            circle.as_config().and_then(|m| m.get("Circle")),
            Some(&ConfigValue::from(1.5))
        );

        let rect = to_value(&Shape::Rect { w: 2, h: 3 }).unwrap();
        let fields = rect
            .as_config()
            .and_then(|m| m.get("Rect"))
            .and_then(|v| v.as_config())
            .unwrap();
        assert_eq!(fields.keys().cloned().collect::<Vec<_>>(), vec!["w", "h"]);
    }

    #[test]
    fn test_to_value_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(1, "one");
        map.insert(2, "two");
        let value = to_value(&map).unwrap();
        assert_eq!(
            value.as_config().and_then(|m| m.get("2")),
            Some(&ConfigValue::from("two"))
        );
    }

    #[derive(Default)]
    struct Window {
        title: String,
        shape: Serde<Vec<(u8, u8)>>,
        debug: bool,
    }

    impl ConfigObject for Window {
        fn schema() -> Schema<Self> {
            Schema::builder()
                .field("title", |w: &Window| &w.title, |w: &mut Window| &mut w.title)
                .field("shape", |w: &Window| &w.shape, |w: &mut Window| &mut w.shape)
                .field_with(
                    "debug",
                    |w: &Window| &w.debug,
                    |w: &mut Window| &mut w.debug,
                    |r| r.transient(),
                )
                .build()
        }
    }

    #[test]
    fn test_serialize_fields_in_order() {
        let window = Window {
            title: "main".to_string(),
            shape: Serde(vec![(1, 2)]),
            debug: true,
        };
        let tree = ObjectSerializer::new().serialize_fields(&window).unwrap();
        assert_eq!(
            tree.keys().cloned().collect::<Vec<_>>(),
            vec!["title", "shape"]
        );
        assert_eq!(
            tree.get("shape"),
            Some(&ConfigValue::List(vec![ConfigValue::List(vec![
                ConfigValue::from(1),
                ConfigValue::from(2)
            ])]))
        );
    }

    #[test]
    fn test_transient_modifier_can_be_disabled() {
        let window = Window {
            debug: true,
            ..Window::default()
        };
        let tree = ObjectSerializer::builder()
            .apply_transient_modifier(false)
            .serialize_fields(&window)
            .unwrap();
        assert_eq!(tree.get("debug"), Some(&ConfigValue::Bool(true)));
    }

    #[test]
    fn test_serialize_into_existing_tree_keeps_other_entries() {
        let mut tree = BTreeMap::new();
        tree.insert("unrelated".to_string(), ConfigValue::from(1));
        ObjectSerializer::new()
            .serialize_fields_into(&Window::default(), &mut tree)
            .unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.get("title"), Some(&ConfigValue::from("")));
    }
}
