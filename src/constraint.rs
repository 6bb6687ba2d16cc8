//! Declared-type descriptors used to pick and check converters.
//!
//! A [`TypeConstraint`] describes the Rust type a member is declared with: its
//! raw [`Shape`], a readable type name and the constraints of its generic
//! arguments (the element of a list, the value of a map, the inner type of an
//! `Option`). Constraints are derived from [`ConfigType::type_constraint`] and
//! never change afterwards.
//!
//! ```rust
//! use cfgtree::{ConfigValue, Shape, TypeConstraint};
//!
//! let c = TypeConstraint::of::<Vec<Option<i32>>>();
//! assert_eq!(c.shape(), Shape::List);
//! assert_eq!(c.element().map(TypeConstraint::shape), Some(Shape::Optional));
//! assert!(c.accepts(&ConfigValue::List(vec![ConfigValue::Null, ConfigValue::from(1)])));
//! ```

use crate::{ConfigType, ConfigValue, Number};
use std::fmt;

/// The raw shape of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Any config value, including the null marker.
    Any,
    Bool,
    Integer,
    Float,
    Char,
    String,
    /// A sequence; the first argument is the element constraint.
    List,
    /// A string-keyed map; the first argument is the value constraint.
    Map,
    /// A nullable value; the first argument is the inner constraint.
    Optional,
    /// A schema-backed object, stored as a nested tree.
    Object,
    /// A raw nested tree.
    Config,
    DateTime,
    BigInt,
}

/// An immutable descriptor of a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConstraint {
    shape: Shape,
    type_name: String,
    args: Vec<TypeConstraint>,
}

impl TypeConstraint {
    /// Creates a constraint without generic arguments.
    pub fn new(shape: Shape, type_name: impl Into<String>) -> Self {
        TypeConstraint {
            shape,
            type_name: type_name.into(),
            args: Vec::new(),
        }
    }

    /// Returns the constraint of a member type.
    #[must_use]
    pub fn of<F: ConfigType>() -> Self {
        F::type_constraint()
    }

    /// The constraint of a value of unknown type.
    #[must_use]
    pub fn any() -> Self {
        TypeConstraint::new(Shape::Any, "any")
    }

    /// Appends a generic argument.
    #[must_use]
    pub fn with_argument(mut self, arg: TypeConstraint) -> Self {
        self.args.push(arg);
        self
    }

    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn arguments(&self) -> &[TypeConstraint] {
        &self.args
    }

    /// The element, value or inner constraint, for lists, maps and optionals.
    #[must_use]
    pub fn element(&self) -> Option<&TypeConstraint> {
        self.args.first()
    }

    /// Returns `true` if the null marker is a valid value of this type.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        matches!(self.shape, Shape::Any | Shape::Optional)
    }

    /// Checks that `value` has the shape this constraint describes,
    /// recursing into list elements and map values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::{ConfigValue, TypeConstraint};
    ///
    /// let c = TypeConstraint::of::<i64>();
    /// assert!(c.accepts(&ConfigValue::from(3)));
    /// assert!(!c.accepts(&ConfigValue::from(3.5)));
    /// assert!(!c.accepts(&ConfigValue::Null));
    /// ```
    #[must_use]
    pub fn accepts(&self, value: &ConfigValue) -> bool {
        match (self.shape, value) {
            (Shape::Any, _) => true,
            (Shape::Optional, ConfigValue::Null) => true,
            (Shape::Optional, v) => self.element().map_or(true, |inner| inner.accepts(v)),
            (_, ConfigValue::Null) => false,
            (Shape::Bool, ConfigValue::Bool(_)) => true,
            (Shape::Integer, ConfigValue::Number(Number::Integer(_))) => true,
            (Shape::Float, ConfigValue::Number(_)) => true,
            (Shape::Char, ConfigValue::String(s)) => s.chars().count() == 1,
            (Shape::String, ConfigValue::String(_)) => true,
            (Shape::List, ConfigValue::List(items)) => match self.element() {
                Some(element) => items.iter().all(|item| element.accepts(item)),
                None => true,
            },
            (Shape::Map, ConfigValue::Config(map)) => match self.element() {
                Some(element) => map.values().all(|item| element.accepts(item)),
                None => true,
            },
            (Shape::Object | Shape::Config, ConfigValue::Config(_)) => true,
            (Shape::DateTime, ConfigValue::DateTime(_)) => true,
            (Shape::BigInt, ConfigValue::BigInt(_) | ConfigValue::Number(Number::Integer(_))) => {
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConfigMap;
    use std::collections::HashMap;

    #[test]
    fn test_nested_arguments() {
        let c = TypeConstraint::of::<HashMap<String, Vec<String>>>();
        assert_eq!(c.shape(), Shape::Map);
        let list = c.element().unwrap();
        assert_eq!(list.shape(), Shape::List);
        assert_eq!(list.element().unwrap().shape(), Shape::String);
    }

    #[test]
    fn test_optional_is_nullable() {
        assert!(TypeConstraint::of::<Option<u8>>().is_nullable());
        assert!(!TypeConstraint::of::<u8>().is_nullable());
        assert!(TypeConstraint::any().is_nullable());
    }

    #[test]
    fn test_accepts_checks_elements() {
        let c = TypeConstraint::of::<Vec<bool>>();
        assert!(c.accepts(&ConfigValue::List(vec![ConfigValue::from(true)])));
        assert!(!c.accepts(&ConfigValue::List(vec![ConfigValue::from(1)])));
        assert!(!c.accepts(&ConfigValue::from("x")));
    }

    #[test]
    fn test_accepts_map_values() {
        let c = TypeConstraint::of::<HashMap<String, i32>>();
        let mut map = ConfigMap::new();
        map.insert("a".to_string(), ConfigValue::from(1));
        assert!(c.accepts(&ConfigValue::Config(map.clone())));
        map.insert("b".to_string(), ConfigValue::from("two"));
        assert!(!c.accepts(&ConfigValue::Config(map)));
    }

    #[test]
    fn test_char_requires_single_character() {
        let c = TypeConstraint::of::<char>();
        assert!(c.accepts(&ConfigValue::from("x")));
        assert!(!c.accepts(&ConfigValue::from("xy")));
        assert!(!c.accepts(&ConfigValue::from("")));
    }

    #[test]
    fn test_display_uses_type_name() {
        let c = TypeConstraint::new(Shape::Object, "Server");
        assert_eq!(c.to_string(), "Server");
    }
}
