//! # cfgtree
//!
//! Object mapping between Rust types and generic configuration trees.
//!
//! ## What does it do?
//!
//! `cfgtree` writes the members of a Rust object into a hierarchical config
//! tree and reads them back. It does not parse or print any file format: the
//! tree is anything implementing [`Config`], and the crate ships an ordered,
//! commented [`ConfigMap`] for it.
//!
//! ## Key Features
//!
//! - **Explicit schemas**: a type lists its members once in [`ConfigObject::schema`]
//! - **Per-member rules**: custom keys, comments, defaults, skip conditions and assertions
//! - **Naming strategies**: snake, kebab, camel and pascal case, or any closure
//! - **Pluggable converters**: user converters run before the built-in ones
//! - **Absent vs. null**: a missing entry and an explicit null are never confused
//! - **Serde bridge**: any `Serialize + DeserializeOwned` type can be a member via [`Serde`]
//!
//! ## Quick Start
//!
//! ```rust
//! use cfgtree::rules::SkipIf;
//! use cfgtree::{config, ConfigObject, Schema};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     name: Option<String>,
//!     value: i32,
//! }
//!
//! impl ConfigObject for User {
//!     fn schema() -> Schema<Self> {
//!         Schema::builder()
//!             .field_with(
//!                 "name",
//!                 |u: &User| &u.name,
//!                 |u: &mut User| &mut u.name,
//!                 |r| r.default_value(|_| Some("test".to_string())).skip(SkipIf::IsNull),
//!             )
//!             .field("value", |u: &User| &u.value, |u: &mut User| &mut u.value)
//!             .build()
//!     }
//! }
//!
//! // `name` is null, so it is left out
//! let tree = cfgtree::serialize_fields(&User { name: None, value: 42 }).unwrap();
//! assert_eq!(tree, config!({ "value": 42 }));
//!
//! // `name` is missing, which counts as null when reading, so it keeps its value
//! let mut user = User { name: Some("test".to_string()), value: 0 };
//! cfgtree::deserialize_fields(&config!({ "value": 100 }), &mut user).unwrap();
//! assert_eq!(user, User { name: Some("test".to_string()), value: 100 });
//! ```
//!
//! ## Rules
//!
//! See [`rules`] for the rule types and how they combine, and [`schema`] for
//! nested objects and inheritance.
//!
//! ## Logging
//!
//! The mapper emits [`tracing`] events: `debug` when a member is skipped,
//! defaulted or written, `trace` when a converter is selected. It never
//! installs a subscriber.

pub mod config;
pub mod constraint;
pub mod de;
pub mod error;
pub mod macros;
pub mod map;
pub mod naming;
pub mod options;
pub mod registry;
pub mod rules;
pub mod schema;
pub mod ser;
pub mod types;
pub mod value;

pub use config::{Config, Entry};
pub use constraint::{Shape, TypeConstraint};
pub use de::{from_value, ConfigValueDeserializer, DeserializerContext, ObjectDeserializer};
pub use error::{Error, ErrorKind, Result};
pub use map::ConfigMap;
pub use naming::NamingStrategy;
pub use options::SerdeOptions;
pub use registry::ConverterRegistry;
pub use schema::{ConfigObject, Schema, SchemaBuilder};
pub use ser::{to_value, ConfigValueSerializer, ObjectSerializer, SerializerContext};
pub use types::{ConfigType, Serde};
pub use value::{ConfigValue, Number};

/// Serializes `object` into a fresh [`ConfigMap`] with default options.
///
/// # Examples
///
/// ```rust
/// use cfgtree::{ConfigObject, Schema};
///
/// struct Point { x: i32, y: i32 }
///
/// impl ConfigObject for Point {
///     fn schema() -> Schema<Self> {
///         Schema::builder()
///             .field("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
///             .field("y", |p: &Point| &p.y, |p: &mut Point| &mut p.y)
///             .build()
///     }
/// }
///
/// let tree = cfgtree::serialize_fields(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(tree.keys().cloned().collect::<Vec<_>>(), vec!["x", "y"]);
/// ```
///
/// # Errors
///
/// Returns the first error raised by any member.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn serialize_fields<T: ConfigObject>(object: &T) -> Result<ConfigMap> {
    ObjectSerializer::new().serialize_fields(object)
}

/// Reads the members of `object` from `source` with default options.
///
/// # Errors
///
/// Returns the first error raised by any member. Members read before the
/// failure keep their new values.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn deserialize_fields<T: ConfigObject>(source: &dyn Config, object: &mut T) -> Result<()> {
    ObjectDeserializer::new().deserialize_fields(source, object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{AssertThat, SkipIf};

    #[derive(Debug, Default, PartialEq)]
    struct Limits {
        soft: u32,
        hard: u32,
    }

    impl ConfigObject for Limits {
        fn schema() -> Schema<Self> {
            Schema::builder()
                .field("soft", |l: &Limits| &l.soft, |l: &mut Limits| &mut l.soft)
                .field_with(
                    "hard",
                    |l: &Limits| &l.hard,
                    |l: &mut Limits| &mut l.hard,
                    |r| r.assert_that(AssertThat::named("above_soft")),
                )
                .assertion("above_soft", |l: &Limits, hard: &u32| *hard >= l.soft)
                .build()
        }
    }

    #[test]
    fn test_serialize_then_deserialize() {
        let limits = Limits { soft: 1, hard: 5 };
        let tree = serialize_fields(&limits).unwrap();
        let mut back = Limits::default();
        deserialize_fields(&tree, &mut back).unwrap();
        assert_eq!(back, limits);
    }

    #[test]
    fn test_assertion_sees_earlier_members() {
        let tree = config!({ "soft": 10, "hard": 5 });
        let mut limits = Limits::default();
        let err = deserialize_fields(&tree, &mut limits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Assertion);
        assert_eq!(limits.soft, 10);
        assert_eq!(limits.hard, 0);
    }

    #[derive(Debug, Default)]
    struct Flag {
        on: Option<bool>,
    }

    impl ConfigObject for Flag {
        fn schema() -> Schema<Self> {
            Schema::builder()
                .field_with(
                    "on",
                    |f: &Flag| &f.on,
                    |f: &mut Flag| &mut f.on,
                    |r| r.skip_serializing_if(SkipIf::IsNull),
                )
                .build()
        }
    }

    #[test]
    fn test_value_bridge_and_serde_json() {
        let value = to_value(&vec![1, 2]).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "[1,2]");
        let back: Vec<i32> = from_value(value).unwrap();
        assert_eq!(back, vec![1, 2]);

        let tree = serialize_fields(&Flag { on: None }).unwrap();
        assert!(tree.is_empty());
    }
}
