/// Builds config trees and values from a JSON-like literal.
///
/// An object literal produces a [`ConfigMap`](crate::ConfigMap), anything else
/// a [`ConfigValue`](crate::ConfigValue). Negative numbers and other
/// multi-token expressions must be parenthesized.
///
/// ```rust
/// use cfgtree::{config, ConfigValue};
///
/// let tree = config!({
///     "name": "api",
///     "port": 8080,
///     "offset": (-5),
///     "tags": ["a", "b"],
///     "tls": { "enabled": true }
/// });
///
/// assert_eq!(tree.get("port"), Some(&ConfigValue::from(8080)));
/// assert_eq!(tree.get("offset"), Some(&ConfigValue::from(-5)));
/// assert_eq!(config!(null), ConfigValue::Null);
/// ```
#[macro_export]
macro_rules! config {
    (null) => {
        $crate::ConfigValue::Null
    };

    (true) => {
        $crate::ConfigValue::Bool(true)
    };

    (false) => {
        $crate::ConfigValue::Bool(false)
    };

    ([]) => {
        $crate::ConfigValue::List(vec![])
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::ConfigValue::List(vec![$($crate::ConfigValue::from($crate::config!($elem))),*])
    };

    ({}) => {
        $crate::ConfigMap::new()
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut tree = $crate::ConfigMap::new();
        $(
            tree.insert($key.to_string(), $crate::ConfigValue::from($crate::config!($value)));
        )*
        tree
    }};

    ($e:expr) => {
        $crate::ConfigValue::from($e)
    };
}

/// Implements [`ConfigType`](crate::ConfigType) for types that implement
/// [`ConfigObject`](crate::ConfigObject) and `Default`, so they can be used as
/// members of other objects, in lists and in maps.
///
/// Nested objects are written as subtrees and read back into a fresh
/// `Default` instance.
///
/// ```rust
/// use cfgtree::{config, impl_config_type, ConfigObject, ObjectDeserializer, Schema};
///
/// #[derive(Debug, Default)]
/// struct Tls {
///     enabled: bool,
/// }
///
/// impl ConfigObject for Tls {
///     fn schema() -> Schema<Self> {
///         Schema::builder()
///             .field("enabled", |t: &Tls| &t.enabled, |t: &mut Tls| &mut t.enabled)
///             .build()
///     }
/// }
///
/// #[derive(Debug, Default)]
/// struct Listener {
///     tls: Tls,
/// }
///
/// impl ConfigObject for Listener {
///     fn schema() -> Schema<Self> {
///         Schema::builder()
///             .field("tls", |l: &Listener| &l.tls, |l: &mut Listener| &mut l.tls)
///             .build()
///     }
/// }
///
/// impl_config_type!(Tls);
///
/// let tree = config!({ "tls": { "enabled": true } });
/// let listener: Listener = ObjectDeserializer::new().deserialize_new(&tree).unwrap();
/// assert!(listener.tls.enabled);
/// ```
#[macro_export]
macro_rules! impl_config_type {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::ConfigType for $ty {
                fn type_constraint() -> $crate::TypeConstraint {
                    $crate::TypeConstraint::new($crate::Shape::Object, stringify!($ty))
                }

                fn to_native(
                    &self,
                    ctx: &$crate::SerializerContext<'_>,
                ) -> $crate::Result<$crate::ConfigValue> {
                    ctx.serialize_object(self).map($crate::ConfigValue::Config)
                }

                fn from_native(
                    value: $crate::ConfigValue,
                    ctx: &$crate::DeserializerContext<'_>,
                ) -> $crate::Result<Self> {
                    match value {
                        $crate::ConfigValue::Config(tree) => ctx.deserialize_object(&tree),
                        other => Err($crate::Error::conversion(format!(
                            "expected a config tree for {}, found {}",
                            stringify!($ty),
                            other.kind_name()
                        ))),
                    }
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use crate::{ConfigMap, ConfigType, ConfigValue, Number, Schema, Shape};

    #[test]
    fn test_config_macro_primitives() {
        assert_eq!(config!(null), ConfigValue::Null);
        assert_eq!(config!(true), ConfigValue::Bool(true));
        assert_eq!(config!(false), ConfigValue::Bool(false));
        assert_eq!(config!(42), ConfigValue::Number(Number::Integer(42)));
        assert_eq!(config!(3.5), ConfigValue::Number(Number::Float(3.5)));
        assert_eq!(config!("hello"), ConfigValue::String("hello".to_string()));
    }

    #[test]
    fn test_config_macro_lists() {
        assert_eq!(config!([]), ConfigValue::List(vec![]));
        assert_eq!(
            config!([1, null, [true]]),
            ConfigValue::List(vec![
                ConfigValue::from(1),
                ConfigValue::Null,
                ConfigValue::List(vec![ConfigValue::Bool(true)]),
            ])
        );
    }

    #[test]
    fn test_config_macro_trees() {
        assert_eq!(config!({}), ConfigMap::new());

        let tree = config!({
            "name": "Alice",
            "limits": { "max": 30 }
        });
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get("name"), Some(&ConfigValue::from("Alice")));
        let limits = tree.get("limits").and_then(|v| v.as_config()).unwrap();
        assert_eq!(limits.get("max"), Some(&ConfigValue::from(30)));
        assert_eq!(tree.keys().cloned().collect::<Vec<_>>(), vec!["name", "limits"]);
    }

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl crate::ConfigObject for Point {
        fn schema() -> Schema<Self> {
            Schema::builder()
                .field("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
                .field("y", |p: &Point| &p.y, |p: &mut Point| &mut p.y)
                .build()
        }
    }

    impl_config_type!(Point);

    #[test]
    fn test_impl_config_type_constraint() {
        let constraint = Point::type_constraint();
        assert_eq!(constraint.shape(), Shape::Object);
        assert_eq!(constraint.type_name(), "Point");
    }

    #[test]
    fn test_impl_config_type_round_trip() {
        let points = vec![Point { x: 1, y: 2 }, Point { x: -3, y: 4 }];
        let value = crate::ObjectSerializer::new().serialize_value(&points).unwrap();
        assert_eq!(
            value,
            ConfigValue::List(vec![
                ConfigValue::Config(config!({ "x": 1, "y": 2 })),
                ConfigValue::Config(config!({ "x": (-3), "y": 4 })),
            ])
        );
        let back: Vec<Point> = crate::ObjectDeserializer::new().deserialize_value(value).unwrap();
        assert_eq!(back, points);
    }

    #[test]
    fn test_impl_config_type_rejects_scalars() {
        let err = crate::ObjectDeserializer::new()
            .deserialize_value::<Point>(ConfigValue::from(1))
            .unwrap_err();
        assert!(err.to_string().contains("Point"), "{}", err);
    }
}
