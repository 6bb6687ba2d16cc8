use cfgtree::{
    config, impl_config_type, ConfigMap, ConfigObject, ConfigType, ConfigValue, ErrorKind,
    Number, ObjectDeserializer, ObjectSerializer, Schema, Shape,
};

#[test]
fn test_config_macro_null() {
    assert_eq!(config!(null), ConfigValue::Null);
}

#[test]
fn test_config_macro_booleans() {
    assert_eq!(config!(true), ConfigValue::Bool(true));
    assert_eq!(config!(false), ConfigValue::Bool(false));
}

#[test]
fn test_config_macro_numbers() {
    assert_eq!(config!(42), ConfigValue::Number(Number::Integer(42)));
    assert_eq!(config!(3.5), ConfigValue::Number(Number::Float(3.5)));
    assert_eq!(config!(-123), ConfigValue::Number(Number::Integer(-123)));
}

#[test]
fn test_config_macro_strings() {
    assert_eq!(config!("hello world"), ConfigValue::from("hello world"));
    assert_eq!(config!(""), ConfigValue::String(String::new()));
}

#[test]
fn test_config_macro_expressions() {
    let port = 8080u16;
    let name = String::from("api");
    assert_eq!(config!(port), ConfigValue::from(8080));
    let tree = config!({ "name": (name.clone()), "port": port });
    assert_eq!(tree.get("name"), Some(&ConfigValue::from("api")));
}

#[test]
fn test_config_macro_nested() {
    let tree = config!({
        "server": {
            "hosts": ["a", "b"],
            "tls": { "enabled": false },
        },
        "empty": {},
        "none": [],
    });
    let server = tree.get("server").and_then(|v| v.as_config()).unwrap();
    assert_eq!(server.get("hosts"), Some(&config!(["a", "b"])));
    assert_eq!(tree.get("empty"), Some(&ConfigValue::Config(ConfigMap::new())));
    assert_eq!(tree.get("none"), Some(&ConfigValue::List(vec![])));
}

#[derive(Debug, Default, PartialEq)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl ConfigObject for Color {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field("r", |c: &Color| &c.r, |c: &mut Color| &mut c.r)
            .field("g", |c: &Color| &c.g, |c: &mut Color| &mut c.g)
            .field("b", |c: &Color| &c.b, |c: &mut Color| &mut c.b)
            .build()
    }
}

#[derive(Debug, Default, PartialEq)]
struct Theme {
    name: String,
    accent: Color,
    palette: Vec<Color>,
}

impl ConfigObject for Theme {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field("name", |t: &Theme| &t.name, |t: &mut Theme| &mut t.name)
            .field("accent", |t: &Theme| &t.accent, |t: &mut Theme| &mut t.accent)
            .field("palette", |t: &Theme| &t.palette, |t: &mut Theme| &mut t.palette)
            .build()
    }
}

impl_config_type!(Color, Theme);

#[test]
fn test_impl_config_type_for_several_types() {
    assert_eq!(Color::type_constraint().shape(), Shape::Object);
    assert_eq!(Theme::type_constraint().type_name(), "Theme");
}

#[test]
fn test_nested_objects_through_macro_impl() {
    let tree = config!({
        "name": "dusk",
        "accent": { "r": 255, "g": 128, "b": 0 },
        "palette": [{ "r": 1, "g": 2, "b": 3 }]
    });
    let theme: Theme = ObjectDeserializer::new().deserialize_new(&tree).unwrap();
    assert_eq!(theme.accent, Color { r: 255, g: 128, b: 0 });
    assert_eq!(theme.palette, vec![Color { r: 1, g: 2, b: 3 }]);

    let out = ObjectSerializer::new().serialize_fields(&theme).unwrap();
    assert_eq!(out, tree);
}

#[test]
fn test_nested_object_missing_member() {
    let tree = config!({
        "name": "dusk",
        "accent": { "r": 255, "g": 128 },
        "palette": []
    });
    let err = ObjectDeserializer::new()
        .deserialize_new::<Theme>(&tree)
        .unwrap_err();
    // missing entries inside nested objects surface unchanged
    assert_eq!(err.kind(), ErrorKind::MissingEntry);
    assert!(err.to_string().contains("Color"));
}
