//! Property-based tests for the object mapping round trip.
//!
//! Objects without skip or default rules must come back unchanged from the
//! tree they were written to, whatever the naming strategy.

use cfgtree::naming::{CamelCase, Identity, KebabCase, NamingStrategy, SnakeCase};
use cfgtree::{
    from_value, impl_config_type, to_value, ConfigObject, ObjectDeserializer, ObjectSerializer,
    Schema, SerdeOptions,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
struct Inner {
    label: String,
    enabled: bool,
}

impl ConfigObject for Inner {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field("label", |i: &Inner| &i.label, |i: &mut Inner| &mut i.label)
            .field("isEnabled", |i: &Inner| &i.enabled, |i: &mut Inner| &mut i.enabled)
            .build()
    }
}

impl_config_type!(Inner);

#[derive(Debug, Clone, Default, PartialEq)]
struct Record {
    id: i64,
    count: u64,
    ratio: f64,
    name: Option<String>,
    tags: Vec<String>,
    weights: BTreeMap<String, i32>,
    children: Vec<Inner>,
}

impl ConfigObject for Record {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field("id", |r: &Record| &r.id, |r: &mut Record| &mut r.id)
            .field("totalCount", |r: &Record| &r.count, |r: &mut Record| &mut r.count)
            .field("ratio", |r: &Record| &r.ratio, |r: &mut Record| &mut r.ratio)
            .field("displayName", |r: &Record| &r.name, |r: &mut Record| &mut r.name)
            .field("tags", |r: &Record| &r.tags, |r: &mut Record| &mut r.tags)
            .field("weights", |r: &Record| &r.weights, |r: &mut Record| &mut r.weights)
            .field("children", |r: &Record| &r.children, |r: &mut Record| &mut r.children)
            .build()
    }
}

fn inner_strategy() -> impl Strategy<Value = Inner> {
    ("[a-z]{0,8}", any::<bool>()).prop_map(|(label, enabled)| Inner { label, enabled })
}

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        any::<i64>(),
        any::<u64>(),
        -1.0e9f64..1.0e9,
        proptest::option::of("[ -~]{0,12}"),
        proptest::collection::vec("[a-z]{1,6}", 0..5),
        proptest::collection::btree_map("[a-z]{1,4}", any::<i32>(), 0..4),
        proptest::collection::vec(inner_strategy(), 0..3),
    )
        .prop_map(|(id, count, ratio, name, tags, weights, children)| Record {
            id,
            count,
            ratio,
            name,
            tags,
            weights,
            children,
        })
}

fn roundtrip<N: NamingStrategy + 'static>(record: &Record, naming: N) -> Record {
    let options = SerdeOptions::new().with_naming_strategy(naming);
    let tree = ObjectSerializer::builder()
        .with_options(options.clone())
        .serialize_fields(record)
        .unwrap();
    ObjectDeserializer::builder()
        .with_options(options)
        .deserialize_new(&tree)
        .unwrap()
}

proptest! {
    #[test]
    fn prop_roundtrip_identity(record in record_strategy()) {
        prop_assert_eq!(roundtrip(&record, Identity), record);
    }

    #[test]
    fn prop_roundtrip_snake_case(record in record_strategy()) {
        prop_assert_eq!(roundtrip(&record, SnakeCase), record);
    }

    #[test]
    fn prop_roundtrip_kebab_case(record in record_strategy()) {
        prop_assert_eq!(roundtrip(&record, KebabCase), record);
    }

    #[test]
    fn prop_roundtrip_camel_case(record in record_strategy()) {
        prop_assert_eq!(roundtrip(&record, CamelCase), record);
    }

    #[test]
    fn prop_naming_never_panics(name in "\\PC{0,16}") {
        let _ = SnakeCase.transform_name(&name);
        let _ = KebabCase.transform_name(&name);
        let _ = CamelCase.transform_name(&name);
    }

    #[test]
    fn prop_snake_case_is_lowercase(name in "[a-zA-Z]{0,16}") {
        let out = SnakeCase.transform_name(&name);
        prop_assert!(out.chars().all(|c| !c.is_uppercase()));
        prop_assert_eq!(out.replace('_', "").len(), name.len());
    }

    #[test]
    fn prop_serde_bridge_roundtrip(values in proptest::collection::vec(any::<(u16, bool)>(), 0..8)) {
        let value = to_value(&values).unwrap();
        let back: Vec<(u16, bool)> = from_value(value).unwrap();
        prop_assert_eq!(back, values);
    }
}
