//! Writing an object to a config tree and reading it back.
//!
//! Run with: cargo run --example basic

use cfgtree::naming::KebabCase;
use cfgtree::rules::{AssertThat, SkipIf};
use cfgtree::{ConfigObject, ObjectDeserializer, ObjectSerializer, Schema};
use std::error::Error;

#[derive(Debug, Default, PartialEq)]
struct Database {
    url: String,
    pool_size: u32,
    password: Option<String>,
}

impl ConfigObject for Database {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field_with(
                "url",
                |d: &Database| &d.url,
                |d: &mut Database| &mut d.url,
                |r| r.comment("JDBC-style connection string").assert_that(AssertThat::NotEmpty),
            )
            .field_with(
                "poolSize",
                |d: &Database| &d.pool_size,
                |d: &mut Database| &mut d.pool_size,
                |r| r.default_value(|_| 8).assert_that(AssertThat::named("sane_pool")),
            )
            .field_with(
                "password",
                |d: &Database| &d.password,
                |d: &mut Database| &mut d.password,
                |r| r.skip(SkipIf::IsNull),
            )
            .assertion("sane_pool", |_: &Database, size: &u32| (1..=64).contains(size))
            .build()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let serializer = ObjectSerializer::builder().with_naming_strategy(KebabCase);
    let deserializer = ObjectDeserializer::builder().with_naming_strategy(KebabCase);

    let db = Database {
        url: "postgres://localhost/app".to_string(),
        pool_size: 16,
        password: None,
    };

    let tree = serializer.serialize_fields(&db)?;
    for (key, value) in tree.iter() {
        match tree.comment(key) {
            Some(comment) => println!("{} = {}    # {}", key, value, comment),
            None => println!("{} = {}", key, value),
        }
    }

    let back: Database = deserializer.deserialize_new(&tree)?;
    assert_eq!(back, db);
    println!("✓ Round-trip successful");

    let mut partial = tree.clone();
    partial.remove("pool-size");
    let defaulted: Database = deserializer.deserialize_new(&partial)?;
    println!("pool-size defaults to {}", defaulted.pool_size);

    Ok(())
}
