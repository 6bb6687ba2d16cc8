use cfgtree::naming::KebabCase;
use cfgtree::rules::{AssertThat, SkipIf};
use cfgtree::{
    impl_config_type, ConfigMap, ConfigObject, ObjectDeserializer, ObjectSerializer, Schema,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

#[derive(Debug, Default, Clone)]
struct User {
    id: u32,
    name: String,
    email: Option<String>,
    active: bool,
}

impl ConfigObject for User {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field("id", |u: &User| &u.id, |u: &mut User| &mut u.id)
            .field_with(
                "name",
                |u: &User| &u.name,
                |u: &mut User| &mut u.name,
                |r| r.assert_that(AssertThat::NotEmpty),
            )
            .field_with(
                "email",
                |u: &User| &u.email,
                |u: &mut User| &mut u.email,
                |r| r.skip(SkipIf::IsNull),
            )
            .field_with(
                "active",
                |u: &User| &u.active,
                |u: &mut User| &mut u.active,
                |r| r.default_value(|_| true).comment("Whether the account can log in"),
            )
            .build()
    }
}

impl_config_type!(User);

#[derive(Debug, Default, Clone)]
struct Directory {
    title: String,
    users: Vec<User>,
}

impl ConfigObject for Directory {
    fn schema() -> Schema<Self> {
        Schema::builder()
            .field("title", |d: &Directory| &d.title, |d: &mut Directory| &mut d.title)
            .field("users", |d: &Directory| &d.users, |d: &mut Directory| &mut d.users)
            .build()
    }
}

fn user(i: u32) -> User {
    User {
        id: i,
        name: format!("User {}", i),
        email: if i % 2 == 0 {
            Some(format!("user{}@example.com", i))
        } else {
            None
        },
        active: true,
    }
}

fn directory(size: u32) -> Directory {
    Directory {
        title: "staff".to_string(),
        users: (0..size).map(user).collect(),
    }
}

fn benchmark_serialize_simple(c: &mut Criterion) {
    let serializer = ObjectSerializer::new();
    let user = user(2);

    c.bench_function("serialize_simple_object", |b| {
        b.iter(|| serializer.serialize_fields(black_box(&user)))
    });
}

fn benchmark_deserialize_simple(c: &mut Criterion) {
    let deserializer = ObjectDeserializer::new();
    let tree = ObjectSerializer::new().serialize_fields(&user(2)).unwrap();

    c.bench_function("deserialize_simple_object", |b| {
        b.iter(|| deserializer.deserialize_new::<User>(black_box(&tree)))
    });
}

fn benchmark_nested_lists(c: &mut Criterion) {
    let mut group = c.benchmark_group("nested_lists");
    let serializer = ObjectSerializer::builder().with_naming_strategy(KebabCase);
    let deserializer = ObjectDeserializer::builder().with_naming_strategy(KebabCase);

    for size in [10u32, 50, 100, 500].iter() {
        let data = directory(*size);
        let tree: ConfigMap = serializer.serialize_fields(&data).unwrap();

        group.bench_with_input(BenchmarkId::new("serialize", size), &data, |b, data| {
            b.iter(|| serializer.serialize_fields(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("deserialize", size), &tree, |b, tree| {
            b.iter(|| deserializer.deserialize_new::<Directory>(black_box(tree)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_serialize_simple,
    benchmark_deserialize_simple,
    benchmark_nested_lists
);
criterion_main!(benches);
