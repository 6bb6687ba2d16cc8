//! Member schemas of config objects.
//!
//! A type takes part in object mapping by implementing [`ConfigObject`]: it
//! lists its members, each with a getter, a mutable getter and its
//! [`FieldRules`], and registers the named closures its rules refer to.
//!
//! ```rust
//! use cfgtree::rules::{AssertThat, SkipIf};
//! use cfgtree::{impl_config_type, ConfigObject, Schema};
//!
//! #[derive(Debug, Default)]
//! struct Database {
//!     url: String,
//!     pool_size: u32,
//!     password: Option<String>,
//! }
//!
//! impl ConfigObject for Database {
//!     fn schema() -> Schema<Self> {
//!         Schema::builder()
//!             .field("url", |d: &Database| &d.url, |d: &mut Database| &mut d.url)
//!             .field_with(
//!                 "pool_size",
//!                 |d: &Database| &d.pool_size,
//!                 |d: &mut Database| &mut d.pool_size,
//!                 |r| r.key("pool-size").default_value(|_| 8).assert_that(AssertThat::named("sane_pool")),
//!             )
//!             .field_with(
//!                 "password",
//!                 |d: &Database| &d.password,
//!                 |d: &mut Database| &mut d.password,
//!                 |r| r.skip(SkipIf::IsNull),
//!             )
//!             .assertion("sane_pool", |_: &Database, size: &u32| (1..=64).contains(size))
//!             .build()
//!     }
//! }
//!
//! impl_config_type!(Database);
//! ```
//!
//! ## Inheritance
//!
//! Rust has no class hierarchy, so a "parent" is an embedded object whose
//! members are flattened into the child with [`SchemaBuilder::extends`]. They
//! come after the child's own members, nearest parent first, and a name the
//! child already declares is not processed again. Named rules of inherited
//! members resolve against the parent's table.

use crate::config::Config;
use crate::rules::{
    AssertPredicate, Direction, FieldRules, LazyNative, Observed, RuleTable, Scope,
    SkipPredicate, ValueProvider,
};
use crate::types::type_name_of;
use crate::{
    ConfigType, ConfigValue, DeserializerContext, Entry, Error, Result, SerializerContext,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A type whose members can be written to and read from config trees.
pub trait ConfigObject: Sized + 'static {
    /// Describes the members of the type. Called once per (de)serialization.
    fn schema() -> Schema<Self>;
}

/// One member of a schema, type-erased over its declared type.
pub(crate) trait Member<T>: Send + Sync {
    fn name(&self) -> &str;

    fn is_transient(&self) -> bool;

    fn serialize(
        &self,
        source: &T,
        table: &RuleTable,
        ctx: &SerializerContext<'_>,
        dest: &mut dyn Config,
    ) -> Result<()>;

    fn deserialize(
        &self,
        source: &dyn Config,
        dest: &mut T,
        table: &RuleTable,
        ctx: &DeserializerContext<'_>,
    ) -> Result<()>;
}

/// The ordered members of a type and the table of its named rules.
pub struct Schema<T> {
    type_name: String,
    members: Vec<Arc<dyn Member<T>>>,
    rules: Arc<RuleTable>,
}

impl<T: 'static> Schema<T> {
    #[must_use]
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder::new()
    }

    /// The name used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Member names in processing order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name())
    }

    /// Named rules declared by this type.
    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn members(&self) -> &[Arc<dyn Member<T>>] {
        &self.members
    }

    pub(crate) fn table(&self) -> &RuleTable {
        &self.rules
    }
}

impl<T: 'static> fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("type_name", &self.type_name)
            .field("members", &self.member_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Builds a [`Schema`].
pub struct SchemaBuilder<T> {
    type_name: String,
    own: Vec<Arc<dyn Member<T>>>,
    inherited: Vec<Arc<dyn Member<T>>>,
    rules: RuleTable,
}

impl<T: 'static> Default for SchemaBuilder<T> {
    fn default() -> Self {
        SchemaBuilder::new()
    }
}

impl<T: 'static> SchemaBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        let type_name = type_name_of::<T>();
        SchemaBuilder {
            rules: RuleTable::new(&type_name),
            type_name,
            own: Vec::new(),
            inherited: Vec::new(),
        }
    }

    /// Overrides the type name shown in error messages. Members added
    /// before the call keep the previous name.
    #[must_use]
    pub fn named(mut self, type_name: &str) -> Self {
        self.type_name = type_name.to_string();
        self.rules.set_owner(type_name);
        self
    }

    /// Adds a member without rules.
    #[must_use]
    pub fn field<F, G, M>(self, name: &str, get: G, get_mut: M) -> Self
    where
        F: ConfigType,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
    {
        self.field_with(name, get, get_mut, |rules| rules)
    }

    /// Adds a member and configures its rules.
    #[must_use]
    pub fn field_with<F, G, M, R>(mut self, name: &str, get: G, get_mut: M, rules: R) -> Self
    where
        F: ConfigType,
        G: Fn(&T) -> &F + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut F + Send + Sync + 'static,
        R: FnOnce(FieldRules<T, F>) -> FieldRules<T, F>,
    {
        self.own.push(Arc::new(Field {
            name: name.to_string(),
            declaring_type: self.type_name.clone(),
            get: Box::new(get),
            get_mut: Box::new(get_mut),
            rules: rules(FieldRules::new()),
        }));
        self
    }

    /// Flattens the members of the embedded parent object `P` into this schema.
    #[must_use]
    pub fn extends<P, G, M>(mut self, get: G, get_mut: M) -> Self
    where
        P: ConfigObject,
        G: Fn(&T) -> &P + Send + Sync + 'static,
        M: Fn(&mut T) -> &mut P + Send + Sync + 'static,
    {
        let parent = P::schema();
        let get: Arc<dyn Fn(&T) -> &P + Send + Sync> = Arc::new(get);
        let get_mut: Arc<dyn Fn(&mut T) -> &mut P + Send + Sync> = Arc::new(get_mut);
        for member in parent.members {
            self.inherited.push(Arc::new(Projected {
                inner: member,
                rules: Arc::clone(&parent.rules),
                get: Arc::clone(&get),
                get_mut: Arc::clone(&get_mut),
            }));
        }
        self
    }

    /// Registers a named skip predicate, receiving the instance and the observed entry.
    #[must_use]
    pub fn skip_predicate<P>(mut self, name: &str, predicate: P) -> Self
    where
        P: Fn(&T, Entry<'_>) -> bool + Send + Sync + 'static,
    {
        let predicate: SkipPredicate<T> = Arc::new(predicate);
        self.rules.insert(name, predicate);
        self
    }

    /// Registers a named assertion on members of type `F`.
    #[must_use]
    pub fn assertion<F, P>(mut self, name: &str, predicate: P) -> Self
    where
        F: 'static,
        P: Fn(&T, &F) -> bool + Send + Sync + 'static,
    {
        let predicate: AssertPredicate<T, F> = Arc::new(predicate);
        self.rules.insert(name, predicate);
        self
    }

    /// Registers a named provider of default values of type `F`.
    #[must_use]
    pub fn provider<F, P>(mut self, name: &str, provider: P) -> Self
    where
        F: 'static,
        P: Fn(&T) -> F + Send + Sync + 'static,
    {
        let provider: ValueProvider<T, F> = Arc::new(provider);
        self.rules.insert(name, provider);
        self
    }

    #[must_use]
    pub fn build(self) -> Schema<T> {
        let mut seen = HashSet::new();
        let members = self
            .own
            .into_iter()
            .chain(self.inherited)
            .filter(|m| seen.insert(m.name().to_string()))
            .collect();
        Schema {
            type_name: self.type_name,
            members,
            rules: Arc::new(self.rules),
        }
    }
}

struct Field<T, F> {
    name: String,
    declaring_type: String,
    get: Box<dyn Fn(&T) -> &F + Send + Sync>,
    get_mut: Box<dyn Fn(&mut T) -> &mut F + Send + Sync>,
    rules: FieldRules<T, F>,
}

impl<T, F> Field<T, F> {
    fn wrap_serialize(&self, err: Error, value: &dyn fmt::Debug) -> Error {
        if err.is_terminal() {
            return err;
        }
        Error::wrap(
            format!(
                "cannot serialize field `{}::{}` with value {:?}",
                self.declaring_type, self.name, value
            ),
            err,
        )
    }

    fn wrap_deserialize(&self, err: Error, entry: Entry<'_>) -> Error {
        if err.is_terminal() {
            return err;
        }
        Error::wrap(
            format!(
                "cannot deserialize value `{}` into field `{}::{}`",
                entry, self.declaring_type, self.name
            ),
            err,
        )
    }
}

impl<T: 'static, F: ConfigType> Member<T> for Field<T, F> {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_transient(&self) -> bool {
        self.rules.is_transient()
    }

    fn serialize(
        &self,
        source: &T,
        table: &RuleTable,
        ctx: &SerializerContext<'_>,
        dest: &mut dyn Config,
    ) -> Result<()> {
        let scope = Scope::new(&self.name, &self.declaring_type, table);
        let key = self.rules.resolve_key(&self.name, ctx.naming_strategy());

        let current = (self.get)(source);
        let compute = || -> Result<ConfigValue> {
            current
                .to_native(ctx)
                .map_err(|e| self.wrap_serialize(e, current))
        };
        let lazy = LazyNative::new(&compute);
        let observed = Observed::member(current, &lazy);
        if self
            .rules
            .should_skip(Direction::Serialize, observed, source, &scope)?
        {
            debug!(field = %self.name, key = %key, "skipping field");
            return Ok(());
        }

        let substitute;
        let (value, native) = match self.rules.find_default(observed, source, &scope)? {
            Some(default) => {
                debug!(field = %self.name, key = %key, "using default value");
                substitute = default;
                let native = substitute
                    .to_native(ctx)
                    .map_err(|e| self.wrap_serialize(e, &substitute))?;
                (&substitute, native)
            }
            None => (current, lazy.into_value()?),
        };

        self.rules.check_asserts(value, source, &scope)?;

        let stored = ctx
            .serialize_native(native, &F::type_constraint())
            .map_err(|e| self.wrap_serialize(e, value))?;
        debug!(field = %self.name, key = %key, "writing field");
        dest.set(&[key.as_str()], stored)
            .map_err(|e| self.wrap_serialize(e, value))?;
        if dest.supports_comments() {
            if let Some(comment) = self.rules.resolve_comment() {
                dest.set_comment(&[key.as_str()], comment)
                    .map_err(|e| self.wrap_serialize(e, value))?;
            }
        }
        Ok(())
    }

    fn deserialize(
        &self,
        source: &dyn Config,
        dest: &mut T,
        table: &RuleTable,
        ctx: &DeserializerContext<'_>,
    ) -> Result<()> {
        let scope = Scope::new(&self.name, &self.declaring_type, table);
        let key = self.rules.resolve_key(&self.name, ctx.naming_strategy());

        let entry = source.get_raw(&[key.as_str()]);
        let observed = Observed::entry(entry);
        if self
            .rules
            .should_skip(Direction::Deserialize, observed, dest, &scope)?
        {
            debug!(field = %self.name, key = %key, "skipping field");
            return Ok(());
        }

        let value = match self.rules.find_default(observed, dest, &scope)? {
            Some(default) => {
                debug!(field = %self.name, key = %key, "using default value");
                default
            }
            None => {
                let raw = match entry {
                    Entry::Absent => {
                        return Err(Error::missing_entry(&key, &self.name, &self.declaring_type))
                    }
                    Entry::Null => None,
                    Entry::Present(v) => Some(v.clone()),
                };
                ctx.deserialize_value::<F>(raw)
                    .map_err(|e| self.wrap_deserialize(e, entry))?
            }
        };

        self.rules.check_asserts(&value, dest, &scope)?;
        debug!(field = %self.name, key = %key, "assigning field");
        *(self.get_mut)(dest) = value;
        Ok(())
    }
}

/// A member of an embedded parent object, reached through a projection.
struct Projected<T, P> {
    inner: Arc<dyn Member<P>>,
    rules: Arc<RuleTable>,
    get: Arc<dyn Fn(&T) -> &P + Send + Sync>,
    get_mut: Arc<dyn Fn(&mut T) -> &mut P + Send + Sync>,
}

impl<T: 'static, P: 'static> Member<T> for Projected<T, P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_transient(&self) -> bool {
        self.inner.is_transient()
    }

    fn serialize(
        &self,
        source: &T,
        _table: &RuleTable,
        ctx: &SerializerContext<'_>,
        dest: &mut dyn Config,
    ) -> Result<()> {
        self.inner
            .serialize((self.get)(source), &self.rules, ctx, dest)
    }

    fn deserialize(
        &self,
        source: &dyn Config,
        dest: &mut T,
        _table: &RuleTable,
        ctx: &DeserializerContext<'_>,
    ) -> Result<()> {
        self.inner
            .deserialize(source, (self.get_mut)(dest), &self.rules, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Base {
        id: u32,
        label: String,
    }

    impl ConfigObject for Base {
        fn schema() -> Schema<Self> {
            Schema::builder()
                .field("id", |b: &Base| &b.id, |b: &mut Base| &mut b.id)
                .field("label", |b: &Base| &b.label, |b: &mut Base| &mut b.label)
                .build()
        }
    }

    #[derive(Debug, Default)]
    struct Child {
        base: Base,
        label: String,
        extra: bool,
    }

    impl ConfigObject for Child {
        fn schema() -> Schema<Self> {
            Schema::builder()
                .field("label", |c: &Child| &c.label, |c: &mut Child| &mut c.label)
                .field("extra", |c: &Child| &c.extra, |c: &mut Child| &mut c.extra)
                .extends(|c: &Child| &c.base, |c: &mut Child| &mut c.base)
                .build()
        }
    }

    #[test]
    fn test_inherited_members_follow_own_and_are_deduplicated() {
        let schema = Child::schema();
        assert_eq!(
            schema.member_names().collect::<Vec<_>>(),
            vec!["label", "extra", "id"]
        );
        assert_eq!(schema.type_name(), "Child");
    }

    #[test]
    fn test_named_rules_are_registered() {
        let schema = Schema::<Base>::builder()
            .assertion("nonzero", |_: &Base, id: &u32| *id != 0)
            .provider("default_label", |_: &Base| "base".to_string())
            .build();
        assert!(schema.rules().contains("nonzero"));
        assert!(schema.rules().contains("default_label"));
        assert!(schema.is_empty());
    }

    #[test]
    fn test_named_overrides_type_name() {
        let schema = Schema::<Base>::builder().named("BaseConfig").build();
        assert_eq!(schema.type_name(), "BaseConfig");
        assert_eq!(schema.rules().owner(), "BaseConfig");
    }
}
