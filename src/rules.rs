//! Declarative per-member rules and their resolution.
//!
//! Each member of a [`Schema`](crate::Schema) carries [`FieldRules`]: a
//! standalone [`RuleSet`] plus an optional consolidated one, set with
//! [`FieldRules::config`]. For every concern the consolidated block is
//! consulted first and a missing sub-rule falls through to the standalone
//! rules:
//!
//! - **key**: first explicit key, else the naming strategy
//! - **comment**: the first non-empty comment list, lines joined with `\n`
//! - **default**: the first rule whose trigger matches
//! - **skip**: any matching rule skips the member
//! - **assert**: every assertion must hold
//!
//! ## Custom rules
//!
//! Custom skip predicates, assertions and default providers are given as a
//! [`Check`]: either an inline closure, or a name looked up first in the
//! [`RuleTable`] of the declaring schema (closures that receive the instance),
//! then in the table of a [`Companion`] type (closures without instance).
//! A name that resolves to nothing, or only to closures of another shape, is a
//! [`Error::RuleResolution`](crate::Error::RuleResolution), never "false".
//!
//! ```rust
//! use cfgtree::rules::{AssertThat, FieldRules, RuleProvider, RuleTable, SkipIf, WhenValue};
//!
//! struct Limits;
//!
//! impl RuleProvider for Limits {
//!     fn rules() -> RuleTable {
//!         RuleTable::new("Limits").assertion("valid_port", |port: &u16| *port >= 1024)
//!     }
//! }
//!
//! # struct Server;
//! let rules: FieldRules<Server, u16> = FieldRules::new()
//!     .key("listen-port")
//!     .comment("Port the server listens on")
//!     .default_value(|_| 8080)
//!     .assert_that(AssertThat::named_in::<Limits>("valid_port"))
//!     .skip_serializing_if(SkipIf::IsNull);
//! ```

use crate::types::type_name_of;
use crate::{ConfigType, ConfigValue, Entry, Error, NamingStrategy, Result};
use std::any::Any;
use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Skip predicate receiving the instance and the observed entry.
pub type SkipPredicate<T> = Arc<dyn Fn(&T, Entry<'_>) -> bool + Send + Sync>;
/// Assertion receiving the instance and the member value.
pub type AssertPredicate<T, F> = Arc<dyn Fn(&T, &F) -> bool + Send + Sync>;
/// Default value provider receiving the instance.
pub type ValueProvider<T, F> = Arc<dyn Fn(&T) -> F + Send + Sync>;

/// Skip predicate stored in a companion table.
pub type SharedSkipPredicate = Arc<dyn Fn(Entry<'_>) -> bool + Send + Sync>;
/// Assertion stored in a companion table.
pub type SharedAssertPredicate<F> = Arc<dyn Fn(&F) -> bool + Send + Sync>;
/// Default value provider stored in a companion table.
pub type SharedValueProvider<F> = Arc<dyn Fn() -> F + Send + Sync>;

/// A type exposing named rules to other types, without an instance.
pub trait RuleProvider {
    fn rules() -> RuleTable;
}

/// A reference to the rule table of a [`RuleProvider`].
#[derive(Clone)]
pub struct Companion {
    name: String,
    rules: fn() -> RuleTable,
}

impl Companion {
    #[must_use]
    pub fn of<C: RuleProvider>() -> Self {
        Companion {
            name: type_name_of::<C>(),
            rules: C::rules,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> RuleTable {
        (self.rules)()
    }
}

impl fmt::Debug for Companion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Companion").field(&self.name).finish()
    }
}

/// How a custom rule finds its closure.
#[derive(Clone)]
pub enum Check<C> {
    /// The closure itself.
    Inline(C),
    /// A name, looked up in the declaring schema's table, then in the companion's.
    Named {
        name: String,
        companion: Option<Companion>,
    },
    /// A custom rule without a reference. Resolving it is an error.
    Unset,
}

impl<C> Check<C> {
    pub fn named(name: &str) -> Self {
        Check::Named {
            name: name.to_string(),
            companion: None,
        }
    }

    pub fn named_in<P: RuleProvider>(name: &str) -> Self {
        Check::Named {
            name: name.to_string(),
            companion: Some(Companion::of::<P>()),
        }
    }
}

impl<C> fmt::Debug for Check<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Inline(_) => f.write_str("Inline(..)"),
            Check::Named { name, companion } => f
                .debug_struct("Named")
                .field("name", name)
                .field("companion", companion)
                .finish(),
            Check::Unset => f.write_str("Unset"),
        }
    }
}

/// When to skip a member.
#[derive(Clone, Debug)]
pub enum SkipIf<T> {
    Always,
    /// The tree has no entry. Only meaningful when deserializing.
    IsMissing,
    /// The value is null. When deserializing, a missing entry counts as null.
    IsNull,
    /// The value is an empty string, list, map or tree.
    IsEmpty,
    Custom(Check<SkipPredicate<T>>),
}

impl<T> SkipIf<T> {
    pub fn custom<P>(predicate: P) -> Self
    where
        P: Fn(&T, Entry<'_>) -> bool + Send + Sync + 'static,
    {
        SkipIf::Custom(Check::Inline(Arc::new(predicate)))
    }

    pub fn named(name: &str) -> Self {
        SkipIf::Custom(Check::named(name))
    }

    pub fn named_in<P: RuleProvider>(name: &str) -> Self {
        SkipIf::Custom(Check::named_in::<P>(name))
    }
}

/// Triggers of a default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WhenValue {
    /// The tree has no entry for the member.
    IsMissing,
    /// The value is null.
    IsNull,
    /// The value is empty.
    IsEmpty,
}

/// A check run against a member value before it is written or assigned.
#[derive(Clone, Debug)]
pub enum AssertThat<T, F> {
    NotNull,
    NotEmpty,
    Custom(Check<AssertPredicate<T, F>>),
}

impl<T, F> AssertThat<T, F> {
    pub fn custom<P>(predicate: P) -> Self
    where
        P: Fn(&T, &F) -> bool + Send + Sync + 'static,
    {
        AssertThat::Custom(Check::Inline(Arc::new(predicate)))
    }

    pub fn named(name: &str) -> Self {
        AssertThat::Custom(Check::named(name))
    }

    pub fn named_in<P: RuleProvider>(name: &str) -> Self {
        AssertThat::Custom(Check::named_in::<P>(name))
    }
}

/// A default value and the conditions that trigger it.
#[derive(Clone, Debug)]
pub struct DefaultRule<T, F> {
    provider: Check<ValueProvider<T, F>>,
    when: Vec<WhenValue>,
}

impl<T, F> DefaultRule<T, F> {
    /// A default computed by `provider`, used when the entry is missing.
    pub fn with<P>(provider: P) -> Self
    where
        P: Fn(&T) -> F + Send + Sync + 'static,
    {
        DefaultRule::from_check(Check::Inline(Arc::new(provider)))
    }

    /// A default provided by a named provider.
    pub fn named(name: &str) -> Self {
        DefaultRule::from_check(Check::named(name))
    }

    /// A default provided by a named provider of a companion type.
    pub fn named_in<P: RuleProvider>(name: &str) -> Self {
        DefaultRule::from_check(Check::named_in::<P>(name))
    }

    pub fn from_check(provider: Check<ValueProvider<T, F>>) -> Self {
        DefaultRule {
            provider,
            when: vec![WhenValue::IsMissing],
        }
    }

    /// Replaces the triggers.
    #[must_use]
    pub fn when(mut self, when: &[WhenValue]) -> Self {
        self.when = when.to_vec();
        self
    }
}

/// One block of rules for a member.
#[derive(Clone, Debug)]
pub struct RuleSet<T, F> {
    key: Option<String>,
    comments: Vec<String>,
    defaults: Vec<DefaultRule<T, F>>,
    skip: Vec<SkipIf<T>>,
    skip_serializing_if: Vec<SkipIf<T>>,
    skip_deserializing_if: Vec<SkipIf<T>>,
    asserts: Vec<AssertThat<T, F>>,
}

impl<T, F> Default for RuleSet<T, F> {
    fn default() -> Self {
        RuleSet {
            key: None,
            comments: Vec::new(),
            defaults: Vec::new(),
            skip: Vec::new(),
            skip_serializing_if: Vec::new(),
            skip_deserializing_if: Vec::new(),
            asserts: Vec::new(),
        }
    }
}

impl<T, F> RuleSet<T, F> {
    #[must_use]
    pub fn new() -> Self {
        RuleSet::default()
    }

    /// Sets the config key, overriding the naming strategy.
    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.key = Some(key.to_string());
        self
    }

    /// Adds a comment line, written when serializing.
    #[must_use]
    pub fn comment(mut self, line: &str) -> Self {
        self.comments.push(line.to_string());
        self
    }

    /// Adds a default value used when the entry is missing.
    #[must_use]
    pub fn default_value<P>(self, provider: P) -> Self
    where
        P: Fn(&T) -> F + Send + Sync + 'static,
    {
        self.default_rule(DefaultRule::with(provider))
    }

    /// Adds a default value from the named provider, used when the entry is missing.
    #[must_use]
    pub fn default_named(self, name: &str) -> Self {
        self.default_rule(DefaultRule::named(name))
    }

    #[must_use]
    pub fn default_rule(mut self, rule: DefaultRule<T, F>) -> Self {
        self.defaults.push(rule);
        self
    }

    /// Adds a skip rule applied in both directions.
    #[must_use]
    pub fn skip(mut self, rule: SkipIf<T>) -> Self {
        self.skip.push(rule);
        self
    }

    #[must_use]
    pub fn skip_serializing_if(mut self, rule: SkipIf<T>) -> Self {
        self.skip_serializing_if.push(rule);
        self
    }

    #[must_use]
    pub fn skip_deserializing_if(mut self, rule: SkipIf<T>) -> Self {
        self.skip_deserializing_if.push(rule);
        self
    }

    #[must_use]
    pub fn assert_that(mut self, rule: AssertThat<T, F>) -> Self {
        self.asserts.push(rule);
        self
    }

    fn skip_rules(&self, direction: Direction) -> impl Iterator<Item = &SkipIf<T>> {
        let specific = match direction {
            Direction::Serialize => &self.skip_serializing_if,
            Direction::Deserialize => &self.skip_deserializing_if,
        };
        self.skip.iter().chain(specific)
    }
}

/// All rules of a member: an optional consolidated block, consulted first,
/// and the standalone rules.
#[derive(Clone, Debug)]
pub struct FieldRules<T, F> {
    consolidated: Option<RuleSet<T, F>>,
    standalone: RuleSet<T, F>,
    transient: bool,
}

impl<T, F> Default for FieldRules<T, F> {
    fn default() -> Self {
        FieldRules {
            consolidated: None,
            standalone: RuleSet::default(),
            transient: false,
        }
    }
}

impl<T, F> FieldRules<T, F> {
    #[must_use]
    pub fn new() -> Self {
        FieldRules::default()
    }

    #[must_use]
    pub fn key(mut self, key: &str) -> Self {
        self.standalone = self.standalone.key(key);
        self
    }

    #[must_use]
    pub fn comment(mut self, line: &str) -> Self {
        self.standalone = self.standalone.comment(line);
        self
    }

    #[must_use]
    pub fn default_value<P>(mut self, provider: P) -> Self
    where
        P: Fn(&T) -> F + Send + Sync + 'static,
    {
        self.standalone = self.standalone.default_value(provider);
        self
    }

    #[must_use]
    pub fn default_named(mut self, name: &str) -> Self {
        self.standalone = self.standalone.default_named(name);
        self
    }

    #[must_use]
    pub fn default_rule(mut self, rule: DefaultRule<T, F>) -> Self {
        self.standalone = self.standalone.default_rule(rule);
        self
    }

    #[must_use]
    pub fn skip(mut self, rule: SkipIf<T>) -> Self {
        self.standalone = self.standalone.skip(rule);
        self
    }

    #[must_use]
    pub fn skip_serializing_if(mut self, rule: SkipIf<T>) -> Self {
        self.standalone = self.standalone.skip_serializing_if(rule);
        self
    }

    #[must_use]
    pub fn skip_deserializing_if(mut self, rule: SkipIf<T>) -> Self {
        self.standalone = self.standalone.skip_deserializing_if(rule);
        self
    }

    #[must_use]
    pub fn assert_that(mut self, rule: AssertThat<T, F>) -> Self {
        self.standalone = self.standalone.assert_that(rule);
        self
    }

    /// Marks the member transient. Transient members are ignored while
    /// [`SerdeOptions::apply_transient_modifier`](crate::SerdeOptions) is on.
    #[must_use]
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// Sets the consolidated block, consulted before the standalone rules.
    ///
    /// ```rust
    /// use cfgtree::rules::{FieldRules, SkipIf};
    ///
    /// # struct User;
    /// let rules: FieldRules<User, String> = FieldRules::new()
    ///     .key("fallback")
    ///     .config(|c| c.key("user-name").comment("Display name").skip(SkipIf::IsEmpty));
    /// ```
    #[must_use]
    pub fn config(mut self, build: impl FnOnce(RuleSet<T, F>) -> RuleSet<T, F>) -> Self {
        self.consolidated = Some(build(self.consolidated.take().unwrap_or_default()));
        self
    }

    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    fn sets(&self) -> impl Iterator<Item = &RuleSet<T, F>> {
        self.consolidated
            .iter()
            .chain(std::iter::once(&self.standalone))
    }

    pub(crate) fn resolve_key(&self, name: &str, naming: &dyn NamingStrategy) -> String {
        self.sets()
            .find_map(|set| set.key.clone())
            .unwrap_or_else(|| naming.transform_name(name))
    }

    pub(crate) fn resolve_comment(&self) -> Option<String> {
        self.sets()
            .find(|set| !set.comments.is_empty())
            .map(|set| set.comments.join("\n"))
    }
}

impl<T: 'static, F: ConfigType> FieldRules<T, F> {
    pub(crate) fn should_skip(
        &self,
        direction: Direction,
        observed: Observed<'_>,
        instance: &T,
        scope: &Scope<'_>,
    ) -> Result<bool> {
        let mut skip = false;
        // every rule is resolved so broken references surface
        for rule in self.sets().flat_map(|set| set.skip_rules(direction)) {
            if skip_matches(rule, direction, observed, instance, scope)? {
                skip = true;
            }
        }
        Ok(skip)
    }

    pub(crate) fn find_default(
        &self,
        observed: Observed<'_>,
        instance: &T,
        scope: &Scope<'_>,
    ) -> Result<Option<F>> {
        let mut rule = None;
        'rules: for candidate in self.sets().flat_map(|set| set.defaults.iter()) {
            for when in &candidate.when {
                if observed.triggers(*when)? {
                    rule = Some(candidate);
                    break 'rules;
                }
            }
        }
        match rule {
            Some(rule) => {
                let value = match scope.resolve::<ValueProvider<T, F>, SharedValueProvider<F>>(
                    &rule.provider,
                    "default value provider",
                )? {
                    Resolved::Instance(provide) => provide(instance),
                    Resolved::Shared(provide) => provide(),
                };
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub(crate) fn check_asserts(&self, value: &F, instance: &T, scope: &Scope<'_>) -> Result<()> {
        for rule in self.sets().flat_map(|set| set.asserts.iter()) {
            let holds = match rule {
                AssertThat::NotNull => !value.is_null(),
                AssertThat::NotEmpty => !value.is_null() && value.is_empty() != Some(true),
                AssertThat::Custom(check) => {
                    match scope.resolve::<AssertPredicate<T, F>, SharedAssertPredicate<F>>(
                        check,
                        "assertion",
                    )? {
                        Resolved::Instance(assert) => assert(instance, value),
                        Resolved::Shared(assert) => assert(value),
                    }
                }
            };
            if !holds {
                return Err(Error::assertion(scope.member, scope.declaring_type, value));
            }
        }
        Ok(())
    }
}

fn skip_matches<T: 'static>(
    rule: &SkipIf<T>,
    direction: Direction,
    observed: Observed<'_>,
    instance: &T,
    scope: &Scope<'_>,
) -> Result<bool> {
    let matched = match rule {
        SkipIf::Always => true,
        SkipIf::IsMissing => observed.is_absent(),
        SkipIf::IsNull => {
            observed.is_null() || (direction == Direction::Deserialize && observed.is_absent())
        }
        SkipIf::IsEmpty => observed.is_empty()?,
        SkipIf::Custom(check) => {
            match scope.resolve::<SkipPredicate<T>, SharedSkipPredicate>(check, "skip predicate")? {
                Resolved::Instance(skip) => skip(instance, observed.as_entry()?),
                Resolved::Shared(skip) => skip(observed.as_entry()?),
            }
        }
    };
    Ok(matched)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Serialize,
    Deserialize,
}

/// The state of a member value as seen by skip and default rules.
#[derive(Clone, Copy)]
pub(crate) enum Observed<'v> {
    /// A tree entry, when deserializing.
    Entry(Entry<'v>),
    /// A member value, when serializing. Its native form is only computed
    /// when a rule needs it.
    Member {
        null: bool,
        empty: Option<bool>,
        native: &'v LazyNative<'v>,
    },
}

impl<'v> Observed<'v> {
    pub(crate) fn entry(entry: Entry<'v>) -> Self {
        Observed::Entry(entry)
    }

    pub(crate) fn member<F: ConfigType>(value: &F, native: &'v LazyNative<'v>) -> Self {
        Observed::Member {
            null: value.is_null(),
            empty: value.is_empty(),
            native,
        }
    }

    fn is_absent(&self) -> bool {
        matches!(self, Observed::Entry(Entry::Absent))
    }

    fn is_null(&self) -> bool {
        match self {
            Observed::Entry(entry) => entry.is_null(),
            Observed::Member { null, .. } => *null,
        }
    }

    /// Null values are never empty.
    fn is_empty(&self) -> Result<bool> {
        match *self {
            Observed::Entry(entry) => Ok(entry.is_empty()),
            Observed::Member { null: true, .. } => Ok(false),
            Observed::Member {
                empty: Some(empty), ..
            } => Ok(empty),
            Observed::Member { native, .. } => Ok(native.get()?.is_empty() == Some(true)),
        }
    }

    fn as_entry(&self) -> Result<Entry<'v>> {
        match *self {
            Observed::Entry(entry) => Ok(entry),
            Observed::Member { null: true, .. } => Ok(Entry::Null),
            Observed::Member { native, .. } => Ok(Entry::of(Some(native.get()?))),
        }
    }

    fn triggers(&self, when: WhenValue) -> Result<bool> {
        match when {
            WhenValue::IsMissing => Ok(self.is_absent()),
            WhenValue::IsNull => Ok(self.is_null()),
            WhenValue::IsEmpty => self.is_empty(),
        }
    }
}

impl fmt::Debug for Observed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observed::Entry(entry) => f.debug_tuple("Entry").field(entry).finish(),
            Observed::Member { null, empty, .. } => f
                .debug_struct("Member")
                .field("null", null)
                .field("empty", empty)
                .finish(),
        }
    }
}

/// The native form of a member value, computed at most once.
pub(crate) struct LazyNative<'a> {
    cell: OnceCell<ConfigValue>,
    compute: &'a dyn Fn() -> Result<ConfigValue>,
}

impl<'a> LazyNative<'a> {
    pub(crate) fn new(compute: &'a dyn Fn() -> Result<ConfigValue>) -> Self {
        LazyNative {
            cell: OnceCell::new(),
            compute,
        }
    }

    pub(crate) fn get(&self) -> Result<&ConfigValue> {
        if let Some(native) = self.cell.get() {
            return Ok(native);
        }
        let native = (self.compute)()?;
        Ok(self.cell.get_or_init(|| native))
    }

    /// Takes the native form, computing it if no rule did.
    pub(crate) fn into_value(self) -> Result<ConfigValue> {
        match self.cell.into_inner() {
            Some(native) => Ok(native),
            None => (self.compute)(),
        }
    }
}

/// Named closures, keyed by name. A name may hold several closures of
/// different shapes; lookups pick the one matching the requested shape.
#[derive(Clone, Default)]
pub struct RuleTable {
    owner: String,
    entries: HashMap<String, Vec<Arc<dyn Any + Send + Sync>>>,
}

pub(crate) enum Lookup<C> {
    Found(C),
    WrongShape,
    NotFound,
}

impl RuleTable {
    pub fn new(owner: &str) -> Self {
        RuleTable {
            owner: owner.to_string(),
            entries: HashMap::new(),
        }
    }

    pub(crate) fn set_owner(&mut self, owner: &str) {
        self.owner = owner.to_string();
    }

    /// The type the table belongs to.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Registers `candidate` under `name`.
    pub fn insert<C: Any + Send + Sync>(&mut self, name: &str, candidate: C) -> &mut Self {
        self.entries
            .entry(name.to_string())
            .or_default()
            .push(Arc::new(candidate));
        self
    }

    /// Registers a skip predicate on the raw entry.
    #[must_use]
    pub fn skip_predicate<P>(mut self, name: &str, predicate: P) -> Self
    where
        P: Fn(Entry<'_>) -> bool + Send + Sync + 'static,
    {
        let predicate: SharedSkipPredicate = Arc::new(predicate);
        self.insert(name, predicate);
        self
    }

    /// Registers an assertion on values of type `F`.
    #[must_use]
    pub fn assertion<F, P>(mut self, name: &str, predicate: P) -> Self
    where
        F: 'static,
        P: Fn(&F) -> bool + Send + Sync + 'static,
    {
        let predicate: SharedAssertPredicate<F> = Arc::new(predicate);
        self.insert(name, predicate);
        self
    }

    /// Registers a provider of default values of type `F`.
    #[must_use]
    pub fn provider<F, P>(mut self, name: &str, provider: P) -> Self
    where
        F: 'static,
        P: Fn() -> F + Send + Sync + 'static,
    {
        let provider: SharedValueProvider<F> = Arc::new(provider);
        self.insert(name, provider);
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn lookup<C: Any + Clone>(&self, name: &str) -> Lookup<C> {
        match self.entries.get(name) {
            Some(candidates) => candidates
                .iter()
                .find_map(|c| c.downcast_ref::<C>().cloned())
                .map_or(Lookup::WrongShape, Lookup::Found),
            None => Lookup::NotFound,
        }
    }
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("RuleTable")
            .field("owner", &self.owner)
            .field("names", &names)
            .finish()
    }
}

pub(crate) enum Resolved<I, S> {
    Instance(I),
    Shared(S),
}

/// Identity of the member being processed, and the table its named rules
/// resolve against.
pub(crate) struct Scope<'r> {
    pub(crate) member: &'r str,
    pub(crate) declaring_type: &'r str,
    table: &'r RuleTable,
}

impl<'r> Scope<'r> {
    pub(crate) fn new(member: &'r str, declaring_type: &'r str, table: &'r RuleTable) -> Self {
        Scope {
            member,
            declaring_type,
            table,
        }
    }

    fn error(&self, msg: String) -> Error {
        Error::rule_resolution(self.member, self.declaring_type, msg)
    }

    fn resolve<I, S>(&self, check: &Check<I>, what: &str) -> Result<Resolved<I, S>>
    where
        I: Any + Clone,
        S: Any + Clone,
    {
        let (name, companion) = match check {
            Check::Inline(f) => return Ok(Resolved::Instance(f.clone())),
            Check::Unset => {
                return Err(self.error(format!("custom {} without a name or closure", what)))
            }
            Check::Named { name, companion } => (name, companion),
        };

        let mut wrong_shape = false;
        match self.table.lookup::<I>(name) {
            Lookup::Found(f) => return Ok(Resolved::Instance(f)),
            Lookup::WrongShape => wrong_shape = true,
            Lookup::NotFound => {}
        }
        if let Some(companion) = companion {
            match companion.table().lookup::<S>(name) {
                Lookup::Found(f) => return Ok(Resolved::Shared(f)),
                Lookup::WrongShape => wrong_shape = true,
                Lookup::NotFound => {}
            }
        }

        let searched = match companion {
            Some(companion) => format!("{} or {}", self.table.owner(), companion.name()),
            None => self.table.owner().to_string(),
        };
        let msg = if wrong_shape {
            format!(
                "`{}` in {} is not a {} applicable to this field",
                name, searched, what
            )
        } else {
            format!("no {} named `{}` in {}", what, name, searched)
        };
        Err(self.error(msg))
    }
}
