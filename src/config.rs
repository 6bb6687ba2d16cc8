//! The config tree contract consumed by the object mapper.
//!
//! A config tree is anything that can look a value up by path, store a value
//! at a path and, optionally, attach a comment to a path. The mapper only ever
//! talks to trees through [`Config`], so concurrent or format-backed trees can
//! be plugged in without touching the mapping logic.
//!
//! Two implementations ship with the crate:
//!
//! - [`ConfigMap`]: ordered and commented
//! - `BTreeMap<String, ConfigValue>`: sorted, without comments
//!
//! ## Absent vs. null
//!
//! Looking a path up yields an [`Entry`], which keeps "no entry", "explicit
//! null" and "a value" apart:
//!
//! ```rust
//! use cfgtree::{Config, ConfigMap, ConfigValue, Entry};
//!
//! let mut tree = ConfigMap::new();
//! tree.set(&["name"], ConfigValue::Null).unwrap();
//!
//! assert!(matches!(tree.get_raw(&["name"]), Entry::Null));
//! assert!(matches!(tree.get_raw(&["other"]), Entry::Absent));
//! ```

use crate::{ConfigMap, ConfigValue, Error, Result};
use std::collections::BTreeMap;

/// The result of looking a path up in a config tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Entry<'a> {
    /// There is no entry at the path.
    Absent,
    /// The path holds the null marker.
    Null,
    /// The path holds a value.
    Present(&'a ConfigValue),
}

impl<'a> Entry<'a> {
    /// Classifies a raw lookup result, mapping the null marker to [`Entry::Null`].
    #[must_use]
    pub fn of(value: Option<&'a ConfigValue>) -> Self {
        match value {
            None => Entry::Absent,
            Some(ConfigValue::Null) => Entry::Null,
            Some(v) => Entry::Present(v),
        }
    }

    /// Returns `true` if there is no entry.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Entry::Absent)
    }

    /// Returns `true` if the entry holds the null marker.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Entry::Null)
    }

    /// Returns `true` if the entry holds an empty string, list or tree.
    ///
    /// Absent and null entries are never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Entry::Present(v) => v.is_empty() == Some(true),
            _ => false,
        }
    }

    /// Returns the value, if the entry holds one.
    #[must_use]
    pub fn value(&self) -> Option<&'a ConfigValue> {
        match self {
            Entry::Present(v) => Some(v),
            _ => None,
        }
    }
}

impl std::fmt::Display for Entry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Entry::Absent => write!(f, "<absent>"),
            Entry::Null => write!(f, "null"),
            Entry::Present(v) => write!(f, "{}", v),
        }
    }
}

/// A path-addressed hierarchical value store with optional comments.
///
/// Paths are sequences of keys; splitting a dotted string into a path is left
/// to the caller.
pub trait Config {
    /// Looks the value at `path` up.
    fn get_raw(&self, path: &[&str]) -> Entry<'_>;

    /// Stores `value` at `path`, creating intermediate trees as needed, and
    /// returns the previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or an intermediate value is not a tree.
    fn set(&mut self, path: &[&str], value: ConfigValue) -> Result<Option<ConfigValue>>;

    /// Returns `true` if [`Config::set_comment`] stores comments.
    fn supports_comments(&self) -> bool {
        false
    }

    /// Attaches a comment to `path`. Trees without comment support ignore it.
    ///
    /// # Errors
    ///
    /// Returns an error if an intermediate value is not a tree.
    fn set_comment(&mut self, _path: &[&str], _comment: String) -> Result<Option<String>> {
        Ok(None)
    }

    /// Returns the comment attached to `path`, if any.
    fn get_comment(&self, _path: &[&str]) -> Option<&str> {
        None
    }

    /// Returns `true` if `path` holds a value or the null marker.
    fn contains(&self, path: &[&str]) -> bool {
        !self.get_raw(path).is_absent()
    }
}

fn split_last<'p, 'k>(path: &'p [&'k str]) -> Result<(&'k str, &'p [&'k str])> {
    path.split_last()
        .map(|(last, parents)| (*last, parents))
        .ok_or_else(|| Error::path(path, "empty path"))
}

impl ConfigMap {
    fn subtree(&self, parents: &[&str]) -> Option<&ConfigMap> {
        let mut current = self;
        for key in parents {
            current = current.get(key)?.as_config()?;
        }
        Some(current)
    }

    fn subtree_mut(&mut self, path: &[&str], parents: &[&str]) -> Result<&mut ConfigMap> {
        let mut current = self;
        for key in parents {
            if !current.contains_key(key) {
                current.insert((*key).to_string(), ConfigValue::Config(ConfigMap::new()));
            }
            current = current
                .get_mut(key)
                .and_then(ConfigValue::as_config_mut)
                .ok_or_else(|| Error::path(path, &format!("`{}` is not a config", key)))?;
        }
        Ok(current)
    }
}

impl Config for ConfigMap {
    fn get_raw(&self, path: &[&str]) -> Entry<'_> {
        match split_last(path) {
            Ok((key, parents)) => Entry::of(self.subtree(parents).and_then(|m| m.get(key))),
            Err(_) => Entry::Absent,
        }
    }

    fn set(&mut self, path: &[&str], value: ConfigValue) -> Result<Option<ConfigValue>> {
        let (key, parents) = split_last(path)?;
        Ok(self.subtree_mut(path, parents)?.insert(key.to_string(), value))
    }

    fn supports_comments(&self) -> bool {
        true
    }

    fn set_comment(&mut self, path: &[&str], comment: String) -> Result<Option<String>> {
        let (key, parents) = split_last(path)?;
        Ok(self.subtree_mut(path, parents)?.insert_comment(key, comment))
    }

    fn get_comment(&self, path: &[&str]) -> Option<&str> {
        let (key, parents) = split_last(path).ok()?;
        self.subtree(parents)?.comment(key)
    }
}

impl Config for BTreeMap<String, ConfigValue> {
    fn get_raw(&self, path: &[&str]) -> Entry<'_> {
        match path.split_first() {
            None => Entry::Absent,
            Some((first, [])) => Entry::of(self.get(*first)),
            Some((first, rest)) => match self.get(*first) {
                Some(ConfigValue::Config(map)) => map.get_raw(rest),
                _ => Entry::Absent,
            },
        }
    }

    fn set(&mut self, path: &[&str], value: ConfigValue) -> Result<Option<ConfigValue>> {
        match path.split_first() {
            None => Err(Error::path(path, "empty path")),
            Some((first, [])) => Ok(self.insert((*first).to_string(), value)),
            Some((first, rest)) => {
                let child = self
                    .entry((*first).to_string())
                    .or_insert_with(|| ConfigValue::Config(ConfigMap::new()));
                match child.as_config_mut() {
                    Some(map) => map.set(rest, value),
                    None => Err(Error::path(path, &format!("`{}` is not a config", first))),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_states() {
        let mut tree = ConfigMap::new();
        tree.set(&["a"], ConfigValue::from(1)).unwrap();
        tree.set(&["b"], ConfigValue::Null).unwrap();

        assert_eq!(tree.get_raw(&["a"]), Entry::Present(&ConfigValue::from(1)));
        assert_eq!(tree.get_raw(&["b"]), Entry::Null);
        assert_eq!(tree.get_raw(&["c"]), Entry::Absent);
        assert!(tree.contains(&["b"]));
        assert!(!tree.contains(&["c"]));
    }

    #[test]
    fn test_nested_set_creates_trees() {
        let mut tree = ConfigMap::new();
        tree.set(&["server", "port"], ConfigValue::from(8080)).unwrap();
        assert_eq!(
            tree.get_raw(&["server", "port"]).value(),
            Some(&ConfigValue::from(8080))
        );
        assert!(tree.get_raw(&["server"]).value().unwrap().is_config());
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut tree = ConfigMap::new();
        tree.set(&["server"], ConfigValue::from("x")).unwrap();
        let err = tree.set(&["server", "port"], ConfigValue::from(1)).unwrap_err();
        assert!(matches!(err, Error::Path { .. }));
    }

    #[test]
    fn test_empty_path() {
        let mut tree = ConfigMap::new();
        assert!(tree.set(&[], ConfigValue::Null).is_err());
        assert_eq!(tree.get_raw(&[]), Entry::Absent);
    }

    #[test]
    fn test_comments_on_nested_path() {
        let mut tree = ConfigMap::new();
        assert!(tree.supports_comments());
        tree.set_comment(&["db", "url"], "connection string".to_string())
            .unwrap();
        assert_eq!(tree.get_comment(&["db", "url"]), Some("connection string"));
    }

    #[test]
    fn test_btreemap_has_no_comments() {
        let mut tree: BTreeMap<String, ConfigValue> = BTreeMap::new();
        Config::set(&mut tree, &["a", "b"], ConfigValue::from(true)).unwrap();
        assert!(!tree.supports_comments());
        assert_eq!(tree.set_comment(&["a"], "x".to_string()).unwrap(), None);
        assert_eq!(tree.get_comment(&["a"]), None);
        assert_eq!(
            tree.get_raw(&["a", "b"]),
            Entry::Present(&ConfigValue::Bool(true))
        );
    }

    #[test]
    fn test_entry_emptiness() {
        let empty = ConfigValue::from("");
        assert!(Entry::Present(&empty).is_empty());
        assert!(!Entry::Absent.is_empty());
        assert!(!Entry::Null.is_empty());
    }
}
