//! Ordered, commented map type for config trees.
//!
//! This module provides [`ConfigMap`], a wrapper around [`IndexMap`] that keeps
//! entries in insertion order and carries an optional comment per key. Nested
//! trees are [`ConfigMap`]s too, so comments written for nested members travel
//! with the subtree they belong to.
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::{ConfigMap, ConfigValue};
//!
//! let mut map = ConfigMap::new();
//! map.insert("name".to_string(), ConfigValue::from("Alice"));
//! map.insert_comment("name", "The user name".to_string());
//!
//! assert_eq!(map.len(), 1);
//! assert_eq!(map.comment("name"), Some("The user name"));
//! ```

use crate::ConfigValue;
use indexmap::IndexMap;
use std::collections::HashMap;

/// An ordered map of string keys to config values, with per-key comments.
///
/// # Examples
///
/// ```rust
/// use cfgtree::{ConfigMap, ConfigValue};
///
/// let mut map = ConfigMap::new();
/// map.insert("first".to_string(), ConfigValue::from(1));
/// map.insert("second".to_string(), ConfigValue::from(2));
///
/// let keys: Vec<_> = map.keys().cloned().collect();
/// assert_eq!(keys, vec!["first", "second"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigMap {
    entries: IndexMap<String, ConfigValue>,
    comments: IndexMap<String, String>,
}

impl ConfigMap {
    /// Creates an empty `ConfigMap`.
    #[must_use]
    pub fn new() -> Self {
        ConfigMap::default()
    }

    /// Creates an empty `ConfigMap` with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ConfigMap {
            entries: IndexMap::with_capacity(capacity),
            comments: IndexMap::new(),
        }
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contained this key, the old value is returned and the
    /// key keeps its position.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::{ConfigMap, ConfigValue};
    ///
    /// let mut map = ConfigMap::new();
    /// assert!(map.insert("key".to_string(), ConfigValue::from(42)).is_none());
    /// assert!(map.insert("key".to_string(), ConfigValue::from(43)).is_some());
    /// ```
    pub fn insert(&mut self, key: String, value: ConfigValue) -> Option<ConfigValue> {
        self.entries.insert(key, value)
    }

    /// Returns a reference to the value corresponding to the key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    /// Returns a mutable reference to the value corresponding to the key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.entries.get_mut(key)
    }

    /// Removes a key and its comment, preserving the order of the other entries.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.comments.shift_remove(key);
        self.entries.shift_remove(key)
    }

    /// Returns `true` if the map contains a value (possibly the null marker) for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Returns the comment attached to `key`, if any.
    #[must_use]
    pub fn comment(&self, key: &str) -> Option<&str> {
        self.comments.get(key).map(String::as_str)
    }

    /// Attaches a comment to `key`, returning the previous one.
    ///
    /// The key does not need to hold a value yet.
    pub fn insert_comment(&mut self, key: &str, comment: String) -> Option<String> {
        self.comments.insert(key.to_string(), comment)
    }

    /// Removes the comment attached to `key`.
    pub fn remove_comment(&mut self, key: &str) -> Option<String> {
        self.comments.shift_remove(key)
    }

    /// Returns an iterator over `(key, comment)` pairs, in insertion order.
    pub fn comments(&self) -> indexmap::map::Iter<'_, String, String> {
        self.comments.iter()
    }

    /// Returns the number of entries in the map.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map contains no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, String, ConfigValue> {
        self.entries.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, String, ConfigValue> {
        self.entries.values()
    }

    /// Returns a mutable iterator over the values of the map, in insertion order.
    pub fn values_mut(&mut self) -> indexmap::map::ValuesMut<'_, String, ConfigValue> {
        self.entries.values_mut()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, ConfigValue> {
        self.entries.iter()
    }
}

impl From<HashMap<String, ConfigValue>> for ConfigMap {
    fn from(map: HashMap<String, ConfigValue>) -> Self {
        map.into_iter().collect()
    }
}

impl From<ConfigMap> for HashMap<String, ConfigValue> {
    fn from(map: ConfigMap) -> Self {
        map.entries.into_iter().collect()
    }
}

impl IntoIterator for ConfigMap {
    type Item = (String, ConfigValue);
    type IntoIter = indexmap::map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConfigMap {
    type Item = (&'a String, &'a ConfigValue);
    type IntoIter = indexmap::map::Iter<'a, String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigMap {
    fn from_iter<T: IntoIterator<Item = (String, ConfigValue)>>(iter: T) -> Self {
        ConfigMap {
            entries: IndexMap::from_iter(iter),
            comments: IndexMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_drops_comment() {
        let mut map = ConfigMap::new();
        map.insert("a".to_string(), ConfigValue::from(1));
        map.insert("b".to_string(), ConfigValue::from(2));
        map.insert_comment("a", "first".to_string());

        assert_eq!(map.remove("a"), Some(ConfigValue::from(1)));
        assert_eq!(map.comment("a"), None);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_null_marker_is_contained() {
        let mut map = ConfigMap::new();
        map.insert("a".to_string(), ConfigValue::Null);
        assert!(map.contains_key("a"));
        assert!(!map.contains_key("b"));
    }

    #[test]
    fn test_from_iter_keeps_order() {
        let map: ConfigMap = vec![
            ("z".to_string(), ConfigValue::from(1)),
            ("a".to_string(), ConfigValue::from(2)),
        ]
        .into_iter()
        .collect();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["z", "a"]);
    }
}
