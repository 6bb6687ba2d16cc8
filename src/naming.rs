//! Naming strategies, turning member names into config keys.
//!
//! A strategy is only consulted for members without an explicit key. Every
//! strategy is total: empty names come back unchanged.
//!
//! ```rust
//! use cfgtree::naming::{CamelCase, KebabCase, NamingStrategy, SnakeCase};
//!
//! assert_eq!(SnakeCase.transform_name("maxConnections"), "max_connections");
//! assert_eq!(KebabCase.transform_name("maxConnections"), "max-connections");
//! assert_eq!(CamelCase.transform_name("max_connections"), "maxConnections");
//! ```

/// Maps a member name to a config key.
///
/// Any `Fn(&str) -> String + Send + Sync` closure is a strategy too.
pub trait NamingStrategy: Send + Sync {
    fn transform_name(&self, name: &str) -> String;

    /// Transforms an optional name; `None` stays `None`.
    fn transform_optional(&self, name: Option<&str>) -> Option<String> {
        name.map(|n| self.transform_name(n))
    }
}

impl<F> NamingStrategy for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn transform_name(&self, name: &str) -> String {
        self(name)
    }
}

/// Keeps names as they are.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl NamingStrategy for Identity {
    fn transform_name(&self, name: &str) -> String {
        name.to_string()
    }
}

/// `userName` → `user_name`. Runs of capitals stay one word: `HTTPMethod` → `httpmethod`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCase;

impl NamingStrategy for SnakeCase {
    fn transform_name(&self, name: &str) -> String {
        separate_words(name, '_')
    }
}

/// `userName` → `user-name`. Runs of capitals stay one word: `HTTPMethod` → `httpmethod`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KebabCase;

impl NamingStrategy for KebabCase {
    fn transform_name(&self, name: &str) -> String {
        separate_words(name, '-')
    }
}

fn separate_words(name: &str, separator: char) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut last_was_upper = false;
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !last_was_upper {
                out.push(separator);
            }
            out.extend(c.to_lowercase());
            last_was_upper = true;
        } else {
            out.push(c);
            last_was_upper = false;
        }
    }
    out
}

/// `user_name` → `userName`, `HTTPMethod` → `httpMethod`.
///
/// Characters that are neither letters nor digits separate words and are
/// dropped. A capital inside a word is kept only when a lowercase letter follows.
#[derive(Debug, Clone, Copy, Default)]
pub struct CamelCase;

impl NamingStrategy for CamelCase {
    fn transform_name(&self, name: &str) -> String {
        let chars: Vec<char> = name.chars().collect();
        let mut out = String::with_capacity(name.len());
        let mut first = true;
        let mut upper_next = false;

        for (i, &c) in chars.iter().enumerate() {
            if !c.is_alphanumeric() {
                upper_next = true;
                continue;
            }
            if first {
                out.extend(c.to_lowercase());
                first = false;
                upper_next = false;
            } else if upper_next {
                out.extend(c.to_uppercase());
                upper_next = false;
            } else if c.is_uppercase() {
                let next_is_lower = chars.get(i + 1).map_or(false, |n| n.is_lowercase());
                if next_is_lower {
                    out.push(c);
                } else {
                    out.extend(c.to_lowercase());
                }
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// `userName` → `UserName`. Only the first character changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PascalCase;

impl NamingStrategy for PascalCase {
    fn transform_name(&self, name: &str) -> String {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(SnakeCase.transform_name("userName"), "user_name");
        assert_eq!(SnakeCase.transform_name("UserName"), "user_name");
        assert_eq!(SnakeCase.transform_name("HTTPMethod"), "httpmethod");
        assert_eq!(SnakeCase.transform_name("already_snake"), "already_snake");
        assert_eq!(SnakeCase.transform_name(""), "");
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(KebabCase.transform_name("userName"), "user-name");
        assert_eq!(KebabCase.transform_name("maxIdleTime"), "max-idle-time");
        assert_eq!(KebabCase.transform_name(""), "");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(CamelCase.transform_name("user_name"), "userName");
        assert_eq!(CamelCase.transform_name("UserName"), "userName");
        assert_eq!(CamelCase.transform_name("HTTPMethod"), "httpMethod");
        assert_eq!(CamelCase.transform_name("max-idle-time"), "maxIdleTime");
        assert_eq!(CamelCase.transform_name("_leading"), "leading");
        assert_eq!(CamelCase.transform_name("_foo"), "foo");
        assert_eq!(CamelCase.transform_name("__foo_bar"), "fooBar");
        assert_eq!(CamelCase.transform_name(""), "");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(PascalCase.transform_name("userName"), "UserName");
        assert_eq!(PascalCase.transform_name("user_name"), "User_name");
        assert_eq!(PascalCase.transform_name(""), "");
    }

    #[test]
    fn test_identity_and_optional() {
        assert_eq!(Identity.transform_name("someName"), "someName");
        assert_eq!(SnakeCase.transform_optional(None), None);
        assert_eq!(
            SnakeCase.transform_optional(Some("someName")),
            Some("some_name".to_string())
        );
    }

    #[test]
    fn test_closure_strategy() {
        let upper = |name: &str| name.to_uppercase();
        assert_eq!(upper.transform_name("port"), "PORT");
    }
}
