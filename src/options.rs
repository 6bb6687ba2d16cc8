//! Options shared by serialization and deserialization.
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::naming::KebabCase;
//! use cfgtree::SerdeOptions;
//!
//! let options = SerdeOptions::new()
//!     .with_naming_strategy(KebabCase)
//!     .with_transient_modifier(false);
//! assert_eq!(options.naming_strategy().transform_name("maxSize"), "max-size");
//! assert!(!options.apply_transient_modifier);
//! ```

use crate::naming::{Identity, NamingStrategy};
use std::fmt;
use std::sync::Arc;

/// Options for mapping objects to config trees.
///
/// Members without an explicit key are named by the naming strategy, which
/// defaults to [`Identity`]. Members marked transient are ignored unless
/// `apply_transient_modifier` is turned off.
#[derive(Clone)]
pub struct SerdeOptions {
    naming_strategy: Arc<dyn NamingStrategy>,
    pub apply_transient_modifier: bool,
}

impl Default for SerdeOptions {
    fn default() -> Self {
        SerdeOptions {
            naming_strategy: Arc::new(Identity),
            apply_transient_modifier: true,
        }
    }
}

impl SerdeOptions {
    /// Creates default options (identity naming, transient members ignored).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::SerdeOptions;
    ///
    /// let options = SerdeOptions::new();
    /// assert!(options.apply_transient_modifier);
    /// assert_eq!(options.naming_strategy().transform_name("maxSize"), "maxSize");
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the naming strategy used for members without an explicit key.
    #[must_use]
    pub fn with_naming_strategy<N: NamingStrategy + 'static>(mut self, strategy: N) -> Self {
        self.naming_strategy = Arc::new(strategy);
        self
    }

    /// Sets whether members marked transient are ignored.
    #[must_use]
    pub fn with_transient_modifier(mut self, apply: bool) -> Self {
        self.apply_transient_modifier = apply;
        self
    }

    #[must_use]
    pub fn naming_strategy(&self) -> &dyn NamingStrategy {
        self.naming_strategy.as_ref()
    }
}

impl fmt::Debug for SerdeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerdeOptions")
            .field("naming_strategy", &"..")
            .field("apply_transient_modifier", &self.apply_transient_modifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::SnakeCase;

    #[test]
    fn test_default_options() {
        let options = SerdeOptions::default();
        assert!(options.apply_transient_modifier);
        assert_eq!(options.naming_strategy().transform_name("userName"), "userName");
    }

    #[test]
    fn test_builder_chain() {
        let options = SerdeOptions::new()
            .with_naming_strategy(SnakeCase)
            .with_transient_modifier(false);
        assert!(!options.apply_transient_modifier);
        assert_eq!(options.naming_strategy().transform_name("userName"), "user_name");

        let cloned = options.clone();
        assert_eq!(cloned.naming_strategy().transform_name("a1B"), "a1_b");
    }
}
