//! Error types for object ⇄ config tree mapping.
//!
//! Every failure aborts the whole `serialize_fields`/`deserialize_fields` call.
//! Member-level errors always name the declaring type, the member and the
//! offending value so a bad configuration file (or a bad object state) can be
//! located immediately.
//!
//! ## Error Categories
//!
//! - **Missing entries**: the tree has no value for a member and no default applies
//! - **Conversions**: no converter accepts a value, or a converter failed
//! - **Assertions**: a member's assertion rejected its value
//! - **Rule resolution**: a named predicate or provider could not be resolved
//!
//! ## Examples
//!
//! ```rust
//! use cfgtree::{Error, ErrorKind};
//!
//! let err = Error::missing_entry("port", "port", "Server");
//! assert_eq!(err.kind(), ErrorKind::MissingEntry);
//! assert!(err.to_string().contains("Server"));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors raised while mapping objects to config trees.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The tree has no entry for a member and no default rule applies.
    #[error("Missing configuration entry `{path}` for field `{member}` declared in {declaring_type}")]
    MissingEntry {
        path: String,
        member: String,
        declaring_type: String,
    },

    /// No applicable converter, or a converter (or tree write) failed.
    #[error("{message}{}", fmt_cause(.cause))]
    Conversion {
        message: String,
        cause: Option<Box<Error>>,
    },

    /// An assertion rule returned false.
    #[error("Field `{declaring_type}::{member}` has an invalid value: {value}")]
    Assertion {
        member: String,
        declaring_type: String,
        value: String,
    },

    /// A named rule reference could not be resolved to a compatible candidate.
    #[error("Cannot resolve rule for field `{declaring_type}::{member}`: {message}")]
    RuleResolution {
        member: String,
        declaring_type: String,
        message: String,
    },

    /// A path could not be written because an intermediate value is not a tree.
    #[error("Invalid path `{path}`: {message}")]
    Path { path: String, message: String },

    /// Custom error, raised through the serde traits
    #[error("Error: {0}")]
    Custom(String),
}

/// The four failure kinds surfaced to callers.
///
/// Path and custom errors only appear inside conversions, so they report
/// [`ErrorKind::Conversion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingEntry,
    Conversion,
    Assertion,
    RuleResolution,
}

impl Error {
    /// Creates a missing-entry error.
    pub fn missing_entry(path: &str, member: &str, declaring_type: &str) -> Self {
        Error::MissingEntry {
            path: path.to_string(),
            member: member.to_string(),
            declaring_type: declaring_type.to_string(),
        }
    }

    /// Creates a conversion error without an underlying cause.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cfgtree::Error;
    ///
    /// let err = Error::conversion("no deserializer for `\"abc\"` into i32");
    /// assert!(err.to_string().contains("i32"));
    /// ```
    pub fn conversion<T: fmt::Display>(msg: T) -> Self {
        Error::Conversion {
            message: msg.to_string(),
            cause: None,
        }
    }

    /// Wraps `source` in a conversion error carrying extra context.
    pub fn wrap<T: fmt::Display>(msg: T, source: Error) -> Self {
        Error::Conversion {
            message: msg.to_string(),
            cause: Some(Box::new(source)),
        }
    }

    /// Creates an assertion error for a member and the value it rejected.
    pub fn assertion<V: fmt::Debug + ?Sized>(member: &str, declaring_type: &str, value: &V) -> Self {
        Error::Assertion {
            member: member.to_string(),
            declaring_type: declaring_type.to_string(),
            value: format!("{:?}", value),
        }
    }

    /// Creates a rule resolution error.
    pub fn rule_resolution<T: fmt::Display>(member: &str, declaring_type: &str, msg: T) -> Self {
        Error::RuleResolution {
            member: member.to_string(),
            declaring_type: declaring_type.to_string(),
            message: msg.to_string(),
        }
    }

    /// Creates a path error.
    pub fn path(path: &[&str], msg: &str) -> Self {
        Error::Path {
            path: path.join("."),
            message: msg.to_string(),
        }
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns the failure kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingEntry { .. } => ErrorKind::MissingEntry,
            Error::Assertion { .. } => ErrorKind::Assertion,
            Error::RuleResolution { .. } => ErrorKind::RuleResolution,
            Error::Conversion { .. } | Error::Path { .. } | Error::Custom(_) => {
                ErrorKind::Conversion
            }
        }
    }

    /// Returns `true` for errors that must propagate without being wrapped
    /// with member context a second time.
    pub(crate) fn is_terminal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Conversion)
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

fn fmt_cause(cause: &Option<Box<Error>>) -> String {
    cause
        .as_ref()
        .map(|c| format!(": {}", c))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
