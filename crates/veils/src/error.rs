//! Error types for veils
//!
//! Most of these are failures an origin object raises, and wrappers pass
//! them through unchanged. A wrapper builds one itself only for a shape
//! mismatch at its own boundary: calling a plain value, awaiting a
//! synchronous member (or the reverse), or applying a special operator it
//! does not forward. Key functions raise `KeyDerivation`.

use std::fmt;

/// Result type alias for object and wrapper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for member access and invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The object has no member with this name
    NoSuchMember {
        /// Short type name of the object
        type_name: &'static str,
        /// Requested member
        member: String,
    },

    /// A method was read as if it were a property
    NotAProperty {
        /// Short type name of the object
        type_name: &'static str,
        /// Requested member
        member: String,
    },

    /// A plain value was called
    NotCallable {
        /// Kind of the value that was called
        found: &'static str,
    },

    /// A synchronous method was awaited
    NotAwaitable {
        /// Short type name of the object
        type_name: &'static str,
        /// Requested member
        member: String,
    },

    /// A value had the wrong shape for the operation
    TypeMismatch {
        /// Kind the operation needed
        expected: &'static str,
        /// Kind actually found
        found: &'static str,
    },

    /// Call arguments could not be turned into a cache key
    KeyDerivation(String),

    /// The member ran and failed
    Failed(String),
}

impl Error {
    /// Build the "no such member" failure for an object of `type_name`
    pub fn no_such_member(type_name: &'static str, member: &str) -> Self {
        Error::NoSuchMember {
            type_name,
            member: member.to_string(),
        }
    }

    /// Build the failure for reading a method as a property
    pub fn not_a_property(type_name: &'static str, member: &str) -> Self {
        Error::NotAProperty {
            type_name,
            member: member.to_string(),
        }
    }

    /// Build the failure for awaiting a synchronous method
    pub fn not_awaitable(type_name: &'static str, member: &str) -> Self {
        Error::NotAwaitable {
            type_name,
            member: member.to_string(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoSuchMember { type_name, member } => {
                write!(f, "'{}' object has no member '{}'", type_name, member)
            }
            Error::NotAProperty { type_name, member } => {
                write!(f, "'{}.{}' is a method, not a property", type_name, member)
            }
            Error::NotCallable { found } => write!(f, "'{}' value is not callable", found),
            Error::NotAwaitable { type_name, member } => {
                write!(f, "'{}.{}' is synchronous and cannot be awaited", type_name, member)
            }
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            Error::KeyDerivation(msg) => write!(f, "Cannot derive cache key: {}", msg),
            Error::Failed(msg) => write!(f, "Member failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}
