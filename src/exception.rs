//! Thrown errors and their type hierarchy.
//!
//! Test bodies signal failure by returning `Err(Exception)`. Each exception carries an
//! [`ExceptionType`]; types form a single-inheritance tree rooted at [`EXCEPTION`] so that an
//! expectation on a base type also matches its subtypes.
//!
//! User code declares its own types as statics:
//!
//! ```rust
//! use attest::exception::{ExceptionType, VALUE_ERROR};
//!
//! pub static NEGATIVE_VALUE: ExceptionType = ExceptionType::derived("NegativeValueError", &VALUE_ERROR);
//! assert!(NEGATIVE_VALUE.is_subtype_of(&VALUE_ERROR));
//! ```

use std::any::Any;
use std::fmt;

use thiserror::Error;

/// A node in the exception type hierarchy.
///
/// Type identity is the name; names are expected to be unique within a program.
#[derive(Debug)]
pub struct ExceptionType {
    name: &'static str,
    parent: Option<&'static ExceptionType>,
}

impl ExceptionType {
    /// A root type with no parent. Only [`EXCEPTION`] should normally be a root.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// A type deriving from `parent`.
    pub const fn derived(name: &'static str, parent: &'static ExceptionType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ExceptionType> {
        self.parent
    }

    /// True when `self` is `ancestor` or derives from it, directly or transitively.
    pub fn is_subtype_of(&self, ancestor: &ExceptionType) -> bool {
        if self.name == ancestor.name {
            return true;
        }
        let mut current = self.parent;
        while let Some(ty) = current {
            if ty.name == ancestor.name {
                return true;
            }
            current = ty.parent;
        }
        false
    }
}

impl PartialEq for ExceptionType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ExceptionType {}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ============================================================================
// Builtin exception types
// ============================================================================

pub static EXCEPTION: ExceptionType = ExceptionType::root("Exception");
pub static SYSTEM_ERROR: ExceptionType = ExceptionType::derived("SystemError", &EXCEPTION);
pub static VALUE_ERROR: ExceptionType = ExceptionType::derived("ValueError", &EXCEPTION);
pub static TYPE_ERROR: ExceptionType = ExceptionType::derived("TypeError", &EXCEPTION);
pub static INDEX_ERROR: ExceptionType = ExceptionType::derived("IndexError", &EXCEPTION);
pub static KEY_ERROR: ExceptionType = ExceptionType::derived("KeyError", &EXCEPTION);
pub static ZERO_DIVISION_ERROR: ExceptionType = ExceptionType::derived("ZeroDivisionError", &EXCEPTION);
pub static INVALID_OPERATION: ExceptionType = ExceptionType::derived("InvalidOperationError", &SYSTEM_ERROR);
/// Arguments did not fit the invoked method (count, type, or call style).
pub static ARGUMENT_ERROR: ExceptionType = ExceptionType::derived("ArgumentError", &SYSTEM_ERROR);
/// An instance operation was invoked without an instance.
pub static TARGET_ERROR: ExceptionType = ExceptionType::derived("TargetError", &SYSTEM_ERROR);
/// A Rust panic caught at a unit or fixture boundary.
pub static PANIC: ExceptionType = ExceptionType::derived("Panic", &SYSTEM_ERROR);

/// A thrown error.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct Exception {
    kind: &'static ExceptionType,
    message: String,
}

impl Exception {
    pub fn new(kind: &'static ExceptionType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static ExceptionType {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this exception's runtime type is `expected` or one of its subtypes.
    pub fn is_instance_of(&self, expected: &ExceptionType) -> bool {
        self.kind.is_subtype_of(expected)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(&VALUE_ERROR, message)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(&INVALID_OPERATION, message)
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::new(&ARGUMENT_ERROR, message)
    }

    /// Convert a caught panic payload into a [`PANIC`] exception.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::new(&PANIC, message)
    }
}

/// Result of invoking a declared operation.
pub type Thrown<T> = Result<T, Exception>;
