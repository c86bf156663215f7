//! Field reflection for field expectations.
//!
//! The `Reflect` trait is normally derived with `#[derive(Reflect)]` (from `attest_derive`) on the
//! struct that owns the test methods, so expectations can name fields instead of supplying getters.

use crate::value::Value;

pub use attest_derive::Reflect;

/// Provides by-name access to a type's fields.
///
/// # Examples
///
/// ```rust
/// use attest::reflect::Reflect;
/// use attest::Value;
///
/// #[derive(Default, Reflect)]
/// struct Counter {
///     value: i64,
/// }
///
/// let counter = Counter { value: 3 };
/// assert_eq!(Counter::field_names(), vec!["value"]);
/// assert_eq!(counter.field("value"), Some(Value::Int(3)));
/// assert_eq!(counter.field("missing"), None);
/// ```
pub trait Reflect {
    /// Returns the name of the type.
    fn type_name() -> &'static str;

    /// Returns the names of all reflected fields, in declaration order.
    fn field_names() -> Vec<&'static str>;

    /// Reads a field by name, or `None` when no such field is reflected.
    fn field(&self, name: &str) -> Option<Value>;
}
