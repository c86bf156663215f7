//! Dynamic values carried by test declarations.
//!
//! Literal call arguments, expected results, method return values and field values all travel as a
//! [`Value`]. Scalars behave like value types; arrays are reference values backed by an `Rc`, so two
//! separately allocated arrays are distinct objects even when their contents agree.

use std::fmt;
use std::rc::Rc;

/// A dynamically typed literal.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// Absent value; also what a method without a meaningful return produces.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Reference value: clones share the same allocation.
    Array(Rc<[Value]>),
}

impl Value {
    /// Build a freshly allocated array value.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is a value-like scalar (as opposed to a reference value).
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Array(_))
    }

    /// Name of the runtime type, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Array(_) => "array",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Same object: identical allocation for arrays, equal scalars otherwise.
    pub fn same_ref(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Array(_), _) | (_, Value::Array(_)) => false,
            _ => self.scalar_eq(other),
        }
    }

    /// Structural equality: arrays compare element-wise, recursively.
    pub fn structural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.structural_eq(y))
            }
            _ => self.scalar_eq(other),
        }
    }

    fn scalar_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // NaN is equal to itself, as boxed floating point equality is
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// Structural equality, for use in Rust-side assertions. The engine's default comparator does not
/// use this: see [`crate::compare::DefaultComparer`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(x: f32) -> Self {
        Value::Float(f64::from(x))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

/// Build a `Vec<Value>` from literals: `values![1, 2, "three"]`.
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($item:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($item)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_compare_by_value() {
        assert!(Value::from(84).same_ref(&Value::from(84)));
        assert!(!Value::from(84).same_ref(&Value::from(85)));
        assert!(Value::from("hi").same_ref(&Value::from("hi".to_string())));
    }

    #[test]
    fn test_int_and_float_are_distinct() {
        assert!(!Value::Int(84).structural_eq(&Value::Float(84.0)));
    }

    #[test]
    fn test_nan_equals_nan() {
        assert!(Value::Float(f64::NAN).same_ref(&Value::Float(f64::NAN)));
    }

    #[test]
    fn test_arrays_are_reference_values() {
        let a = Value::array([1, 2, 3]);
        let b = Value::array([1, 2, 3]);
        assert!(!a.same_ref(&b));
        assert!(a.structural_eq(&b));
        assert!(a.same_ref(&a.clone()));
    }

    #[test]
    fn test_null_handling() {
        assert!(Value::Null.same_ref(&Value::Null));
        assert!(!Value::Null.same_ref(&Value::from(0)));
        assert!(!Value::array([1]).same_ref(&Value::Null));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(84).to_string(), "84");
        assert_eq!(Value::from("Hello").to_string(), "Hello");
        assert_eq!(Value::array([1, 2, 3]).to_string(), "[1, 2, 3]");
        assert_eq!(Value::array(Vec::<i64>::new()).to_string(), "[]");
    }

    #[test]
    fn test_values_macro() {
        let args = values![1, "two", true];
        assert_eq!(args.len(), 3);
        assert_eq!(args[1], Value::from("two"));
        assert!(values![].is_empty());
    }
}
