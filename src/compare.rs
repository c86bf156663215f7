//! Comparator resolution.
//!
//! Every equality judgement the engine makes (return value vs expected, field value vs expected) goes
//! through a [`Comparator`] resolved from an optional comparer binding:
//!
//! - no binding: [`DefaultComparer`], value equality for scalars and identity for reference values
//! - a binding: the bound comparer type is instantiated for this one check and its answer is final,
//!   including for null operands

use crate::factory::ComparerType;
use crate::value::Value;

/// An equality strategy.
pub trait Comparer {
    fn equals(&self, actual: &Value, expected: &Value) -> bool;
}

/// Value equality for scalars, identity for arrays. Two nulls are equal; null against anything else
/// is unequal.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultComparer;

impl Comparer for DefaultComparer {
    fn equals(&self, actual: &Value, expected: &Value) -> bool {
        actual.same_ref(expected)
    }
}

/// Element-wise comparison of two arrays. Anything that is not a pair of arrays is unequal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SequenceComparer;

impl Comparer for SequenceComparer {
    fn equals(&self, actual: &Value, expected: &Value) -> bool {
        match (actual.as_array(), expected.as_array()) {
            (Some(a), Some(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.structural_eq(y)),
            _ => false,
        }
    }
}

/// A resolved equality check.
pub enum Comparator {
    Default(DefaultComparer),
    Custom {
        name: &'static str,
        comparer: Box<dyn Comparer>,
    },
}

impl Comparator {
    /// Resolve the comparator for one check.
    pub fn resolve(binding: Option<&ComparerType>) -> Self {
        match binding {
            Some(ty) => Comparator::Custom {
                name: ty.name(),
                comparer: ty.instantiate(),
            },
            None => Comparator::Default(DefaultComparer),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Comparator::Custom { .. })
    }

    pub fn equals(&self, actual: &Value, expected: &Value) -> bool {
        match self {
            Comparator::Default(default) => default.equals(actual, expected),
            Comparator::Custom { comparer, .. } => comparer.equals(actual, expected),
        }
    }
}

impl std::fmt::Debug for Comparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Comparator::Default(_) => f.write_str("Comparator::Default"),
            Comparator::Custom { name, .. } => write!(f, "Comparator::Custom({name})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Treats everything as equal, nulls included.
    #[derive(Default)]
    struct Anything;

    impl Comparer for Anything {
        fn equals(&self, _actual: &Value, _expected: &Value) -> bool {
            true
        }
    }

    #[test]
    fn test_default_resolution() {
        let cmp = Comparator::resolve(None);
        assert!(!cmp.is_custom());
        assert!(cmp.equals(&Value::from(84), &Value::from(84)));
        assert!(!cmp.equals(&Value::from(84), &Value::from(85)));
    }

    #[test]
    fn test_default_never_panics_on_null() {
        let cmp = Comparator::resolve(None);
        assert!(cmp.equals(&Value::Null, &Value::Null));
        assert!(!cmp.equals(&Value::Null, &Value::from("x")));
        assert!(!cmp.equals(&Value::array([1]), &Value::Null));
    }

    #[test]
    fn test_default_uses_identity_for_arrays() {
        let cmp = Comparator::resolve(None);
        let expected = Value::array([1, 2, 3]);
        assert!(!cmp.equals(&Value::array([1, 2, 3]), &expected));
        assert!(cmp.equals(&expected.clone(), &expected));
    }

    #[test]
    fn test_custom_sequence_comparer() {
        let ty = ComparerType::of::<SequenceComparer>();
        let cmp = Comparator::resolve(Some(&ty));
        assert!(cmp.is_custom());
        assert!(cmp.equals(&Value::array([1, 2, 3]), &Value::array([1, 2, 3])));
        assert!(!cmp.equals(&Value::array([1, 2]), &Value::array([1, 2, 3])));
        assert!(!cmp.equals(&Value::Null, &Value::Null));
    }

    #[test]
    fn test_custom_result_is_authoritative_for_nulls() {
        let ty = ComparerType::of::<Anything>();
        let cmp = Comparator::resolve(Some(&ty));
        assert!(cmp.equals(&Value::Null, &Value::from(1)));
        assert_eq!(format!("{cmp:?}"), "Comparator::Custom(Anything)");
    }
}
