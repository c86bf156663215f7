//! Type references resolved to zero-argument constructors.
//!
//! Declarations refer to input types and comparer types by value; each reference carries the type's
//! display name and a constructor, so the engine can build a fresh object for every unit or check
//! without runtime type lookup.

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::compare::Comparer;

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    // Drop any generic arguments before taking the last path segment
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Reference to an input-object type, default-constructed fresh for each InputCase unit.
#[derive(Clone, Copy)]
pub struct InputType {
    name: &'static str,
    type_id: fn() -> TypeId,
    construct: fn() -> Box<dyn Any>,
}

impl InputType {
    pub fn of<I: Default + Any>() -> Self {
        Self {
            name: short_type_name::<I>(),
            type_id: TypeId::of::<I>,
            construct: || Box::new(I::default()) as Box<dyn Any>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Construct a new, default-initialized input object.
    pub fn instantiate(&self) -> Box<dyn Any> {
        (self.construct)()
    }
}

impl fmt::Debug for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InputType").field(&self.name).finish()
    }
}

/// Reference to a custom comparer type, instantiated once per check.
#[derive(Clone, Copy)]
pub struct ComparerType {
    name: &'static str,
    construct: fn() -> Box<dyn Comparer>,
}

impl ComparerType {
    pub fn of<C: Comparer + Default + 'static>() -> Self {
        Self {
            name: short_type_name::<C>(),
            construct: || Box::new(C::default()) as Box<dyn Comparer>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn instantiate(&self) -> Box<dyn Comparer> {
        (self.construct)()
    }
}

impl fmt::Debug for ComparerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComparerType").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::SequenceComparer;

    #[derive(Default)]
    struct Sample {
        value: i64,
    }

    #[test]
    fn test_input_type_builds_fresh_objects() {
        let ty = InputType::of::<Sample>();
        assert_eq!(ty.name(), "Sample");
        assert_eq!(ty.type_id(), TypeId::of::<Sample>());

        let mut first = ty.instantiate();
        if let Some(sample) = first.downcast_mut::<Sample>() {
            sample.value = 9;
        }
        let second = ty.instantiate();
        assert_eq!(second.downcast_ref::<Sample>().map(|s| s.value), Some(0));
    }

    #[test]
    fn test_comparer_type_name() {
        let ty = ComparerType::of::<SequenceComparer>();
        assert_eq!(ty.name(), "SequenceComparer");
        assert_eq!(format!("{ty:?}"), "ComparerType(\"SequenceComparer\")");
    }
}
