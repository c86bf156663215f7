//! Test discovery.
//!
//! The registry owns every declared [`TestClass`] and turns a [`Scope`] into an ordered list of
//! [`TestUnit`]s grouped by class, together with each class's [`FixtureBinding`].
//!
//! ## Eligibility
//!
//! - A run-all scan considers a class only if it is public, concrete and declared by the program.
//!   An explicit-class scope considers the named class regardless of visibility or origin.
//! - A method is considered only if it is public and not ignored.
//! - A method yields one unit per `case` declaration followed by one unit per `with_input`
//!   declaration, in declaration order. A method with neither yields nothing.
//!
//! Discovery is a pure function of the registered declarations: two passes over the same registry
//! produce the same units in the same order.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;

use crate::class::{Class, MethodDecl, TestClass};
use crate::error::RegistryError;
use crate::fixture::FixtureBinding;
use crate::model::{TestUnit, UnitKind};

/// Which classes a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Every eligible class in the program.
    All,
    /// One class, looked up by its declared name.
    Named(String),
    /// One class, looked up by its Rust type.
    Type { id: TypeId, name: &'static str },
}

impl Scope {
    pub fn of<T: 'static>() -> Self {
        Scope::Type {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn is_explicit(&self) -> bool {
        !matches!(self, Scope::All)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::All => write!(f, "all"),
            Scope::Named(name) => write!(f, "{name}"),
            Scope::Type { name, .. } => write!(f, "{name}"),
        }
    }
}

/// Registered test classes, in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    classes: Vec<TestClass>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class declaration.
    pub fn register<T: Default + 'static>(mut self, class: Class<T>) -> Self {
        self.add(class);
        self
    }

    pub fn add<T: Default + 'static>(&mut self, class: Class<T>) {
        self.classes.push(class.into_class());
    }

    pub fn classes(&self) -> &[TestClass] {
        &self.classes
    }

    /// Build the unit list for `scope`.
    #[tracing::instrument(skip_all, fields(scope = %scope, class_count = self.classes.len()))]
    pub fn discover(&self, scope: &Scope) -> Result<Discovery<'_>, RegistryError> {
        self.check_unique_names()?;

        let selected: Vec<&TestClass> = match scope {
            Scope::All => self.classes.iter().filter(|c| c.is_eligible()).collect(),
            Scope::Named(name) => vec![self.find(|c| c.name() == name, name)?],
            Scope::Type { id, name } => vec![self.find(|c| c.type_id() == *id, name)?],
        };

        let mut classes = Vec::with_capacity(selected.len());
        for class in selected {
            let units = units_of(class);
            if class.is_abstract() {
                if let Some(unit) = units.iter().find(|u| !u.is_static) {
                    return Err(RegistryError::AbstractInstance {
                        class: class.name().to_string(),
                        method: unit.method_name.clone(),
                    });
                }
            }
            let fixtures = FixtureBinding::resolve(class)?;
            tracing::debug!(class = class.name(), units = units.len(), "discovered class");
            classes.push(DiscoveredClass {
                class,
                fixtures,
                units,
            });
        }
        Ok(Discovery { classes })
    }

    fn find(&self, predicate: impl Fn(&TestClass) -> bool, name: &str) -> Result<&TestClass, RegistryError> {
        self.classes
            .iter()
            .find(|c| predicate(c))
            .ok_or_else(|| RegistryError::UnknownClass { name: name.to_string() })
    }

    fn check_unique_names(&self) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for class in &self.classes {
            if !seen.insert(class.name()) {
                return Err(RegistryError::DuplicateClass {
                    name: class.name().to_string(),
                });
            }
        }
        Ok(())
    }
}

fn units_of(class: &TestClass) -> Vec<TestUnit> {
    let mut units = Vec::new();
    for (index, method) in class.methods().iter().enumerate() {
        if !method.is_public() {
            continue;
        }
        if method.is_ignored() {
            tracing::debug!(class = class.name(), method = method.name(), "skipping ignored method");
            continue;
        }
        for case in &method.cases {
            units.push(unit_for(
                class,
                index,
                method,
                UnitKind::Call {
                    args: case.args.clone(),
                    expected: case.expected.clone(),
                },
            ));
        }
        for input_type in &method.inputs {
            units.push(unit_for(class, index, method, UnitKind::Input { input_type: *input_type }));
        }
    }
    units
}

fn unit_for(class: &TestClass, method_index: usize, method: &MethodDecl, kind: UnitKind) -> TestUnit {
    let is_call = matches!(kind, UnitKind::Call { .. });
    TestUnit {
        class_name: class.name().to_string(),
        method_name: method.name().to_string(),
        method_index,
        is_static: method.is_static(),
        kind,
        timeout: method.timeout,
        expected_exception: if is_call { None } else { method.expected_exception },
        expected_output: if is_call { method.expected_output.clone() } else { None },
        comparer: method.comparer,
        ignored: false,
        categories: method.categories.clone(),
    }
}

/// The result of one discovery pass.
#[derive(Debug)]
pub struct Discovery<'r> {
    pub classes: Vec<DiscoveredClass<'r>>,
}

impl<'r> Discovery<'r> {
    pub fn unit_count(&self) -> usize {
        self.classes.iter().map(|c| c.units.len()).sum()
    }

    /// All units, class by class.
    pub fn units(&self) -> impl Iterator<Item = &TestUnit> {
        self.classes.iter().flat_map(|c| c.units.iter())
    }
}

/// One class selected by discovery, with its fixtures and units.
#[derive(Debug)]
pub struct DiscoveredClass<'r> {
    pub class: &'r TestClass,
    pub fixtures: FixtureBinding<'r>,
    pub units: Vec<TestUnit>,
}

impl<'r> DiscoveredClass<'r> {
    /// The method declaration a unit was derived from.
    pub fn method_of(&self, unit: &TestUnit) -> Option<&'r MethodDecl> {
        self.class.methods().get(unit.method_index)
    }
}
