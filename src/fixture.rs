//! Fixture lifecycle.
//!
//! Each class binds at most one setup and one cleanup operation. Around every unit of the class,
//! setup runs on the unit's fresh instance before the method call and cleanup runs on the same
//! instance once the unit's outcome has been reported, whatever that outcome was. A fixture that
//! throws or panics is never recovered: it surfaces as a [`FixtureError`] and aborts the run.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::class::{Fixture, TestClass};
use crate::error::{FixtureError, RegistryError};
use crate::exception::Exception;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixturePhase {
    Setup,
    Cleanup,
}

impl fmt::Display for FixturePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixturePhase::Setup => write!(f, "setup"),
            FixturePhase::Cleanup => write!(f, "cleanup"),
        }
    }
}

/// The setup and cleanup operations bound to one class.
#[derive(Debug, Clone, Copy)]
pub struct FixtureBinding<'r> {
    class: &'r str,
    setup: Option<&'r Fixture>,
    cleanup: Option<&'r Fixture>,
}

impl<'r> FixtureBinding<'r> {
    /// Bind the class's fixtures, rejecting a class that declares more than one of either kind.
    pub fn resolve(class: &'r TestClass) -> Result<Self, RegistryError> {
        Ok(Self {
            class: class.name(),
            setup: single(class, FixturePhase::Setup, class.setups())?,
            cleanup: single(class, FixturePhase::Cleanup, class.cleanups())?,
        })
    }

    pub fn has_setup(&self) -> bool {
        self.setup.is_some()
    }

    pub fn has_cleanup(&self) -> bool {
        self.cleanup.is_some()
    }

    pub fn setup(&self, instance: Option<&mut dyn Any>) -> Result<(), FixtureError> {
        self.invoke(FixturePhase::Setup, self.setup, instance)
    }

    pub fn cleanup(&self, instance: Option<&mut dyn Any>) -> Result<(), FixtureError> {
        self.invoke(FixturePhase::Cleanup, self.cleanup, instance)
    }

    /// Run `body` between setup and cleanup on the same instance.
    ///
    /// Cleanup runs whenever setup succeeded, regardless of what `body` produced.
    pub fn around<R>(
        &self,
        instance: &mut Option<Box<dyn Any>>,
        body: impl FnOnce(Option<&mut dyn Any>) -> R,
    ) -> Result<R, FixtureError> {
        self.setup(instance.as_deref_mut())?;
        let outcome = body(instance.as_deref_mut());
        self.cleanup(instance.as_deref_mut())?;
        Ok(outcome)
    }

    fn invoke(
        &self,
        phase: FixturePhase,
        fixture: Option<&Fixture>,
        instance: Option<&mut dyn Any>,
    ) -> Result<(), FixtureError> {
        let Some(fixture) = fixture else {
            return Ok(());
        };
        tracing::trace!(class = self.class, %phase, "running fixture");
        let result = catch_unwind(AssertUnwindSafe(|| fixture.invoke(instance)))
            .unwrap_or_else(|payload| Err(Exception::from_panic(payload)));
        result.map_err(|source| FixtureError {
            class: self.class.to_string(),
            phase,
            source,
        })
    }
}

fn single<'r>(
    class: &TestClass,
    phase: FixturePhase,
    declared: &'r [Fixture],
) -> Result<Option<&'r Fixture>, RegistryError> {
    match declared {
        [] => Ok(None),
        [only] => Ok(Some(only)),
        many => Err(RegistryError::DuplicateFixture {
            class: class.name().to_string(),
            phase,
            count: many.len(),
        }),
    }
}
