//! Fatal error types.
//!
//! Unit-level failures (mismatches, timeouts, thrown exceptions) are never errors here: the engine
//! classifies them into an [`ExecutionResult`](crate::model::ExecutionResult) and the run goes on.
//! What remains are the conditions that abort a run before or while it executes.

use miette::Diagnostic;
use thiserror::Error;

use crate::exception::Exception;
use crate::fixture::FixturePhase;

/// A declaration problem found while building the unit list.
#[derive(Debug, Error, Diagnostic)]
pub enum RegistryError {
    #[error("class `{class}` declares {count} {phase} fixtures")]
    #[diagnostic(
        code(attest::registry::duplicate_fixture),
        help("declare at most one setup and one cleanup per class")
    )]
    DuplicateFixture {
        class: String,
        phase: FixturePhase,
        count: usize,
    },

    #[error("no test class named `{name}` is registered")]
    #[diagnostic(code(attest::registry::unknown_class))]
    UnknownClass { name: String },

    #[error("class `{class}` is abstract but declares instance method `{method}`")]
    #[diagnostic(
        code(attest::registry::abstract_instance),
        help("an abstract class cannot be instantiated; make the method static or the class concrete")
    )]
    AbstractInstance { class: String, method: String },

    #[error("test class `{name}` is registered more than once")]
    #[diagnostic(code(attest::registry::duplicate_class))]
    DuplicateClass { name: String },
}

/// A setup or cleanup operation threw. Always fatal.
#[derive(Debug, Error, Diagnostic)]
#[error("{phase} fixture of `{class}` failed")]
#[diagnostic(
    code(attest::fixture::failed),
    help("a broken fixture invalidates every result in its class, so the run was aborted")
)]
pub struct FixtureError {
    pub class: String,
    pub phase: FixturePhase,
    #[source]
    pub source: Exception,
}

/// Any error that aborts a run.
#[derive(Debug, Error, Diagnostic)]
pub enum RunError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fixture(#[from] FixtureError),
}
