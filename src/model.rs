//! Metadata model: discovered test units, field expectations and execution results.
//!
//! Units are built once by the registry from static declarations and never mutated afterwards.
//! Results are produced by the engine and handed straight to the reporter.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use crate::exception::{ExceptionType, Thrown};
use crate::factory::{ComparerType, InputType};
use crate::value::Value;

// ============================================================================
// Test units
// ============================================================================

/// What a unit supplies to the method and what it checks.
#[derive(Debug, Clone)]
pub enum UnitKind {
    /// Literal arguments; the return value is compared against `expected`.
    Call { args: Vec<Value>, expected: Value },
    /// One freshly constructed input object; checks a thrown exception or post-call field state.
    Input { input_type: InputType },
}

/// One independently pass/failable check derived from a method and one of its case declarations.
#[derive(Debug, Clone)]
pub struct TestUnit {
    pub class_name: String,
    pub method_name: String,
    /// Index of the method within its class declaration.
    pub method_index: usize,
    pub is_static: bool,
    pub kind: UnitKind,
    pub timeout: Option<Duration>,
    /// Set only on InputCase units.
    pub expected_exception: Option<&'static ExceptionType>,
    /// Set only on CallCase units.
    pub expected_output: Option<String>,
    pub comparer: Option<ComparerType>,
    /// Always false for discovered units: ignored methods produce none.
    pub ignored: bool,
    pub categories: Vec<String>,
}

impl TestUnit {
    /// `Class.method`, the name used in report lines and keyword filters.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.class_name, self.method_name)
    }

    pub fn is_call(&self) -> bool {
        matches!(self.kind, UnitKind::Call { .. })
    }

    pub fn has_category(&self, tag: &str) -> bool {
        self.categories.iter().any(|c| c == tag)
    }
}

impl fmt::Display for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UnitKind::Call { args, expected } => {
                write!(f, "{}.{}(", self.class_name, self.method_name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ") == {expected}")
            }
            UnitKind::Input { input_type } => {
                write!(f, "{}.{}({})", self.class_name, self.method_name, input_type.name())
            }
        }
    }
}

// ============================================================================
// Field expectations
// ============================================================================

pub(crate) type FieldReader = Box<dyn Fn(Option<&dyn Any>) -> Thrown<Value>>;

/// An expected value attached to a field or property of a class, checked by InputCase units against
/// the instance the method ran on.
pub struct FieldExpectation {
    pub(crate) field: String,
    pub(crate) expected: Value,
    pub(crate) comparer: Option<ComparerType>,
    pub(crate) is_static: bool,
    pub(crate) read: FieldReader,
}

impl FieldExpectation {
    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn expected(&self) -> &Value {
        &self.expected
    }

    pub fn comparer(&self) -> Option<&ComparerType> {
        self.comparer.as_ref()
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Read the current value from `instance` (ignored for static fields).
    pub fn read(&self, instance: Option<&dyn Any>) -> Thrown<Value> {
        (self.read)(instance)
    }
}

impl fmt::Debug for FieldExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldExpectation")
            .field("field", &self.field)
            .field("expected", &self.expected)
            .field("comparer", &self.comparer)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Execution results
// ============================================================================

/// Why a unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Return value or field value differs from the expectation.
    AssertionMismatch,
    /// Wall-clock elapsed time went beyond the declared budget.
    TimeoutExceeded,
    /// Thrown during a CallCase, or during an InputCase without an expectation.
    UnexpectedException,
    /// An InputCase declared an exception but nothing was thrown.
    MissingExpectedException,
    /// Captured console text differs from the expected output.
    OutputMismatch,
    /// The thrown exception is neither the expected type nor a subtype of it.
    WrongExceptionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Passed,
    Failed(FailureKind),
}

impl Status {
    pub fn is_passed(&self) -> bool {
        matches!(self, Status::Passed)
    }
}

/// Outcome of one field comparison; rendered on its own line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCheck {
    pub field: String,
    pub passed: bool,
    pub message: String,
}

/// Outcome of running one unit.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub status: Status,
    pub elapsed: Duration,
    pub message: String,
    pub field_checks: Vec<FieldCheck>,
}

impl ExecutionResult {
    pub fn passed(elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            status: Status::Passed,
            elapsed,
            message: message.into(),
            field_checks: Vec::new(),
        }
    }

    pub fn failed(kind: FailureKind, elapsed: Duration, message: impl Into<String>) -> Self {
        Self {
            status: Status::Failed(kind),
            elapsed,
            message: message.into(),
            field_checks: Vec::new(),
        }
    }

    pub fn with_field_checks(mut self, checks: Vec<FieldCheck>) -> Self {
        self.field_checks = checks;
        self
    }

    pub fn is_passed(&self) -> bool {
        self.status.is_passed()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self.status {
            Status::Passed => None,
            Status::Failed(kind) => Some(kind),
        }
    }
}
