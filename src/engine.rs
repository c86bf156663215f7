//! Execution of a single test unit.
//!
//! The engine invokes the unit's method on an instance prepared by the caller and classifies what
//! happened into an [`ExecutionResult`]. It never propagates a unit failure: thrown exceptions and
//! panics in the method body are caught here. Fixtures are not the engine's concern.
//!
//! ## Precedence
//!
//! CallCase: thrown exception, then output mismatch, then timeout, then return value.
//!
//! InputCase: thrown exception (matched against the expectation) excludes everything else; without
//! one, timeout is checked before a missing expected exception, which is checked before field
//! expectations.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::{Duration, Instant};

use crate::class::{Arguments, MethodDecl};
use crate::compare::Comparator;
use crate::console::OutputCapture;
use crate::exception::{Exception, ExceptionType, Thrown};
use crate::model::{ExecutionResult, FailureKind, FieldCheck, FieldExpectation, TestUnit, UnitKind};
use crate::value::Value;

/// Build the fresh input object an InputCase unit is invoked with, or `None` for a CallCase.
///
/// The runner calls this before the unit's instance is constructed and before setup runs.
pub fn prepare_input(unit: &TestUnit) -> Option<Box<dyn Any>> {
    match &unit.kind {
        UnitKind::Call { .. } => None,
        UnitKind::Input { input_type } => Some(input_type.instantiate()),
    }
}

/// Run `unit` against `instance` (`None` for a static method) and classify the outcome.
///
/// `fields` are the owning class's field expectations; only InputCase units evaluate them.
/// `input` is the object from [`prepare_input`]; an InputCase without one gets a fresh object here.
pub fn execute(
    unit: &TestUnit,
    method: &MethodDecl,
    fields: &[FieldExpectation],
    instance: Option<&mut dyn Any>,
    input: Option<Box<dyn Any>>,
) -> ExecutionResult {
    match &unit.kind {
        UnitKind::Call { args, expected } => run_call(unit, method, instance, args, expected),
        UnitKind::Input { input_type } => {
            let input = input.unwrap_or_else(|| input_type.instantiate());
            run_input(unit, method, fields, instance, input)
        }
    }
}

fn invoke(method: &MethodDecl, instance: Option<&mut dyn Any>, args: Arguments<'_>) -> (Thrown<Value>, Duration) {
    let start = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| method.invoke(instance, args)))
        .unwrap_or_else(|payload| Err(Exception::from_panic(payload)));
    (outcome, start.elapsed())
}

/// Budget check on whole milliseconds.
fn exceeded(elapsed: Duration, budget: Option<Duration>) -> Option<ExecutionResult> {
    let budget = budget?;
    if elapsed.as_millis() > budget.as_millis() {
        Some(ExecutionResult::failed(
            FailureKind::TimeoutExceeded,
            elapsed,
            format!("Timeout exceeded ({} ms > {} ms)", elapsed.as_millis(), budget.as_millis()),
        ))
    } else {
        None
    }
}

// ============================================================================
// CallCase
// ============================================================================

fn run_call(
    unit: &TestUnit,
    method: &MethodDecl,
    instance: Option<&mut dyn Any>,
    args: &[Value],
    expected: &Value,
) -> ExecutionResult {
    // The guard restores the output channel even if the body unwinds
    let capture = unit.expected_output.as_ref().map(|_| OutputCapture::begin());
    let (outcome, elapsed) = invoke(method, instance, Arguments::Values(args));
    let captured = capture.map(OutputCapture::finish);

    let actual = match outcome {
        Ok(value) => value,
        Err(err) => {
            return ExecutionResult::failed(
                FailureKind::UnexpectedException,
                elapsed,
                format!("Exception thrown: {err}"),
            );
        }
    };

    if let (Some(want), Some(got)) = (&unit.expected_output, &captured) {
        if got.trim() != want.trim() {
            return ExecutionResult::failed(
                FailureKind::OutputMismatch,
                elapsed,
                format!("Expected output \"{}\", but got \"{}\"", want.trim(), got.trim()),
            );
        }
    }

    if let Some(timed_out) = exceeded(elapsed, unit.timeout) {
        return timed_out;
    }

    let comparator = Comparator::resolve(unit.comparer.as_ref());
    let equal = comparator.equals(&actual, expected);
    match (equal, comparator.is_custom()) {
        (true, false) => ExecutionResult::passed(elapsed, format!("Returned expected value {expected}")),
        (true, true) => ExecutionResult::passed(elapsed, "Returned expected value (custom comparer)"),
        (false, false) => ExecutionResult::failed(
            FailureKind::AssertionMismatch,
            elapsed,
            format!("Expected {expected}, but got {actual}"),
        ),
        (false, true) => ExecutionResult::failed(
            FailureKind::AssertionMismatch,
            elapsed,
            format!("Expected {expected}, but got {actual} (custom comparer)"),
        ),
    }
}

// ============================================================================
// InputCase
// ============================================================================

fn run_input(
    unit: &TestUnit,
    method: &MethodDecl,
    fields: &[FieldExpectation],
    mut instance: Option<&mut dyn Any>,
    mut input: Box<dyn Any>,
) -> ExecutionResult {
    let (outcome, elapsed) = invoke(method, instance.as_deref_mut(), Arguments::Input(input.as_mut()));

    if let Err(err) = outcome {
        return classify_thrown(err, unit.expected_exception, elapsed);
    }

    if let Some(timed_out) = exceeded(elapsed, unit.timeout) {
        return timed_out;
    }

    if let Some(kind) = unit.expected_exception {
        return ExecutionResult::failed(
            FailureKind::MissingExpectedException,
            elapsed,
            format!("Expected exception {kind} but none was thrown"),
        );
    }

    check_fields(fields, instance.as_deref(), elapsed)
}

fn classify_thrown(err: Exception, expected: Option<&'static ExceptionType>, elapsed: Duration) -> ExecutionResult {
    match expected {
        Some(kind) if err.is_instance_of(kind) => {
            ExecutionResult::passed(elapsed, format!("Threw expected exception {}", err.kind()))
        }
        Some(_) => ExecutionResult::failed(
            FailureKind::WrongExceptionType,
            elapsed,
            format!("Unexpected exception: {err}"),
        ),
        None => ExecutionResult::failed(
            FailureKind::UnexpectedException,
            elapsed,
            format!("Unexpected exception: {err}"),
        ),
    }
}

fn check_fields(fields: &[FieldExpectation], instance: Option<&dyn Any>, elapsed: Duration) -> ExecutionResult {
    let mut checks = Vec::with_capacity(fields.len());
    let mut read_failed = false;

    for expectation in fields {
        let expected = expectation.expected();
        let check = match expectation.read(instance) {
            Ok(actual) => {
                let comparator = Comparator::resolve(expectation.comparer());
                if comparator.equals(&actual, expected) {
                    FieldCheck {
                        field: expectation.field().to_string(),
                        passed: true,
                        message: format!("Field {} has expected value {expected}", expectation.field()),
                    }
                } else {
                    FieldCheck {
                        field: expectation.field().to_string(),
                        passed: false,
                        message: format!("Expected {expected}, but got {actual} for field {}", expectation.field()),
                    }
                }
            }
            Err(err) => {
                read_failed = true;
                FieldCheck {
                    field: expectation.field().to_string(),
                    passed: false,
                    message: format!("Reading field {} threw {err}", expectation.field()),
                }
            }
        };
        checks.push(check);
    }

    let failures = checks.iter().filter(|c| !c.passed).count();
    let result = if failures == 0 {
        let message = if checks.is_empty() {
            "No field expectations to check".to_string()
        } else {
            format!("All {} field expectation(s) met", checks.len())
        };
        ExecutionResult::passed(elapsed, message)
    } else {
        let kind = if read_failed {
            FailureKind::UnexpectedException
        } else {
            FailureKind::AssertionMismatch
        };
        ExecutionResult::failed(
            kind,
            elapsed,
            format!("{failures} of {} field expectation(s) failed", checks.len()),
        )
    };
    result.with_field_checks(checks)
}
