//! Result rendering and run counters.
//!
//! A reporter owns the counters of one run. It is handed every unit as it starts and every result
//! as it completes, and performs no classification of its own.

use std::io::{self, Stdout, Write};

use crate::model::{ExecutionResult, TestUnit};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record_start(&mut self) {
        self.total += 1;
    }

    pub fn record(&mut self, result: &ExecutionResult) {
        if result.is_passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Receives run events.
pub trait TestReporter {
    /// Called once discovery has produced the unit list
    fn on_discovery_complete(&mut self, _unit_count: usize) {}

    /// Called before a unit's setup runs
    fn on_unit_start(&mut self, unit: &TestUnit);

    /// Called with a unit's classified result, before its cleanup runs
    fn on_unit_complete(&mut self, unit: &TestUnit, result: &ExecutionResult);

    /// Called when every unit has run
    fn on_run_complete(&mut self);

    /// Counters so far.
    fn tally(&self) -> Tally;
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Line-oriented console reporter.
///
/// ```text
/// [PASS] Calculator.double_value: Returned expected value 84
///     Time: 0 ms
///
/// ==== Test Summary ====
/// Total: 1, Passed: 1, Failed: 0
/// ```
pub struct ConsoleReporter<W: Write = Stdout> {
    out: W,
    color: bool,
    verbose: bool,
    tally: Tally,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            color: true,
            verbose: false,
            tally: Tally::default(),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Take back the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }

    fn status_line(&mut self, passed: bool, qualified: &str, message: &str) {
        let (tag, color) = if passed { ("[PASS]", GREEN) } else { ("[FAIL]", RED) };
        let text = if self.color {
            format!("{color}{tag} {qualified}: {message}{RESET}")
        } else {
            format!("{tag} {qualified}: {message}")
        };
        self.line(&text);
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_discovery_complete(&mut self, unit_count: usize) {
        if self.verbose {
            self.line(&format!("collected {unit_count} unit(s)"));
        }
    }

    fn on_unit_start(&mut self, unit: &TestUnit) {
        self.tally.record_start();
        if self.verbose {
            self.line(&format!("--- {unit}"));
        }
    }

    fn on_unit_complete(&mut self, unit: &TestUnit, result: &ExecutionResult) {
        let qualified = unit.qualified_name();
        for check in &result.field_checks {
            self.status_line(check.passed, &qualified, &check.message);
        }
        self.status_line(result.is_passed(), &qualified, &result.message);
        self.line(&format!("    Time: {} ms", result.elapsed.as_millis()));
        self.tally.record(result);
    }

    fn on_run_complete(&mut self) {
        let Tally { total, passed, failed } = self.tally;
        self.line("");
        self.line("==== Test Summary ====");
        self.line(&format!("Total: {total}, Passed: {passed}, Failed: {failed}"));
        let _ = self.out.flush();
    }

    fn tally(&self) -> Tally {
        self.tally
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::{FailureKind, FieldCheck, UnitKind};
    use crate::value::Value;

    fn unit(method: &str) -> TestUnit {
        TestUnit {
            class_name: "Calculator".to_string(),
            method_name: method.to_string(),
            method_index: 0,
            is_static: false,
            kind: UnitKind::Call {
                args: Vec::new(),
                expected: Value::from(84),
            },
            timeout: None,
            expected_exception: None,
            expected_output: None,
            comparer: None,
            ignored: false,
            categories: Vec::new(),
        }
    }

    fn render(verbose: bool, color: bool, events: &[(TestUnit, ExecutionResult)]) -> (String, Tally) {
        let mut reporter = ConsoleReporter::new(Vec::new())
            .with_color(color)
            .with_verbose(verbose);
        reporter.on_discovery_complete(events.len());
        for (unit, result) in events {
            reporter.on_unit_start(unit);
            reporter.on_unit_complete(unit, result);
        }
        reporter.on_run_complete();
        let tally = reporter.tally();
        (String::from_utf8(reporter.into_inner()).unwrap(), tally)
    }

    #[test]
    fn test_plain_report() {
        let events = vec![
            (
                unit("double_value"),
                ExecutionResult::passed(Duration::from_millis(3), "Returned expected value 84"),
            ),
            (
                unit("fast_test"),
                ExecutionResult::failed(
                    FailureKind::TimeoutExceeded,
                    Duration::from_millis(50),
                    "Timeout exceeded (50 ms > 10 ms)",
                ),
            ),
        ];
        let (output, tally) = render(false, false, &events);
        insta::assert_snapshot!(output, @r"
        [PASS] Calculator.double_value: Returned expected value 84
            Time: 3 ms
        [FAIL] Calculator.fast_test: Timeout exceeded (50 ms > 10 ms)
            Time: 50 ms

        ==== Test Summary ====
        Total: 2, Passed: 1, Failed: 1
        ");
        assert_eq!(tally, Tally { total: 2, passed: 1, failed: 1 });
    }

    #[test]
    fn test_field_checks_precede_unit_line() {
        let result = ExecutionResult::failed(
            FailureKind::AssertionMismatch,
            Duration::ZERO,
            "1 of 2 field expectation(s) failed",
        )
        .with_field_checks(vec![
            FieldCheck {
                field: "a".to_string(),
                passed: true,
                message: "Field a has expected value 1".to_string(),
            },
            FieldCheck {
                field: "b".to_string(),
                passed: false,
                message: "Expected 2, but got 3 for field b".to_string(),
            },
        ]);
        let (output, tally) = render(false, false, &[(unit("set_field"), result)]);
        insta::assert_snapshot!(output, @r"
        [PASS] Calculator.set_field: Field a has expected value 1
        [FAIL] Calculator.set_field: Expected 2, but got 3 for field b
        [FAIL] Calculator.set_field: 1 of 2 field expectation(s) failed
            Time: 0 ms

        ==== Test Summary ====
        Total: 1, Passed: 0, Failed: 1
        ");
        assert_eq!(tally.failed, 1);
    }

    #[test]
    fn test_verbose_report() {
        let events = vec![(unit("double_value"), ExecutionResult::passed(Duration::ZERO, "ok"))];
        let (output, _) = render(true, false, &events);
        insta::assert_snapshot!(output, @r"
        collected 1 unit(s)
        --- Calculator.double_value() == 84
        [PASS] Calculator.double_value: ok
            Time: 0 ms

        ==== Test Summary ====
        Total: 1, Passed: 1, Failed: 0
        ");
    }

    #[test]
    fn test_color_wraps_status_lines() {
        let events = vec![
            (unit("a"), ExecutionResult::passed(Duration::ZERO, "ok")),
            (
                unit("b"),
                ExecutionResult::failed(FailureKind::AssertionMismatch, Duration::ZERO, "bad"),
            ),
        ];
        let (output, _) = render(false, true, &events);
        assert!(output.contains("\x1b[32m[PASS] Calculator.a: ok\x1b[0m\n"));
        assert!(output.contains("\x1b[31m[FAIL] Calculator.b: bad\x1b[0m\n"));
        assert!(output.contains("Total: 2, Passed: 1, Failed: 1"));
    }

    #[test]
    fn test_empty_run_summary() {
        let (output, tally) = render(false, false, &[]);
        assert_eq!(output, "\n==== Test Summary ====\nTotal: 0, Passed: 0, Failed: 0\n");
        assert!(tally.all_passed());
    }
}
