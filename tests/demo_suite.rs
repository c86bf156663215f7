//! Runs the bundled demonstration suite end to end and snapshots the report.

use attest::{ConsoleReporter, RunConfig, Runner, Scope, Tally};

/// Timings vary between runs; replace them with a placeholder.
fn normalize(report: &str) -> String {
    report
        .lines()
        .map(|line| {
            if line.trim_start().starts_with("Time:") {
                "    Time: [ms]".to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn run(scope: &Scope, config: RunConfig) -> (Tally, String) {
    let registry = attest::demo::registry();
    let reporter = ConsoleReporter::new(Vec::new())
        .with_color(config.color)
        .with_verbose(config.verbose);
    let mut runner = Runner::new(config, reporter);
    let tally = runner.run(&registry, scope).unwrap();
    let raw = String::from_utf8(runner.into_reporter().into_inner()).unwrap();
    (tally, normalize(raw.trim_end()))
}

#[test]
fn test_demo_suite_report() {
    let (tally, report) = run(&Scope::All, RunConfig::new().with_color(false));
    assert_eq!(tally, Tally { total: 11, passed: 11, failed: 0 });
    insta::assert_snapshot!(report, @r"
    [PASS] Calculator.double_value: Returned expected value 84
        Time: [ms]
    [PASS] Calculator.fast_test: Returned expected value 100
        Time: [ms]
    [PASS] Calculator.return_array: Returned expected value (custom comparer)
        Time: [ms]
    [PASS] Calculator.echo: Returned expected value Hello, World!
        Time: [ms]
    [PASS] Calculator.throws_on_negative: Threw expected exception InvalidOperationError
        Time: [ms]
    [PASS] Calculator.set_field: Field field_to_check has expected value 123
    [PASS] Calculator.set_field: All 1 field expectation(s) met
        Time: [ms]
    [PASS] MathOps.add: Returned expected value 5
        Time: [ms]
    [PASS] MathOps.add: Returned expected value 0
        Time: [ms]
    [PASS] MathOps.divide: Threw expected exception ZeroDivisionError
        Time: [ms]
    [PASS] MathOps.banner: Returned expected value null
        Time: [ms]
    [PASS] Thermostat.record: Field alerts has expected value 1
    [PASS] Thermostat.record: Field reading has expected value 30
    [PASS] Thermostat.record: All 2 field expectation(s) met
        Time: [ms]

    ==== Test Summary ====
    Total: 11, Passed: 11, Failed: 0
    ");
}

#[test]
fn test_demo_single_class_verbose() {
    let config = RunConfig::new().with_color(false).with_verbose(true);
    let (tally, report) = run(&Scope::Named("MathOps".to_string()), config);
    assert_eq!(tally, Tally { total: 4, passed: 4, failed: 0 });
    insta::assert_snapshot!(report, @r"
    collected 4 unit(s)
    --- MathOps.add(2, 3) == 5
    [PASS] MathOps.add: Returned expected value 5
        Time: [ms]
    --- MathOps.add(-1, 1) == 0
    [PASS] MathOps.add: Returned expected value 0
        Time: [ms]
    --- MathOps.divide(Division)
    [PASS] MathOps.divide: Threw expected exception ZeroDivisionError
        Time: [ms]
    --- MathOps.banner() == null
    [PASS] MathOps.banner: Returned expected value null
        Time: [ms]

    ==== Test Summary ====
    Total: 4, Passed: 4, Failed: 0
    ");
}

#[test]
fn test_demo_category_filter() {
    let config = RunConfig::new().with_color(false).with_category("Simple");
    let (tally, report) = run(&Scope::All, config);
    assert_eq!(tally, Tally { total: 3, passed: 3, failed: 0 });
    assert!(report.contains("Calculator.double_value"));
    assert!(!report.contains("Calculator.echo"));
}

#[test]
fn test_demo_colored_lines() {
    let (_, report) = run(&Scope::All, RunConfig::new().with_keyword("Calculator.double_value"));
    let first = report.lines().next().unwrap();
    assert_eq!(first, "\x1b[32m[PASS] Calculator.double_value: Returned expected value 84\x1b[0m");
}
