//! Run orchestration: discovery, fixtures, execution and reporting.
//!
//! For each selected unit, in discovery order:
//!
//! 1. the reporter is told the unit started
//! 2. a fresh input object is constructed for an InputCase unit
//! 3. a fresh instance is constructed (none for a static method)
//! 4. setup runs on it
//! 5. the engine executes the unit and the reporter receives the result
//! 6. cleanup runs on the same instance
//!
//! A fixture error ends the run immediately with [`RunError::Fixture`].

use crate::config::RunConfig;
use crate::engine;
use crate::error::{RegistryError, RunError};
use crate::model::TestUnit;
use crate::registry::{Registry, Scope};
use crate::reporter::{Tally, TestReporter};

pub struct Runner<R: TestReporter> {
    config: RunConfig,
    reporter: R,
}

impl<R: TestReporter> Runner<R> {
    pub fn new(config: RunConfig, reporter: R) -> Self {
        Self { config, reporter }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Run every eligible class in the registry.
    pub fn run_all(&mut self, registry: &Registry) -> Result<Tally, RunError> {
        self.run(registry, &Scope::All)
    }

    /// Run the class declared for type `T`.
    pub fn run_class<T: 'static>(&mut self, registry: &Registry) -> Result<Tally, RunError> {
        self.run(registry, &Scope::of::<T>())
    }

    /// Run the class registered under `name`.
    pub fn run_class_named(&mut self, registry: &Registry, name: &str) -> Result<Tally, RunError> {
        self.run(registry, &Scope::Named(name.to_string()))
    }

    #[tracing::instrument(skip_all, fields(scope = %scope))]
    pub fn run(&mut self, registry: &Registry, scope: &Scope) -> Result<Tally, RunError> {
        let discovery = registry.discover(scope)?;
        let selected = discovery.units().filter(|u| self.config.matches(u)).count();
        self.reporter.on_discovery_complete(selected);

        'classes: for class in &discovery.classes {
            for unit in class.units.iter().filter(|u| self.config.matches(u)) {
                let Some(method) = class.method_of(unit) else {
                    continue;
                };
                tracing::debug!(unit = %unit, "running unit");
                self.reporter.on_unit_start(unit);

                let input = engine::prepare_input(unit);
                let mut instance = if unit.is_static {
                    None
                } else {
                    Some(class.class.instantiate())
                };
                let reporter = &mut self.reporter;
                let passed = class.fixtures.around(&mut instance, |target| {
                    let result = engine::execute(unit, method, class.class.fields(), target, input);
                    reporter.on_unit_complete(unit, &result);
                    result.is_passed()
                })?;

                if !passed && self.config.fail_fast {
                    tracing::info!(unit = %unit, "stopping after first failure");
                    break 'classes;
                }
            }
        }

        self.reporter.on_run_complete();
        let tally = self.reporter.tally();
        tracing::info!(total = tally.total, passed = tally.passed, failed = tally.failed, "run complete");
        Ok(tally)
    }

    /// The units a run over `scope` would execute, without running anything.
    pub fn list(&self, registry: &Registry, scope: &Scope) -> Result<Vec<TestUnit>, RegistryError> {
        let discovery = registry.discover(scope)?;
        Ok(discovery.units().filter(|u| self.config.matches(u)).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::class::{Class, Method};
    use crate::console;
    use crate::exception::{Exception, TARGET_ERROR};
    use crate::factory::InputType;
    use crate::fixture::FixturePhase;
    use crate::model::ExecutionResult;
    use crate::value::Value;
    use crate::values;

    /// Records the event sequence instead of rendering it.
    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
        tally: Tally,
    }

    impl TestReporter for Recorder {
        fn on_discovery_complete(&mut self, unit_count: usize) {
            self.events.push(format!("discovered {unit_count}"));
        }

        fn on_unit_start(&mut self, unit: &TestUnit) {
            self.tally.record_start();
            self.events.push(format!("start {}", unit.qualified_name()));
        }

        fn on_unit_complete(&mut self, unit: &TestUnit, result: &ExecutionResult) {
            self.tally.record(result);
            let status = if result.is_passed() { "pass" } else { "fail" };
            self.events.push(format!("{status} {}", unit.qualified_name()));
        }

        fn on_run_complete(&mut self) {
            self.events.push("done".to_string());
        }

        fn tally(&self) -> Tally {
            self.tally
        }
    }

    #[derive(Default)]
    struct Counter {
        value: i64,
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn counter_class(log: &Log) -> Class<Counter> {
        let setup_log = Rc::clone(log);
        let cleanup_log = Rc::clone(log);
        let body_log = Rc::clone(log);
        Class::<Counter>::new("Counter")
            .setup(move |c| {
                c.value = 42;
                setup_log.borrow_mut().push("setup".to_string());
                Ok(())
            })
            .cleanup(move |c| {
                c.value = 0;
                cleanup_log.borrow_mut().push("cleanup".to_string());
                Ok(())
            })
            .method(
                Method::<Counter>::call("double", move |c, _| {
                    body_log.borrow_mut().push(format!("double on {}", c.value));
                    Ok(Value::from(c.value * 2))
                })
                .case(84, values![])
                .case(85, values![])
                .category("Simple"),
            )
            .method(Method::<Counter>::call("value", |c, _| Ok(Value::from(c.value))).case(42, values![]))
    }

    #[test]
    fn test_fixtures_wrap_every_unit_on_a_fresh_instance() {
        let log = Log::default();
        let registry = Registry::new().register(counter_class(&log));
        let mut runner = Runner::new(RunConfig::default(), Recorder::default());

        let tally = runner.run_all(&registry).unwrap();

        assert_eq!(tally, Tally { total: 3, passed: 2, failed: 1 });
        assert_eq!(
            *log.borrow(),
            vec!["setup", "double on 42", "cleanup", "setup", "double on 42", "cleanup", "setup", "cleanup"]
        );
    }

    #[test]
    fn test_unit_is_reported_before_cleanup() {
        let registry = Registry::new().register(
            Class::<Counter>::new("Counter")
                .cleanup(|_| Err(Exception::value_error("cleanup broke")))
                .method(Method::<Counter>::call("value", |c, _| Ok(Value::from(c.value))).case(0, values![])),
        );
        let mut runner = Runner::new(RunConfig::default(), Recorder::default());

        let err = runner.run_all(&registry).unwrap_err();

        assert!(matches!(err, RunError::Fixture(ref e) if e.phase == FixturePhase::Cleanup));
        let events = runner.into_reporter().events;
        assert_eq!(events, vec!["discovered 1", "start Counter.value", "pass Counter.value"]);
    }

    #[test]
    fn test_instance_setup_on_static_unit_is_fatal() {
        let registry = Registry::new().register(
            Class::<Counter>::new("Counter")
                .setup(|_| Ok(()))
                .method(Method::<Counter>::static_call("zero", |_| Ok(Value::from(0))).case(0, values![])),
        );
        let mut runner = Runner::new(RunConfig::default(), Recorder::default());
        let err = runner.run_all(&registry).unwrap_err();
        assert!(matches!(err, RunError::Fixture(ref e) if e.source.is_instance_of(&TARGET_ERROR)));
    }

    thread_local! {
        static LIFECYCLE: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
    }

    fn note(event: &'static str) {
        LIFECYCLE.with(|log| log.borrow_mut().push(event));
    }

    /// Input object that records its construction.
    struct Traced;

    impl Default for Traced {
        fn default() -> Self {
            note("input");
            Self
        }
    }

    #[test]
    fn test_input_is_built_before_setup() {
        LIFECYCLE.with(|log| log.borrow_mut().clear());
        let registry = Registry::new().register(
            Class::<Counter>::new("Counter")
                .setup(|_| {
                    note("setup");
                    Ok(())
                })
                .cleanup(|_| {
                    note("cleanup");
                    Ok(())
                })
                .method(
                    Method::<Counter>::input("consume", |_, _: &mut Traced| {
                        note("body");
                        Ok(())
                    })
                    .with_input(InputType::of::<Traced>()),
                ),
        );
        let mut runner = Runner::new(RunConfig::default(), Recorder::default());

        let tally = runner.run_all(&registry).unwrap();

        assert_eq!(tally, Tally { total: 1, passed: 1, failed: 0 });
        let order = LIFECYCLE.with(|log| log.borrow().clone());
        assert_eq!(order, vec!["input", "setup", "body", "cleanup"]);
    }

    #[test]
    fn test_cleanup_runs_after_output_mismatch() {
        let log = Log::default();
        let cleanup_log = Rc::clone(&log);
        let registry = Registry::new().register(
            Class::<Counter>::new("Counter")
                .cleanup(move |_| {
                    cleanup_log.borrow_mut().push("cleanup".to_string());
                    Ok(())
                })
                .method(
                    Method::<Counter>::call("greet", |_, _| {
                        console::print_line(&values!["Goodbye"]);
                        Ok(Value::Null)
                    })
                    .case(Value::Null, values![])
                    .expect_output("Hello"),
                )
                .method(
                    Method::<Counter>::input("reject", |_, _: &mut Traced| Err(Exception::value_error("bad")))
                        .with_input(InputType::of::<Traced>()),
                ),
        );
        let mut runner = Runner::new(RunConfig::default(), Recorder::default());

        let tally = runner.run_all(&registry).unwrap();

        assert_eq!(tally, Tally { total: 2, passed: 0, failed: 2 });
        assert_eq!(*log.borrow(), vec!["cleanup", "cleanup"]);
        assert!(!console::is_capturing());
        let events = runner.into_reporter().events;
        assert_eq!(
            events,
            vec![
                "discovered 2",
                "start Counter.greet",
                "fail Counter.greet",
                "start Counter.reject",
                "fail Counter.reject",
                "done",
            ]
        );
    }

    #[test]
    fn test_category_filter_limits_units() {
        let log = Log::default();
        let registry = Registry::new().register(counter_class(&log));
        let mut runner = Runner::new(RunConfig::new().with_category("Simple"), Recorder::default());
        let tally = runner.run_all(&registry).unwrap();
        assert_eq!(tally.total, 2);
    }

    #[test]
    fn test_fail_fast_stops_after_first_failure() {
        let log = Log::default();
        let registry = Registry::new().register(counter_class(&log));
        let mut runner = Runner::new(RunConfig::new().with_fail_fast(true), Recorder::default());
        let tally = runner.run_all(&registry).unwrap();
        assert_eq!(tally, Tally { total: 2, passed: 1, failed: 1 });
        assert_eq!(runner.reporter().events.last().map(String::as_str), Some("done"));
    }

    #[test]
    fn test_list_does_not_execute() {
        let log = Log::default();
        let registry = Registry::new().register(counter_class(&log));
        let runner = Runner::new(RunConfig::new().with_keyword("value"), Recorder::default());
        let units = runner.list(&registry, &Scope::All).unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].qualified_name(), "Counter.value");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_run_class_by_type_and_name() {
        let log = Log::default();
        let registry = Registry::new().register(counter_class(&log).private());
        let mut runner = Runner::new(RunConfig::default(), Recorder::default());
        assert_eq!(runner.run_all(&registry).unwrap().total, 0);

        let mut runner = Runner::new(RunConfig::default(), Recorder::default());
        assert_eq!(runner.run_class::<Counter>(&registry).unwrap().total, 3);

        let mut runner = Runner::new(RunConfig::default(), Recorder::default());
        assert_eq!(runner.run_class_named(&registry, "Counter").unwrap().total, 3);
    }
}
