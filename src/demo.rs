//! The bundled demonstration suite run by the `attest` binary.
//!
//! Every declaration kind appears at least once: fixtures, literal cases, an ignored method, a
//! timeout, a custom comparer, expected console output, input cases with and without an expected
//! exception, field expectations and static methods.

use std::cell::RefCell;
use std::rc::Rc;

use crate::class::{Class, Method};
use crate::compare::Comparer;
use crate::console;
use crate::exception::{Exception, INVALID_OPERATION, ZERO_DIVISION_ERROR};
use crate::factory::{ComparerType, InputType};
use crate::reactive::Observable;
use crate::reflect::Reflect;
use crate::registry::Registry;
use crate::value::Value;
use crate::values;

/// Element-wise equality for integer arrays.
#[derive(Debug, Default)]
pub struct IntArrayComparer;

impl Comparer for IntArrayComparer {
    fn equals(&self, actual: &Value, expected: &Value) -> bool {
        let ints = |v: &Value| -> Option<Vec<i64>> { v.as_array()?.iter().map(Value::as_int).collect() };
        match (ints(actual), ints(expected)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug)]
pub struct TestInput {
    pub value: i64,
}

impl Default for TestInput {
    fn default() -> Self {
        Self { value: 123 }
    }
}

#[derive(Debug)]
pub struct NegativeInput {
    pub value: i64,
}

impl Default for NegativeInput {
    fn default() -> Self {
        Self { value: -5 }
    }
}

// ============================================================================
// Calculator
// ============================================================================

#[derive(Debug, Default, Reflect)]
pub struct Calculator {
    pub value: i64,
    pub field_to_check: i64,
}

impl Calculator {
    fn store(&mut self, value: i64) -> Result<(), Exception> {
        if value < 0 {
            return Err(Exception::invalid_operation("Negative value"));
        }
        self.value = value;
        Ok(())
    }
}

fn calculator() -> Class<Calculator> {
    Class::<Calculator>::new("Calculator")
        .setup(|c| {
            c.value = 42;
            Ok(())
        })
        .cleanup(|c| {
            c.value = 0;
            Ok(())
        })
        .expect_field("field_to_check", 123)
        .method(
            Method::call("double_value", |c: &mut Calculator, _| Ok(Value::from(c.value * 2)))
                .case(84, values![])
                .category("Simple"),
        )
        .method(
            Method::call("ignored_test", |_: &mut Calculator, _| Ok(Value::from(0)))
                .case(0, values![])
                .ignore(),
        )
        .method(
            Method::call("fast_test", |_: &mut Calculator, _| Ok(Value::from(100)))
                .case(100, values![])
                .timeout(10),
        )
        .method(
            Method::call("return_array", |_: &mut Calculator, args| Ok(Value::array(args.iter().cloned())))
                .case(Value::array([1, 2, 3]), [1, 2, 3])
                .comparer(ComparerType::of::<IntArrayComparer>()),
        )
        .method(
            Method::call("echo", |_: &mut Calculator, _| {
                console::print_line(&values!["Hello, World!"]);
                Ok(Value::from("Hello, World!"))
            })
            .case("Hello, World!", values![])
            .expect_output("Hello, World!"),
        )
        .method(
            Method::input("throws_on_negative", |c: &mut Calculator, input: &mut NegativeInput| {
                c.store(input.value)
            })
            .with_input(InputType::of::<NegativeInput>())
            .expect_exception(&INVALID_OPERATION),
        )
        .method(
            Method::input("set_field", |c: &mut Calculator, input: &mut TestInput| {
                c.field_to_check = input.value;
                Ok(())
            })
            .with_input(InputType::of::<TestInput>()),
        )
}

// ============================================================================
// MathOps
// ============================================================================

#[derive(Debug, Default)]
pub struct MathOps;

#[derive(Debug)]
pub struct Division {
    pub numerator: i64,
    pub denominator: i64,
}

impl Default for Division {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 0,
        }
    }
}

fn sum(args: &[Value]) -> Result<Value, Exception> {
    args.iter()
        .map(|v| v.as_int().ok_or_else(|| Exception::argument(format!("expected an int, got {}", v.type_name()))))
        .sum::<Result<i64, _>>()
        .map(Value::from)
}

fn math_ops() -> Class<MathOps> {
    Class::<MathOps>::new("MathOps")
        .method(
            Method::<MathOps>::static_call("add", sum)
                .case(5, [2, 3])
                .case(0, [-1, 1])
                .category("Simple"),
        )
        .method(
            Method::<MathOps>::static_input("divide", |d: &mut Division| {
                d.numerator
                    .checked_div(d.denominator)
                    .map(|_| ())
                    .ok_or_else(|| Exception::new(&ZERO_DIVISION_ERROR, "division by zero"))
            })
            .with_input(InputType::of::<Division>())
            .expect_exception(&ZERO_DIVISION_ERROR),
        )
        .method(
            Method::<MathOps>::static_call("banner", |_| {
                console::print(&values!["MathOps", "ready"]);
                Ok(Value::Null)
            })
            .case(Value::Null, values![])
            .expect_output("MathOps ready"),
        )
}

// ============================================================================
// Thermostat
// ============================================================================

/// Raises an alert through an observable whenever a reading goes above the limit.
#[derive(Debug, Default)]
pub struct Thermostat {
    reading: Observable<i64>,
    alerts: Rc<RefCell<Vec<i64>>>,
}

#[derive(Debug)]
pub struct Reading {
    pub celsius: i64,
}

impl Default for Reading {
    fn default() -> Self {
        Self { celsius: 30 }
    }
}

const ALERT_LIMIT: i64 = 25;

fn thermostat() -> Class<Thermostat> {
    Class::<Thermostat>::new("Thermostat")
        .setup(|t| {
            let alerts = Rc::clone(&t.alerts);
            t.reading.subscribe(move |celsius| {
                if *celsius > ALERT_LIMIT {
                    alerts.borrow_mut().push(*celsius);
                }
            });
            Ok(())
        })
        .expect_field_with("alerts", 1, |t: &Thermostat| {
            Value::from(i64::try_from(t.alerts.borrow().len()).unwrap_or(i64::MAX))
        })
        .expect_field_with("reading", 30, |t: &Thermostat| Value::from(*t.reading.get()))
        .method(
            Method::input("record", |t: &mut Thermostat, r: &mut Reading| {
                t.reading.set(r.celsius);
                Ok(())
            })
            .with_input(InputType::of::<Reading>()),
        )
}

/// Registry holding every demonstration class.
pub fn registry() -> Registry {
    Registry::new()
        .register(calculator())
        .register(math_ops())
        .register(thermostat())
}
