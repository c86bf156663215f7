//! Declaration table: test classes, their methods and the markers attached to them.
//!
//! Declarations are written with the typed builders [`Class`] and [`Method`] and erased into
//! [`TestClass`] when registered, so the registry can hold classes of different types side by side.
//!
//! ```rust
//! use attest::class::{Class, Method};
//! use attest::reflect::Reflect;
//! use attest::{Registry, Value, values};
//!
//! #[derive(Default, Reflect)]
//! struct Doubler {
//!     value: i64,
//! }
//!
//! let registry = Registry::new().register(
//!     Class::<Doubler>::new("Doubler")
//!         .setup(|d| {
//!             d.value = 42;
//!             Ok(())
//!         })
//!         .method(
//!             Method::<Doubler>::call("double_value", |d, _args| Ok(Value::from(d.value * 2)))
//!                 .case(84, values![])
//!                 .category("Simple"),
//!         ),
//! );
//! assert_eq!(registry.classes().len(), 1);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use crate::exception::{Exception, ExceptionType, KEY_ERROR, TARGET_ERROR, Thrown};
use crate::factory::{ComparerType, InputType};
use crate::model::{FieldExpectation, FieldReader};
use crate::reflect::Reflect;
use crate::value::Value;

/// Whether a declaration is visible to discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// Where a class is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Origin {
    /// Declared by the program under test.
    #[default]
    Program,
    /// Pulled in from an external library; never discovered by a run-all scan.
    External,
}

/// Arguments handed to a method body.
pub enum Arguments<'a> {
    Values(&'a [Value]),
    Input(&'a mut dyn Any),
}

pub(crate) type MethodBody = Box<dyn Fn(Option<&mut dyn Any>, Arguments<'_>) -> Thrown<Value>>;
pub(crate) type FixtureBody = Box<dyn Fn(Option<&mut dyn Any>) -> Thrown<()>>;

fn target_of<'a, T: Any>(instance: Option<&'a mut dyn Any>, operation: &str) -> Thrown<&'a mut T> {
    instance.and_then(|i| i.downcast_mut::<T>()).ok_or_else(|| {
        Exception::new(
            &TARGET_ERROR,
            format!("non-static `{operation}` requires an instance"),
        )
    })
}

// ============================================================================
// Fixtures
// ============================================================================

/// A setup or cleanup operation declared on a class.
pub struct Fixture {
    name: String,
    is_static: bool,
    body: FixtureBody,
}

impl Fixture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub(crate) fn invoke(&self, instance: Option<&mut dyn Any>) -> Thrown<()> {
        (self.body)(instance)
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Methods
// ============================================================================

/// One `case(expected, args)` declaration.
#[derive(Debug, Clone)]
pub struct CallCase {
    pub expected: Value,
    pub args: Vec<Value>,
}

/// Type-erased method declaration with all of its markers.
pub struct MethodDecl {
    pub(crate) name: String,
    pub(crate) is_static: bool,
    pub(crate) visibility: Visibility,
    pub(crate) body: MethodBody,
    pub(crate) cases: Vec<CallCase>,
    pub(crate) inputs: Vec<InputType>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) expected_exception: Option<&'static ExceptionType>,
    pub(crate) expected_output: Option<String>,
    pub(crate) comparer: Option<ComparerType>,
    pub(crate) categories: Vec<String>,
    pub(crate) ignored: bool,
}

impl MethodDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Number of case declarations (CallCase plus InputCase).
    pub fn case_count(&self) -> usize {
        self.cases.len() + self.inputs.len()
    }

    pub(crate) fn invoke(&self, instance: Option<&mut dyn Any>, args: Arguments<'_>) -> Thrown<Value> {
        (self.body)(instance, args)
    }
}

impl fmt::Debug for MethodDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDecl")
            .field("name", &self.name)
            .field("is_static", &self.is_static)
            .field("visibility", &self.visibility)
            .field("cases", &self.cases)
            .field("inputs", &self.inputs)
            .field("ignored", &self.ignored)
            .finish_non_exhaustive()
    }
}

/// Typed builder for a method of class `T`.
pub struct Method<T> {
    decl: MethodDecl,
    _owner: PhantomData<fn(&mut T)>,
}

impl<T: Any> Method<T> {
    fn from_body(name: &str, is_static: bool, body: MethodBody) -> Self {
        Self {
            decl: MethodDecl {
                name: name.to_string(),
                is_static,
                visibility: Visibility::Public,
                body,
                cases: Vec::new(),
                inputs: Vec::new(),
                timeout: None,
                expected_exception: None,
                expected_output: None,
                comparer: None,
                categories: Vec::new(),
                ignored: false,
            },
            _owner: PhantomData,
        }
    }

    /// An instance method taking literal arguments.
    pub fn call<F>(name: &str, f: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> Thrown<Value> + 'static,
    {
        let label = name.to_string();
        Self::from_body(
            name,
            false,
            Box::new(move |instance: Option<&mut dyn Any>, args: Arguments<'_>| {
                let target = target_of::<T>(instance, &label)?;
                match args {
                    Arguments::Values(values) => f(target, values),
                    Arguments::Input(_) => Err(Exception::argument(format!(
                        "`{label}` takes literal arguments, not an input object"
                    ))),
                }
            }),
        )
    }

    /// A static method taking literal arguments.
    pub fn static_call<F>(name: &str, f: F) -> Self
    where
        F: Fn(&[Value]) -> Thrown<Value> + 'static,
    {
        let label = name.to_string();
        Self::from_body(
            name,
            true,
            Box::new(move |_instance: Option<&mut dyn Any>, args: Arguments<'_>| match args {
                Arguments::Values(values) => f(values),
                Arguments::Input(_) => Err(Exception::argument(format!(
                    "`{label}` takes literal arguments, not an input object"
                ))),
            }),
        )
    }

    /// An instance method taking one input object of type `I`.
    pub fn input<I, F>(name: &str, f: F) -> Self
    where
        I: Any,
        F: Fn(&mut T, &mut I) -> Thrown<()> + 'static,
    {
        let label = name.to_string();
        Self::from_body(
            name,
            false,
            Box::new(move |instance: Option<&mut dyn Any>, args: Arguments<'_>| {
                let target = target_of::<T>(instance, &label)?;
                let input = input_of::<I>(args, &label)?;
                f(target, input).map(|()| Value::Null)
            }),
        )
    }

    /// A static method taking one input object of type `I`.
    pub fn static_input<I, F>(name: &str, f: F) -> Self
    where
        I: Any,
        F: Fn(&mut I) -> Thrown<()> + 'static,
    {
        let label = name.to_string();
        Self::from_body(
            name,
            true,
            Box::new(move |_instance: Option<&mut dyn Any>, args: Arguments<'_>| {
                let input = input_of::<I>(args, &label)?;
                f(input).map(|()| Value::Null)
            }),
        )
    }

    /// Declare a CallCase: invoke with `args`, expect `expected` back.
    pub fn case<E, A>(mut self, expected: E, args: A) -> Self
    where
        E: Into<Value>,
        A: IntoIterator,
        A::Item: Into<Value>,
    {
        self.decl.cases.push(CallCase {
            expected: expected.into(),
            args: args.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Declare an InputCase: invoke with a fresh default-constructed `input_type`.
    pub fn with_input(mut self, input_type: InputType) -> Self {
        self.decl.inputs.push(input_type);
        self
    }

    /// Wall-clock budget in milliseconds.
    pub fn timeout(mut self, millis: u64) -> Self {
        self.decl.timeout = Some(Duration::from_millis(millis));
        self
    }

    pub fn expect_exception(mut self, kind: &'static ExceptionType) -> Self {
        self.decl.expected_exception = Some(kind);
        self
    }

    pub fn expect_output(mut self, text: impl Into<String>) -> Self {
        self.decl.expected_output = Some(text.into());
        self
    }

    pub fn comparer(mut self, comparer: ComparerType) -> Self {
        self.decl.comparer = Some(comparer);
        self
    }

    pub fn category(mut self, tag: impl Into<String>) -> Self {
        self.decl.categories.push(tag.into());
        self
    }

    pub fn ignore(mut self) -> Self {
        self.decl.ignored = true;
        self
    }

    pub fn private(mut self) -> Self {
        self.decl.visibility = Visibility::Private;
        self
    }
}

fn input_of<'a, I: Any>(args: Arguments<'a>, operation: &str) -> Thrown<&'a mut I> {
    match args {
        Arguments::Input(input) => input.downcast_mut::<I>().ok_or_else(|| {
            Exception::argument(format!(
                "`{operation}` expects an input of type `{}`",
                std::any::type_name::<I>()
            ))
        }),
        Arguments::Values(_) => Err(Exception::argument(format!(
            "`{operation}` takes an input object, not literal arguments"
        ))),
    }
}

// ============================================================================
// Classes
// ============================================================================

/// Type-erased class declaration.
pub struct TestClass {
    pub(crate) name: String,
    pub(crate) type_id: TypeId,
    pub(crate) visibility: Visibility,
    pub(crate) is_abstract: bool,
    pub(crate) origin: Origin,
    pub(crate) construct: fn() -> Box<dyn Any>,
    pub(crate) setups: Vec<Fixture>,
    pub(crate) cleanups: Vec<Fixture>,
    pub(crate) fields: Vec<FieldExpectation>,
    pub(crate) methods: Vec<MethodDecl>,
}

impl TestClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Public, concrete and declared by the program under test.
    pub fn is_eligible(&self) -> bool {
        self.visibility == Visibility::Public && !self.is_abstract && self.origin == Origin::Program
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn methods(&self) -> &[MethodDecl] {
        &self.methods
    }

    pub fn fields(&self) -> &[FieldExpectation] {
        &self.fields
    }

    pub fn setups(&self) -> &[Fixture] {
        &self.setups
    }

    pub fn cleanups(&self) -> &[Fixture] {
        &self.cleanups
    }

    /// Construct a fresh instance with no-argument construction.
    pub fn instantiate(&self) -> Box<dyn Any> {
        (self.construct)()
    }
}

impl fmt::Debug for TestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClass")
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("is_abstract", &self.is_abstract)
            .field("origin", &self.origin)
            .field("setups", &self.setups)
            .field("cleanups", &self.cleanups)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

/// Typed builder for a test class.
pub struct Class<T> {
    inner: TestClass,
    _owner: PhantomData<fn(&mut T)>,
}

impl<T: Default + Any> Class<T> {
    pub fn new(name: &str) -> Self {
        Self {
            inner: TestClass {
                name: name.to_string(),
                type_id: TypeId::of::<T>(),
                visibility: Visibility::Public,
                is_abstract: false,
                origin: Origin::Program,
                construct: || Box::new(T::default()) as Box<dyn Any>,
                setups: Vec::new(),
                cleanups: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
            },
            _owner: PhantomData,
        }
    }

    pub fn private(mut self) -> Self {
        self.inner.visibility = Visibility::Private;
        self
    }

    pub fn abstract_class(mut self) -> Self {
        self.inner.is_abstract = true;
        self
    }

    pub fn external(mut self) -> Self {
        self.inner.origin = Origin::External;
        self
    }

    /// Declare a setup operation, run on each unit's instance before the method call.
    pub fn setup<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) -> Thrown<()> + 'static,
    {
        let fixture = instance_fixture("setup", f);
        self.inner.setups.push(fixture);
        self
    }

    /// Declare a cleanup operation, run on each unit's instance after its outcome is reported.
    pub fn cleanup<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut T) -> Thrown<()> + 'static,
    {
        let fixture = instance_fixture("cleanup", f);
        self.inner.cleanups.push(fixture);
        self
    }

    pub fn static_setup<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Thrown<()> + 'static,
    {
        self.inner.setups.push(static_fixture("setup", f));
        self
    }

    pub fn static_cleanup<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Thrown<()> + 'static,
    {
        self.inner.cleanups.push(static_fixture("cleanup", f));
        self
    }

    pub fn method(mut self, method: Method<T>) -> Self {
        self.inner.methods.push(method.decl);
        self
    }

    /// Expect a reflected field to hold `expected` after each InputCase unit.
    pub fn expect_field(self, field: &str, expected: impl Into<Value>) -> Self
    where
        T: Reflect,
    {
        let name = field.to_string();
        self.push_field(
            field,
            expected.into(),
            false,
            Box::new(move |instance: Option<&dyn Any>| {
                let target = instance
                    .and_then(|i| i.downcast_ref::<T>())
                    .ok_or_else(|| Exception::new(&TARGET_ERROR, format!("non-static field `{name}` requires an instance")))?;
                target.field(&name).ok_or_else(|| {
                    Exception::new(&KEY_ERROR, format!("`{}` has no reflected field `{name}`", T::type_name()))
                })
            }),
        )
    }

    /// Expect the value read by `getter` to equal `expected` after each InputCase unit.
    pub fn expect_field_with<F>(self, field: &str, expected: impl Into<Value>, getter: F) -> Self
    where
        F: Fn(&T) -> Value + 'static,
    {
        let name = field.to_string();
        self.push_field(
            field,
            expected.into(),
            false,
            Box::new(move |instance: Option<&dyn Any>| {
                instance
                    .and_then(|i| i.downcast_ref::<T>())
                    .map(&getter)
                    .ok_or_else(|| Exception::new(&TARGET_ERROR, format!("non-static field `{name}` requires an instance")))
            }),
        )
    }

    /// Expect static state read by `getter` to equal `expected` after each InputCase unit.
    pub fn expect_static<F>(self, field: &str, expected: impl Into<Value>, getter: F) -> Self
    where
        F: Fn() -> Value + 'static,
    {
        self.push_field(field, expected.into(), true, Box::new(move |_: Option<&dyn Any>| Ok(getter())))
    }

    /// Bind a custom comparer to every expectation on `field`.
    pub fn field_comparer(mut self, field: &str, comparer: ComparerType) -> Self {
        for expectation in self.inner.fields.iter_mut().filter(|e| e.field == field) {
            expectation.comparer = Some(comparer);
        }
        self
    }

    fn push_field(mut self, field: &str, expected: Value, is_static: bool, read: FieldReader) -> Self {
        self.inner.fields.push(FieldExpectation {
            field: field.to_string(),
            expected,
            comparer: None,
            is_static,
            read,
        });
        self
    }

    pub fn into_class(self) -> TestClass {
        self.inner
    }
}

fn instance_fixture<T, F>(phase: &str, f: F) -> Fixture
where
    T: Any,
    F: Fn(&mut T) -> Thrown<()> + 'static,
{
    let label = phase.to_string();
    Fixture {
        name: phase.to_string(),
        is_static: false,
        body: Box::new(move |instance: Option<&mut dyn Any>| {
            let target = target_of::<T>(instance, &label)?;
            f(target)
        }),
    }
}

fn static_fixture<F>(phase: &str, f: F) -> Fixture
where
    F: Fn() -> Thrown<()> + 'static,
{
    Fixture {
        name: phase.to_string(),
        is_static: true,
        body: Box::new(move |_: Option<&mut dyn Any>| f()),
    }
}
