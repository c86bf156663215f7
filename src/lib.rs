#![forbid(unsafe_code)]
//! Declarative inline test discovery and execution.
//!
//! Test classes are declared once in a [`Registry`] with their markers (literal call cases, input
//! cases, expected exceptions, timeouts, expected console output, custom comparers, categories,
//! fixtures and field expectations). A [`Runner`] discovers the units those markers describe, runs
//! each one around its class's setup and cleanup, and hands every classified result to a
//! [`TestReporter`].
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module
//!   enforces `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test bodies**: A panic inside a declared method or fixture is caught at the unit boundary and
//!   treated as a thrown [`Exception`] of kind [`exception::PANIC`].
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.

// Lets `#[derive(Reflect)]` name `::attest` from inside this crate
extern crate self as attest;

pub mod class;
pub mod cli;
pub mod compare;
pub mod config;
pub mod console;
pub mod demo;
pub mod engine;
pub mod error;
pub mod exception;
pub mod factory;
pub mod fixture;
pub mod model;
pub mod reactive;
pub mod reflect;
pub mod registry;
pub mod reporter;
pub mod runner;
pub mod value;

pub use class::{Class, Method};
pub use compare::{Comparator, Comparer, DefaultComparer, SequenceComparer};
pub use config::RunConfig;
pub use error::{FixtureError, RegistryError, RunError};
pub use exception::{Exception, ExceptionType, Thrown};
pub use factory::{ComparerType, InputType};
pub use fixture::FixtureBinding;
pub use model::{ExecutionResult, FailureKind, TestUnit, UnitKind};
pub use reflect::Reflect;
pub use registry::{Registry, Scope};
pub use reporter::{ConsoleReporter, Tally, TestReporter};
pub use runner::Runner;
pub use value::Value;
