//! CLI module for the attest runner
//!
//! The binary runs a registry of declared test classes and prints a line-oriented report.
//!
//! ## Flags
//!
//! - `--class <NAME>` - Run one class only (bypasses the visibility filter)
//! - `--category <TAG>` - Run only units with one of the given categories (repeatable)
//! - `-k <EXPR>` - Run only units whose `Class.method` contains `EXPR`
//! - `-x` / `--exitfirst` - Stop after the first failed unit
//! - `--list` - List the selected units without running them
//!
//! ## Exit codes
//!
//! `0` when every unit passed, `1` when any unit failed, `2` when the run was aborted by a
//! declaration or fixture error.
//!
//! ## Design
//!
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fmt;
use std::process;

use clap::Parser;

use crate::config::RunConfig;
use crate::registry::{Registry, Scope};
use crate::reporter::ConsoleReporter;
use crate::runner::Runner;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    /// At least one unit failed.
    pub const FAILURE: ExitCode = ExitCode(1);
    /// The run was aborted before completing.
    pub const FATAL: ExitCode = ExitCode(2);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// An error that aborts the run, rendered with its diagnostic.
    pub fn fatal(diagnostic: impl miette::Diagnostic + Send + Sync + 'static) -> Self {
        Self::new(format!("{:?}", miette::Report::new(diagnostic)), ExitCode::FATAL)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Declarative inline test runner
#[derive(Parser, Debug)]
#[command(name = "attest")]
#[command(version)]
#[command(about = "Discover and run declaratively annotated test classes", long_about = None)]
pub struct Cli {
    /// Run only the class registered under this name
    #[arg(long, value_name = "NAME")]
    pub class: Option<String>,

    /// Run only units tagged with this category (repeatable)
    #[arg(long = "category", value_name = "TAG")]
    pub categories: Vec<String>,

    /// Filter units by keyword on `Class.method`
    #[arg(short = 'k', value_name = "EXPR")]
    pub filter: Option<String>,

    /// Stop on first failure
    #[arg(short = 'x', long = "exitfirst")]
    pub stop_on_fail: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable coloured output (also honours NO_COLOR)
    #[arg(long)]
    pub no_color: bool,

    /// List the selected units without running them
    #[arg(long)]
    pub list: bool,
}

impl Cli {
    /// Scope selected by `--class`.
    pub fn scope(&self) -> Scope {
        match &self.class {
            Some(name) => Scope::Named(name.clone()),
            None => Scope::All,
        }
    }

    /// Run configuration from the flags, on top of the environment defaults.
    pub fn config(&self) -> RunConfig {
        let mut config = RunConfig::from_env()
            .with_verbose(self.verbose)
            .with_fail_fast(self.stop_on_fail);
        if self.no_color {
            config = config.with_color(false);
        }
        for category in &self.categories {
            config = config.with_category(category.clone());
        }
        if let Some(filter) = &self.filter {
            config = config.with_keyword(filter.clone());
        }
        config
    }
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run(registry: Registry) {
    let cli = Cli::parse();

    match execute(&cli, &registry) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI request and return the exit code.
pub fn execute(cli: &Cli, registry: &Registry) -> CliResult<ExitCode> {
    let config = cli.config();
    let scope = cli.scope();
    let reporter = ConsoleReporter::stdout()
        .with_color(config.color)
        .with_verbose(config.verbose);
    let mut runner = Runner::new(config, reporter);

    if cli.list {
        let units = runner.list(registry, &scope).map_err(CliError::fatal)?;
        for unit in &units {
            println!("{unit}");
        }
        println!("\n{} unit(s)", units.len());
        return Ok(ExitCode::SUCCESS);
    }

    let tally = runner.run(registry, &scope).map_err(CliError::fatal)?;
    if tally.all_passed() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

// ============================================================================
// Tests
// ============================================================================
