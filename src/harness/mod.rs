//! Command-line entry point for test binaries
//!
//! A cargo test target declared with `harness = false` can hand its suites to
//! [`main`], which parses the command line, installs logging, runs the
//! registry and turns the report into an exit code:
//!
//! ```no_run
//! use quicksuite::expect;
//! use std::process::ExitCode;
//!
//! fn main() -> ExitCode {
//!     quicksuite::harness::main(|ctx| {
//!         ctx.describe("strings", |ctx| {
//!             ctx.test("upper", || {
//!                 expect("abc".to_uppercase()).to_be_equal("ABC")?;
//!                 Ok(())
//!             });
//!         });
//!     })
//! }
//! ```
//!
//! Panics raised by bodies and hooks are caught and reported as failures, so
//! the panic hook is silenced for the duration of the run. Pass `-vv` to keep
//! the default "thread panicked" output.

use crate::registry::{Registry, RegistryBuilder};
use crate::runner::{TestConfig, TestRunner};
use clap::Parser;
use std::panic;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Command-line options understood by [`run`]
#[derive(Debug, Default, Parser)]
#[command(name = "quicksuite")]
#[command(version, about = "Run declared describe/test suites", long_about = None)]
pub struct HarnessArgs {
    /// Only run tests whose qualified name contains FILTER
    #[arg(value_name = "FILTER")]
    pub filter: Option<String>,

    /// Require FILTER to match the qualified name exactly
    #[arg(long)]
    pub exact: bool,

    /// List tests without running them
    #[arg(long)]
    pub list: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only run ignored tests; there are none, so nothing runs
    #[arg(long, hide = true)]
    pub ignored: bool,

    // Flags cargo may forward to any test binary; accepted and ignored
    #[arg(long, hide = true)]
    pub nocapture: bool,
    #[arg(long, hide = true)]
    pub show_output: bool,
    #[arg(long, hide = true)]
    pub include_ignored: bool,
    #[arg(short, long, hide = true)]
    pub quiet: bool,
    #[arg(long, hide = true, value_name = "N")]
    pub test_threads: Option<usize>,
    #[arg(long, hide = true, value_name = "WHEN")]
    pub color: Option<String>,
    #[arg(long, hide = true, value_name = "FMT")]
    pub format: Option<String>,
}

impl HarnessArgs {
    /// Runner configuration derived from the command line
    pub fn config(&self) -> TestConfig {
        TestConfig {
            filter: self.filter.clone(),
            exact: self.exact,
            verbose: self.verbose > 0,
        }
    }
}

/// Declare suites, then [`run`] them. Usage errors abort before anything
/// executes.
pub fn main(declarations: impl FnOnce(&mut RegistryBuilder)) -> ExitCode {
    let args = HarnessArgs::parse();
    setup_logging(args.verbose);
    match Registry::declare(declarations) {
        Ok(registry) => exit_code(execute_quietly(&registry, &args)),
        Err(e) => {
            eprintln!("Test declaration error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Parse the process arguments and run `registry`
pub fn run(registry: &Registry) -> ExitCode {
    let args = HarnessArgs::parse();
    run_with_args(registry, &args)
}

/// Run `registry` with already-parsed options
pub fn run_with_args(registry: &Registry, args: &HarnessArgs) -> ExitCode {
    setup_logging(args.verbose);
    exit_code(execute_quietly(registry, args))
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn execute_quietly(registry: &Registry, args: &HarnessArgs) -> bool {
    if args.verbose >= 2 {
        execute(registry, args)
    } else {
        with_quiet_panics(|| execute(registry, args))
    }
}

/// Run `f` with the panic hook replaced by a no-op, restoring it afterwards
fn with_quiet_panics<T>(f: impl FnOnce() -> T) -> T {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let result = f();
    panic::set_hook(previous);
    result
}

/// Run or list the registry; returns whether the run succeeded
fn execute(registry: &Registry, args: &HarnessArgs) -> bool {
    if args.list {
        if !args.ignored {
            for id in registry.test_ids() {
                println!("{}: test", registry.qualified_name(id));
            }
        }
        return true;
    }
    if args.ignored {
        return true;
    }

    let report = TestRunner::new(args.config()).run_blocking(registry);

    if args.json {
        match report.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Test runner error: {}", e);
                return false;
            }
        }
    } else {
        print!("{}", report);
    }
    report.success()
}

/// Install a stderr `tracing` subscriber. `RUST_LOG` takes precedence over
/// the verbosity count. Does nothing if a subscriber is already set.
pub fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
