//! quicksuite: a describe/test/expect test engine written in Rust
//!
//! Tests are declared as a tree of suites with `describe`, `test` and the four
//! lifecycle hooks, then executed by a strictly sequential runner that
//! produces one result per declared test. Assertions go through a fluent
//! `expect(value)` chain backed by structural deep equality.
//!
//! # Quick Start
//!
//! ```
//! use quicksuite::{expect, Registry, TestRunner};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! fn main() -> quicksuite::Result<()> {
//!     let stack = Rc::new(RefCell::new(Vec::new()));
//!
//!     let registry = Registry::declare(|ctx| {
//!         ctx.describe("stack", |ctx| {
//!             let fixture = stack.clone();
//!             ctx.before_each(move || {
//!                 fixture.borrow_mut().push(1);
//!                 Ok(())
//!             });
//!             let fixture = stack.clone();
//!             ctx.after_each(move || {
//!                 fixture.borrow_mut().clear();
//!                 Ok(())
//!             });
//!             let fixture = stack.clone();
//!             ctx.test("starts with one element", move || {
//!                 expect(fixture.borrow().clone()).to_be_equal(vec![1])?;
//!                 Ok(())
//!             });
//!         });
//!     })?;
//!
//!     let report = TestRunner::default().run_blocking(&registry);
//!     assert!(report.success());
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! Declarations → [`registry`] (frozen tree) → [`runner`] (results) ← [`matchers`] (assertions)
//!
//! | Category | Modules |
//! |----------|---------|
//! | **Core** | [`registry`], [`runner`], [`matchers`], [`value`], [`error`](Error) |
//! | **Tooling** | [`harness`] |

pub mod harness;
pub mod matchers;
pub mod prelude;
pub mod registry;
pub mod runner;
pub mod value;

mod error;

pub use error::{DeclarationKind, Error, Result};
pub use matchers::{expect, Expectation, MatchResult, MatcherFailure};
pub use registry::{Callback, HookKind, Mode, Options, Outcome, Registry, RegistryBuilder};
pub use runner::{
    Failure, FailureKind, FailureOrigin, SuiteError, TestConfig, TestReport, TestResult,
    TestRunner, TestStatus,
};
pub use value::Value;

/// quicksuite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
