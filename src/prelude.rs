//! Prelude module for convenient imports
//!
//! Everything needed to declare, run and assert in one import:
//!
//! ```
//! use quicksuite::prelude::*;
//!
//! let registry = Registry::declare(|ctx| {
//!     ctx.test("truthy", || {
//!         expect("non-empty").to_be_truthy()?;
//!         Ok(())
//!     });
//! })
//! .unwrap();
//! assert!(TestRunner::default().run_blocking(&registry).success());
//! ```

// Declaration
pub use crate::registry::{HookKind, Options, Outcome, Registry, RegistryBuilder};

// Assertions
pub use crate::matchers::{expect, MatchResult, MatcherFailure};
pub use crate::value::Value;

// Execution
pub use crate::runner::{TestConfig, TestReport, TestResult, TestRunner, TestStatus};

// Error handling
pub use crate::error::{Error, Result};

// Version constant
pub use crate::VERSION;
