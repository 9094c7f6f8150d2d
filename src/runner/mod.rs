//! Execution engine
//!
//! Walks a frozen [`Registry`] depth-first in declaration order and produces
//! one [`TestResult`] per declared test. For every suite:
//!
//! 1. A skipped suite, or one left with no matching test by the name
//!    filter, reports all of its tests as skipped without running any hook.
//! 2. `beforeAll` hooks run in order. The first failure fails every runnable
//!    test of the subtree with that error and skips the children.
//! 3. Children run in order. A test runs the `beforeEach` hooks of every
//!    ancestor (outermost first), its body, then the `afterEach` hooks
//!    (innermost first). The first error decides the failure; later hook
//!    errors are kept as details.
//! 4. `afterAll` hooks always run; their errors become [`SuiteError`]s.
//!
//! Everything is strictly sequential: async bodies are awaited before the
//! next step starts, and no two nodes ever run at the same time.
//!
//! ```
//! use quicksuite::{expect, Registry, TestConfig, TestRunner, TestStatus};
//!
//! let registry = Registry::declare(|ctx| {
//!     ctx.test("passes", || Ok(()));
//!     ctx.test("fails", || {
//!         expect(1).to_be_equal(2)?;
//!         Ok(())
//!     });
//! })
//! .unwrap();
//!
//! let report = TestRunner::new(TestConfig::default()).run_blocking(&registry);
//! assert_eq!(report.results[0].status, TestStatus::Passed);
//! assert_eq!(report.results[1].status, TestStatus::Failed);
//! ```

mod report;

pub use report::{SuiteError, TestReport};

use crate::matchers::MatcherFailure;
use crate::registry::{HookKind, Mode, Node, Registry, SuiteId, TestId};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use rustc_hash::FxHashSet as HashSet;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// TestResult
// ---------------------------------------------------------------------------

/// Outcome of a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Passed => write!(f, "PASSED"),
            TestStatus::Failed => write!(f, "FAILED"),
            TestStatus::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// What kind of error failed a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// A matcher raised a [`MatcherFailure`]
    Assertion,
    /// Any other error, including panics
    Runtime,
}

/// Where the failing error was raised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureOrigin {
    Body,
    Hook(HookKind),
}

impl fmt::Display for FailureOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureOrigin::Body => write!(f, "test body"),
            FailureOrigin::Hook(kind) => write!(f, "{} hook", kind),
        }
    }
}

/// Why a test failed
#[derive(Debug, Clone, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub origin: FailureOrigin,
    /// Rendered error, including any context chain
    pub message: String,
    /// Errors raised by `afterEach` hooks after the first failure
    pub details: Vec<String>,
    /// The structured mismatch, for assertion failures
    #[serde(skip)]
    pub assertion: Option<MatcherFailure>,
}

impl Failure {
    /// Classify an error raised by a hook or body
    pub fn from_error(origin: FailureOrigin, err: &anyhow::Error) -> Self {
        let assertion = err.downcast_ref::<MatcherFailure>().cloned();
        Self {
            kind: if assertion.is_some() {
                FailureKind::Assertion
            } else {
                FailureKind::Runtime
            },
            origin,
            message: format!("{:#}", err),
            details: Vec::new(),
            assertion,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            FailureOrigin::Body => write!(f, "{}", self.message)?,
            origin => write!(f, "{}: {}", origin, self.message)?,
        }
        for detail in &self.details {
            write!(f, "\n{}", detail)?;
        }
        Ok(())
    }
}

pub(crate) fn serialize_millis<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(duration.as_nanos() as f64 / 1_000_000.0)
}

/// Result record for one declared test
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// Suite path plus test name
    pub name: String,
    pub status: TestStatus,
    pub failure: Option<Failure>,
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl TestResult {
    fn skipped(name: String) -> Self {
        Self {
            name,
            status: TestStatus::Skipped,
            failure: None,
            duration: Duration::ZERO,
        }
    }

    /// Wall-clock duration in milliseconds
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_nanos() as f64 / 1_000_000.0
    }
}

// ---------------------------------------------------------------------------
// TestConfig
// ---------------------------------------------------------------------------

/// Configuration for the test runner.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Optional name filter: only tests whose qualified name contains the
    /// pattern are executed; the rest are reported as skipped.
    pub filter: Option<String>,
    /// Require the filter to equal the qualified name.
    pub exact: bool,
    /// Log every finished test at `info` level instead of `debug`.
    pub verbose: bool,
}

impl TestConfig {
    /// Whether a test with this qualified name passes the filter
    pub fn matches(&self, name: &str) -> bool {
        match self.filter {
            None => true,
            Some(ref pattern) if self.exact => name == pattern,
            Some(ref pattern) => name.contains(pattern.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// TestRunner
// ---------------------------------------------------------------------------

/// Main test runner.
///
/// A runner never mutates the registry, so the same tree can be run any
/// number of times.
#[derive(Debug, Clone, Default)]
pub struct TestRunner {
    /// Runner configuration.
    pub config: TestConfig,
}

impl TestRunner {
    /// Create a new runner with the given configuration.
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    /// Execute every registered suite and return the report.
    pub async fn run(&self, registry: &Registry) -> TestReport {
        let run_start = Instant::now();
        let mut execution = Execution::new(registry, &self.config);
        tracing::debug!(
            tests = registry.test_count(),
            runnable = execution.runnable.len(),
            "starting run"
        );
        execution.run_suite(Registry::ROOT).await;
        TestReport::new(execution.results, execution.suite_errors, run_start.elapsed())
    }

    /// Drive [`run`](TestRunner::run) to completion on the current thread.
    pub fn run_blocking(&self, registry: &Registry) -> TestReport {
        futures::executor::block_on(self.run(registry))
    }
}

// ---------------------------------------------------------------------------
// Internal: one walk over the tree
// ---------------------------------------------------------------------------

struct Execution<'r> {
    registry: &'r Registry,
    config: &'r TestConfig,
    /// Tests that will actually execute
    runnable: HashSet<TestId>,
    /// Suites whose hooks run
    active: HashSet<SuiteId>,
    results: Vec<TestResult>,
    suite_errors: Vec<SuiteError>,
}

impl<'r> Execution<'r> {
    fn new(registry: &'r Registry, config: &'r TestConfig) -> Self {
        let mut execution = Self {
            registry,
            config,
            runnable: HashSet::default(),
            active: HashSet::default(),
            results: Vec::with_capacity(registry.test_count()),
            suite_errors: Vec::new(),
        };
        execution.plan(Registry::ROOT, false);
        execution
    }

    /// Mark runnable tests and active suites; returns whether `id` holds a
    /// runnable test.
    ///
    /// A skipped suite is never active. Otherwise a suite is active unless a
    /// filter is set and nothing beneath it matches, so hooks of a Normal
    /// suite run even when every test in it is skipped.
    fn plan(&mut self, id: SuiteId, inherited_skip: bool) -> bool {
        let registry = self.registry;
        let suite = registry.suite(id);
        let skipped = inherited_skip || suite.mode == Mode::Skipped;
        let mut runnable = false;
        for child in &suite.children {
            match *child {
                Node::Test(tid) => {
                    if !registry.is_skipped(tid)
                        && registry.test(tid).body.is_some()
                        && self.config.matches(&registry.qualified_name(tid))
                    {
                        self.runnable.insert(tid);
                        runnable = true;
                    }
                }
                Node::Suite(sid) => runnable |= self.plan(sid, skipped),
            }
        }
        if !skipped && (runnable || self.config.filter.is_none()) {
            self.active.insert(id);
        }
        runnable
    }

    fn run_suite(&mut self, id: SuiteId) -> LocalBoxFuture<'_, ()> {
        async move {
            let registry = self.registry;
            let suite = registry.suite(id);
            let path = registry.suite_path(id);

            if !self.active.contains(&id) {
                tracing::debug!(suite = %path, "skipping suite");
                for tid in registry.tests_under(id) {
                    self.record_skipped(tid);
                }
                return;
            }
            tracing::debug!(suite = %path, "entering suite");

            let mut setup_failure = None;
            for hook in suite.hooks.get(HookKind::BeforeAll) {
                tracing::trace!(suite = %path, "beforeAll");
                if let Err(err) = hook.invoke().await {
                    let message = format!("{:#}", err);
                    tracing::warn!(suite = %path, error = %message, "beforeAll hook failed");
                    setup_failure = Some(Failure::from_error(
                        FailureOrigin::Hook(HookKind::BeforeAll),
                        &err,
                    ));
                    break;
                }
            }

            match setup_failure {
                Some(failure) => {
                    for tid in registry.tests_under(id) {
                        if self.runnable.contains(&tid) {
                            self.record(TestResult {
                                name: registry.qualified_name(tid),
                                status: TestStatus::Failed,
                                failure: Some(failure.clone()),
                                duration: Duration::ZERO,
                            });
                        } else {
                            self.record_skipped(tid);
                        }
                    }
                }
                None => {
                    for child in &suite.children {
                        match *child {
                            Node::Test(tid) => self.run_test(tid).await,
                            Node::Suite(sid) => self.run_suite(sid).await,
                        }
                    }
                }
            }

            for hook in suite.hooks.get(HookKind::AfterAll) {
                tracing::trace!(suite = %path, "afterAll");
                if let Err(err) = hook.invoke().await {
                    let message = format!("{:#}", err);
                    tracing::warn!(suite = %path, error = %message, "afterAll hook failed");
                    self.suite_errors.push(SuiteError {
                        suite: path.clone(),
                        hook: HookKind::AfterAll,
                        message,
                    });
                }
            }
        }
        .boxed_local()
    }

    async fn run_test(&mut self, id: TestId) {
        let registry = self.registry;
        let test = registry.test(id);
        let body = match test.body {
            Some(ref body) if self.runnable.contains(&id) => body,
            _ => {
                self.record_skipped(id);
                return;
            }
        };

        let name = registry.qualified_name(id);
        let start = Instant::now();
        let chain = registry.ancestry(test.parent);
        let mut failure: Option<Failure> = None;

        'setup: for sid in &chain {
            for hook in registry.suite(*sid).hooks.get(HookKind::BeforeEach) {
                tracing::trace!(test = %name, "beforeEach");
                if let Err(err) = hook.invoke().await {
                    failure = Some(Failure::from_error(
                        FailureOrigin::Hook(HookKind::BeforeEach),
                        &err,
                    ));
                    break 'setup;
                }
            }
        }

        if failure.is_none() {
            if let Err(err) = body.invoke().await {
                failure = Some(Failure::from_error(FailureOrigin::Body, &err));
            }
        }

        for sid in chain.iter().rev() {
            for hook in registry.suite(*sid).hooks.get(HookKind::AfterEach) {
                tracing::trace!(test = %name, "afterEach");
                if let Err(err) = hook.invoke().await {
                    match failure {
                        Some(ref mut first) => first
                            .details
                            .push(format!("{}: {:#}", FailureOrigin::Hook(HookKind::AfterEach), err)),
                        None => {
                            failure = Some(Failure::from_error(
                                FailureOrigin::Hook(HookKind::AfterEach),
                                &err,
                            ))
                        }
                    }
                }
            }
        }

        let status = if failure.is_some() {
            TestStatus::Failed
        } else {
            TestStatus::Passed
        };
        self.record(TestResult {
            name,
            status,
            failure,
            duration: start.elapsed(),
        });
    }

    fn record_skipped(&mut self, id: TestId) {
        let name = self.registry.qualified_name(id);
        self.record(TestResult::skipped(name));
    }

    fn record(&mut self, result: TestResult) {
        if self.config.verbose {
            tracing::info!(test = %result.name, status = %result.status, "test finished");
        } else {
            tracing::debug!(test = %result.name, status = %result.status, "test finished");
        }
        self.results.push(result);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
