//! Shared test helpers for integration tests

use quicksuite::{Registry, RegistryBuilder, TestConfig, TestReport, TestRunner, TestStatus};
use std::cell::RefCell;
use std::rc::Rc;
use std::task::Poll;

/// Shared, append-only event log for observing execution order
#[derive(Clone, Default)]
pub struct Log(Rc<RefCell<Vec<String>>>);

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// A sync hook or body that records `entry` and succeeds
    #[allow(dead_code)]
    pub fn recorder(&self, entry: &str) -> impl Fn() -> quicksuite::Outcome + 'static {
        let log = self.clone();
        let entry = entry.to_string();
        move || {
            log.push(entry.clone());
            Ok(())
        }
    }
}

/// Declare and run with the default configuration
#[allow(dead_code)]
pub fn run(declarations: impl FnOnce(&mut RegistryBuilder)) -> TestReport {
    let registry = Registry::declare(declarations).expect("declarations should be valid");
    TestRunner::new(TestConfig::default()).run_blocking(&registry)
}

/// `(qualified name, status)` pairs in execution order
#[allow(dead_code)]
pub fn statuses(report: &TestReport) -> Vec<(String, TestStatus)> {
    report
        .results
        .iter()
        .map(|r| (r.name.clone(), r.status))
        .collect()
}

/// Suspend once, waking immediately, so async bodies genuinely yield
#[allow(dead_code)]
pub async fn yield_now() {
    let mut yielded = false;
    futures::future::poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}
