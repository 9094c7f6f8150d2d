//! Run summary handed to reporters

use super::{serialize_millis, TestResult, TestStatus};
use crate::error::Result;
use crate::registry::HookKind;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A hook failure that belongs to a suite rather than a single test
#[derive(Debug, Clone, Serialize)]
pub struct SuiteError {
    /// Qualified suite path; empty for the root scope
    pub suite: String,
    pub hook: HookKind,
    pub message: String,
}

impl fmt::Display for SuiteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suite.is_empty() {
            write!(f, "{} at root scope: {}", self.hook, self.message)
        } else {
            write!(f, "{} in '{}': {}", self.hook, self.suite, self.message)
        }
    }
}

/// Summary report for an entire test run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestReport {
    /// One entry per declared test, in execution order.
    pub results: Vec<TestResult>,
    /// `afterAll` failures.
    pub suite_errors: Vec<SuiteError>,
    /// Total number of tests.
    pub total: usize,
    /// Number of passed tests.
    pub passed: usize,
    /// Number of failed tests.
    pub failed: usize,
    /// Number of skipped tests.
    pub skipped: usize,
    /// Total wall-clock duration.
    #[serde(rename = "durationMs", serialize_with = "serialize_millis")]
    pub duration: Duration,
}

impl TestReport {
    pub(crate) fn new(results: Vec<TestResult>, suite_errors: Vec<SuiteError>, duration: Duration) -> Self {
        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
        Self {
            total: results.len(),
            passed: count(TestStatus::Passed),
            failed: count(TestStatus::Failed),
            skipped: count(TestStatus::Skipped),
            results,
            suite_errors,
            duration,
        }
    }

    /// No failed tests and no suite-level errors
    pub fn success(&self) -> bool {
        self.failed == 0 && self.suite_errors.is_empty()
    }

    /// Look up a result by qualified name
    pub fn result(&self, name: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Serialize for machine-readable reporters
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for TestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Test Report")?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;

        for result in &self.results {
            let icon = match result.status {
                TestStatus::Passed => "✓",
                TestStatus::Failed => "✗",
                TestStatus::Skipped => "○",
            };
            writeln!(f, "    {} {} ({:?})", icon, result.name, result.duration)?;
            if let Some(ref failure) = result.failure {
                for line in failure.to_string().lines() {
                    writeln!(f, "      {}", line)?;
                }
            }
        }

        if !self.suite_errors.is_empty() {
            writeln!(f, "\n  Suite errors:")?;
            for error in &self.suite_errors {
                writeln!(f, "    ✗ {}", error)?;
            }
        }

        writeln!(f, "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "  Total: {}  Passed: {}  Failed: {}  Skipped: {}",
            self.total, self.passed, self.failed, self.skipped
        )?;
        writeln!(f, "  Duration: {:?}", self.duration)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{Failure, FailureKind, FailureOrigin};

    fn sample() -> TestReport {
        TestReport::new(
            vec![
                TestResult {
                    name: "demo > a".into(),
                    status: TestStatus::Passed,
                    failure: None,
                    duration: Duration::from_millis(10),
                },
                TestResult {
                    name: "demo > b".into(),
                    status: TestStatus::Failed,
                    failure: Some(Failure {
                        kind: FailureKind::Runtime,
                        origin: FailureOrigin::Hook(HookKind::BeforeEach),
                        message: "nope".into(),
                        details: vec![],
                        assertion: None,
                    }),
                    duration: Duration::from_millis(20),
                },
                TestResult {
                    name: "demo > c".into(),
                    status: TestStatus::Skipped,
                    failure: None,
                    duration: Duration::ZERO,
                },
            ],
            vec![SuiteError {
                suite: "demo".into(),
                hook: HookKind::AfterAll,
                message: "leak".into(),
            }],
            Duration::from_millis(42),
        )
    }

    #[test]
    fn test_report_counts() {
        let report = sample();
        assert_eq!(report.total, 3);
        assert_eq!(report.passed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.skipped, 1);
        assert!(!report.success());
        assert_eq!(report.result("demo > c").map(|r| r.status), Some(TestStatus::Skipped));
    }

    #[test]
    fn test_report_display() {
        let text = format!("{}", sample());
        assert!(text.contains("✗ demo > b"));
        assert!(text.contains("      beforeEach hook: nope"));
        assert!(text.contains("✗ afterAll in 'demo': leak"));
        assert!(text.contains("Total: 3  Passed: 1  Failed: 1  Skipped: 1"));
    }

    #[test]
    fn test_report_json() {
        let json: serde_json::Value = serde_json::from_str(&sample().to_json().unwrap()).unwrap();
        assert_eq!(json["total"], 3);
        assert_eq!(json["durationMs"], 42.0);
        assert_eq!(json["results"][1]["status"], "failed");
        assert_eq!(json["results"][1]["failure"]["origin"]["hook"], "beforeEach");
        assert_eq!(json["results"][0]["durationMs"], 10.0);
        assert_eq!(json["suiteErrors"][0]["hook"], "afterAll");
    }
}
