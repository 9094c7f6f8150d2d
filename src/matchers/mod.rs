//! Fluent assertions
//!
//! [`expect`] wraps a received value; each matcher evaluates eagerly and
//! returns a [`MatchResult`]. Inside a test body the failure converts into
//! the body's `anyhow::Error` through `?`, and the runner recovers it with a
//! downcast to classify the test as an assertion failure.
//!
//! ```
//! use quicksuite::expect;
//!
//! fn body() -> anyhow::Result<()> {
//!     expect(vec![1, 2, 3]).to_have_length(3)?;
//!     expect("hello world").to_contain("wor")?;
//!     Ok(())
//! }
//! # body().unwrap();
//! ```

use crate::value::{deep_equals, first_difference, Value};
use regex::Regex;
use std::fmt;

/// Outcome of a single matcher
pub type MatchResult = std::result::Result<(), MatcherFailure>;

/// Structured description of a failed matcher.
///
/// Values are kept as-is and only rendered when the failure is displayed.
#[derive(Debug, Clone)]
pub struct MatcherFailure {
    matcher: &'static str,
    received: Value,
    expected: Option<Value>,
    message: String,
}

impl MatcherFailure {
    /// Create a failure for `matcher` with an explanation
    pub fn new(
        matcher: &'static str,
        received: Value,
        expected: Option<Value>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            matcher,
            received,
            expected,
            message: message.into(),
        }
    }

    /// Name of the matcher that failed, e.g. `to_be_equal`
    pub fn matcher_name(&self) -> &'static str {
        self.matcher
    }

    /// The value passed to `expect`
    pub fn received(&self) -> &Value {
        &self.received
    }

    /// The matcher argument, for binary matchers
    pub fn expected(&self) -> Option<&Value> {
        self.expected.as_ref()
    }

    /// Human-readable explanation without the rendered values
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for MatcherFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.matcher, self.message)?;
        if let Some(ref expected) = self.expected {
            write!(f, "\n  Expected: {}", expected)?;
        }
        write!(f, "\n  Received: {}", self.received)
    }
}

impl std::error::Error for MatcherFailure {}

/// Start an assertion chain on `received`
pub fn expect(received: impl Into<Value>) -> Expectation {
    Expectation {
        received: received.into(),
    }
}

/// Matcher chain returned by [`expect`]
#[derive(Debug, Clone)]
pub struct Expectation {
    received: Value,
}

impl Expectation {
    /// The value under test
    pub fn received(&self) -> &Value {
        &self.received
    }

    fn check(&self, pass: bool, matcher: &'static str, message: impl Into<String>) -> MatchResult {
        if pass {
            Ok(())
        } else {
            Err(MatcherFailure::new(matcher, self.received.clone(), None, message))
        }
    }

    fn check_against(
        &self,
        pass: bool,
        matcher: &'static str,
        expected: Value,
        message: impl Into<String>,
    ) -> MatchResult {
        if pass {
            Ok(())
        } else {
            Err(MatcherFailure::new(
                matcher,
                self.received.clone(),
                Some(expected),
                message,
            ))
        }
    }

    /// Passes unless the received value is `undefined`
    pub fn to_be_defined(&self) -> MatchResult {
        self.check(
            !self.received.is_undefined(),
            "to_be_defined",
            "expected value to be defined",
        )
    }

    /// Passes only for `undefined`
    pub fn to_be_undefined(&self) -> MatchResult {
        self.check(
            self.received.is_undefined(),
            "to_be_undefined",
            "expected value to be undefined",
        )
    }

    /// Passes when received and expected are deep-equal
    pub fn to_be_equal(&self, expected: impl Into<Value>) -> MatchResult {
        let expected = expected.into();
        if deep_equals(&self.received, &expected) {
            return Ok(());
        }
        let message = match first_difference(&self.received, &expected) {
            Some(diff) => format!("expected values to be deeply equal ({})", diff),
            None => "expected values to be deeply equal".to_string(),
        };
        self.check_against(false, "to_be_equal", expected, message)
    }

    /// Passes when received and expected are not deep-equal
    pub fn to_be_not_equal(&self, expected: impl Into<Value>) -> MatchResult {
        let expected = expected.into();
        let pass = !deep_equals(&self.received, &expected);
        self.check_against(
            pass,
            "to_be_not_equal",
            expected,
            "expected values to differ",
        )
    }

    /// Passes for `false`, `0`, `NaN`, `""`, `null` and `undefined`
    pub fn to_be_falsy(&self) -> MatchResult {
        self.check(
            !self.received.to_boolean(),
            "to_be_falsy",
            "expected value to be falsy",
        )
    }

    /// Passes for every value that is not falsy
    pub fn to_be_truthy(&self) -> MatchResult {
        self.check(
            self.received.to_boolean(),
            "to_be_truthy",
            "expected value to be truthy",
        )
    }

    /// Passes only for `null`
    pub fn to_be_null(&self) -> MatchResult {
        self.check(self.received.is_null(), "to_be_null", "expected value to be null")
    }

    /// Passes for everything except `null`
    pub fn to_be_not_null(&self) -> MatchResult {
        self.check(
            !self.received.is_null(),
            "to_be_not_null",
            "expected value not to be null",
        )
    }

    /// Passes when the received value has a length equal to `expected`
    pub fn to_have_length(&self, expected: usize) -> MatchResult {
        match self.received.length() {
            Some(len) => self.check_against(
                len == expected,
                "to_have_length",
                Value::from(expected),
                format!("expected length {}, got {}", expected, len),
            ),
            None => self.check_against(
                false,
                "to_have_length",
                Value::from(expected),
                format!("{} value has no length", self.received.type_name()),
            ),
        }
    }

    /// Passes only for the number NaN
    pub fn to_be_nan(&self) -> MatchResult {
        self.check(self.received.is_nan(), "to_be_nan", "expected value to be NaN")
    }

    /// Passes when both values are numbers and received > expected
    pub fn to_be_greater_than(&self, expected: impl Into<Value>) -> MatchResult {
        self.compare(expected.into(), "to_be_greater_than", "greater than", |a, b| a > b)
    }

    /// Passes when both values are numbers and received < expected
    pub fn to_be_less_than(&self, expected: impl Into<Value>) -> MatchResult {
        self.compare(expected.into(), "to_be_less_than", "less than", |a, b| a < b)
    }

    fn compare(
        &self,
        expected: Value,
        matcher: &'static str,
        relation: &str,
        op: impl Fn(f64, f64) -> bool,
    ) -> MatchResult {
        match (self.received.as_number(), expected.as_number()) {
            (Some(a), Some(b)) => {
                let message = format!("expected {} to be {} {}", self.received, relation, expected);
                self.check_against(op(a, b), matcher, expected, message)
            }
            _ => {
                let message = format!(
                    "both values must be numbers (got {} and {})",
                    self.received.type_name(),
                    expected.type_name()
                );
                self.check_against(false, matcher, expected, message)
            }
        }
    }

    /// Passes when an array holds an element deep-equal to `item`, or a
    /// string contains `item` as a substring
    pub fn to_contain(&self, item: impl Into<Value>) -> MatchResult {
        let item = item.into();
        match (&self.received, &item) {
            (Value::Array(items), _) => {
                let pass = items.iter().any(|v| deep_equals(v, &item));
                self.check_against(pass, "to_contain", item, "expected array to contain item")
            }
            (Value::String(haystack), Value::String(needle)) => {
                let pass = haystack.contains(needle.as_str());
                self.check_against(pass, "to_contain", item, "expected string to contain substring")
            }
            (Value::String(_), _) => {
                let message = format!("a string can only contain a string, not {}", item.type_name());
                self.check_against(false, "to_contain", item, message)
            }
            _ => {
                let message = format!(
                    "expected an array or string, got {}",
                    self.received.type_name()
                );
                self.check_against(false, "to_contain", item, message)
            }
        }
    }

    /// Passes when the received string matches the regular expression
    pub fn to_match(&self, pattern: &str) -> MatchResult {
        let expected = Value::from(pattern);
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(e) => {
                let message = format!("invalid regular expression: {}", e);
                return self.check_against(false, "to_match", expected, message);
            }
        };
        match self.received.as_str() {
            Some(s) => self.check_against(
                regex.is_match(s),
                "to_match",
                expected,
                "expected string to match pattern",
            ),
            None => {
                let message = format!("expected a string, got {}", self.received.type_name());
                self.check_against(false, "to_match", expected, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defined_and_undefined() {
        assert!(expect(1).to_be_defined().is_ok());
        assert!(expect(Value::Null).to_be_defined().is_ok());
        assert!(expect(()).to_be_defined().is_err());
        assert!(expect(()).to_be_undefined().is_ok());
        assert!(expect(Value::Null).to_be_undefined().is_err());
    }

    #[test]
    fn test_null_is_not_undefined() {
        assert!(expect(None::<i32>).to_be_null().is_ok());
        assert!(expect(()).to_be_null().is_err());
        assert!(expect(()).to_be_not_null().is_ok());
        assert!(expect(Value::Null).to_be_not_null().is_err());
    }

    #[test]
    fn test_failure_carries_structure() {
        let err = expect(vec![1, 2]).to_be_equal(vec![1, 3]).unwrap_err();
        assert_eq!(err.matcher_name(), "to_be_equal");
        assert_eq!(err.received(), &Value::from(vec![1, 2]));
        assert_eq!(err.expected(), Some(&Value::from(vec![1, 3])));
        assert_eq!(
            err.to_string(),
            "to_be_equal: expected values to be deeply equal (2 differs from expected 3 at [1])\n  Expected: [1, 3]\n  Received: [1, 2]"
        );
    }

    #[test]
    fn test_unary_failure_omits_expected() {
        let err = expect(0).to_be_truthy().unwrap_err();
        assert!(err.expected().is_none());
        assert_eq!(err.to_string(), "to_be_truthy: expected value to be truthy\n  Received: 0");
    }

    #[test]
    fn test_not_equal() {
        assert!(expect("a").to_be_not_equal("b").is_ok());
        assert!(expect(f64::NAN).to_be_not_equal(f64::NAN).is_err());
    }

    #[test]
    fn test_numeric_comparisons() {
        assert!(expect(3).to_be_greater_than(2).is_ok());
        assert!(expect(2).to_be_greater_than(2).is_err());
        assert!(expect(1.5).to_be_less_than(2).is_ok());
        assert!(expect(f64::NAN).to_be_less_than(2).is_err());
        let err = expect("3").to_be_greater_than(2).unwrap_err();
        assert_eq!(err.message(), "both values must be numbers (got string and number)");
    }

    #[test]
    fn test_to_have_length_without_length() {
        let err = expect(true).to_have_length(1).unwrap_err();
        assert_eq!(err.message(), "boolean value has no length");
    }

    #[test]
    fn test_to_contain_deep_element() {
        let received = Value::array([Value::object([("id", 1)]), Value::object([("id", 2)])]);
        assert!(expect(received.clone()).to_contain(Value::object([("id", 2)])).is_ok());
        assert!(expect(received).to_contain(Value::object([("id", 3)])).is_err());
        assert!(expect("abc").to_contain(1).is_err());
        assert!(expect(5).to_contain(5).is_err());
    }

    #[test]
    fn test_to_match() {
        assert!(expect("order-1234").to_match(r"^order-\d+$").is_ok());
        assert!(expect("order-x").to_match(r"^order-\d+$").is_err());
        assert!(expect(12).to_match(r"\d").is_err());
        let err = expect("x").to_match("(").unwrap_err();
        assert!(err.message().starts_with("invalid regular expression"));
    }

    #[test]
    fn test_question_mark_into_anyhow() {
        fn body() -> anyhow::Result<()> {
            expect(1).to_be_equal(2)?;
            Ok(())
        }
        let err = body().unwrap_err();
        assert!(err.downcast_ref::<MatcherFailure>().is_some());
    }
}
