//! Error types for quicksuite

use std::fmt;
use thiserror::Error;

/// What kind of declaration an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    /// A `describe` block
    Suite,
    /// A `test` case
    Test,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKind::Suite => write!(f, "describe"),
            DeclarationKind::Test => write!(f, "test"),
        }
    }
}

/// Main error type for quicksuite
///
/// Test and hook failures are never reported through this type; they become
/// [`TestResult`](crate::runner::TestResult) entries. `Error` covers the
/// problems that stop a run from being set up at all.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed declaration, surfaced before anything executes
    #[error("UsageError: {kind} {}: {message}", if path.is_empty() { "at root scope".to_string() } else { format!("in '{}'", path) })]
    UsageError {
        kind: DeclarationKind,
        /// Qualified path of the enclosing suite
        path: String,
        message: String,
    },

    /// JSON conversion failure
    #[error("SerializationError: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    /// Create a usage error for a declaration inside `path`
    pub fn usage(kind: DeclarationKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::UsageError {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether this error came from a malformed declaration
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::UsageError { .. })
    }
}

/// Result type alias for quicksuite
pub type Result<T> = std::result::Result<T, Error>;

/// Standardized usage error messages
pub mod messages {
    pub const BLANK_NAME: &str = "name must not be blank";

    /// Format a "X name must not be blank" message with the rejected name
    pub fn blank_name(name: &str) -> String {
        format!("{} (got {:?})", BLANK_NAME, name)
    }
}
