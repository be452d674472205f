//! Error taxonomy shared by every stage of a contract scenario

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Everything that can terminate a scenario.
///
/// None of these are recovered locally: they propagate with `?` until the
/// scenario reports its single outcome.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractError {
    /// Malformed JSON, inbound or outbound
    #[error("Parse error: {0}")]
    Parse(String),
    /// JSON was well-formed but a declared field had an incompatible type
    #[error("Deserialization error on `{field}`: {message}")]
    Deserialization { field: String, message: String },
    /// Connection, DNS, TLS or timeout failure reported by the transport
    #[error("Transport error: {0}")]
    Transport(String),
    /// Request could not be assembled (no base URL, invalid header, ...)
    #[error("Request error: {0}")]
    Request(String),
    /// One or more expectations did not hold
    #[error(transparent)]
    Assertion(#[from] AssertionFailure),
}

/// A single failed expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Mismatch {
    /// What was checked: `status`, `header:content-type`, or a JSON path
    pub path: String,
    /// Rendered predicate, e.g. `equal to "neo"`
    pub expected: String,
    /// Observed value, `<missing>` when the path did not resolve
    pub actual: String,
}

impl Mismatch {
    #[must_use]
    pub fn new(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

/// Aggregate of every mismatch found in one validation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssertionFailure {
    /// Specification name, or `response` for ad-hoc expectations
    pub scope: String,
    pub mismatches: Vec<Mismatch>,
}

impl AssertionFailure {
    #[must_use]
    pub fn new(scope: impl Into<String>, mismatches: Vec<Mismatch>) -> Self {
        Self {
            scope: scope.into(),
            mismatches,
        }
    }

    /// Single-mismatch failure.
    #[must_use]
    pub fn single(
        scope: impl Into<String>,
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(scope, vec![Mismatch::new(path, expected, actual)])
    }
}

impl fmt::Display for AssertionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} expectation(s) failed for {}",
            self.mismatches.len(),
            self.scope
        )?;
        for m in &self.mismatches {
            write!(f, "\n  - {m}")?;
        }
        Ok(())
    }
}

impl std::error::Error for AssertionFailure {}
