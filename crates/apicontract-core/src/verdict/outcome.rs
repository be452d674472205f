//! Classification of a scenario's single outcome

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ContractError, Mismatch};

/// Which of the error kinds ended a scenario - determines the exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Expectation mismatch
    Assertion,
    /// Declared field had the wrong JSON type
    Deserialization,
    /// Malformed JSON
    Parse,
    /// Request could not be assembled
    Request,
    /// Connection, TLS or timeout failure
    Transport,
}

impl FailureKind {
    /// Exit code for this kind
    ///
    /// - 1: the service broke its contract
    /// - 2: the payload could not be read as the declared model
    /// - 3: tool or environment error (nothing was validated)
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Assertion => 1,
            Self::Deserialization | Self::Parse => 2,
            Self::Request | Self::Transport => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Assertion => "assertion",
            Self::Deserialization => "deserialization",
            Self::Parse => "parse",
            Self::Request => "request",
            Self::Transport => "transport",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&ContractError> for FailureKind {
    fn from(err: &ContractError) -> Self {
        match err {
            ContractError::Assertion(_) => Self::Assertion,
            ContractError::Deserialization { .. } => Self::Deserialization,
            ContractError::Parse(_) => Self::Parse,
            ContractError::Request(_) => Self::Request,
            ContractError::Transport(_) => Self::Transport,
        }
    }
}

/// Pass, or the first unrecoverable error a scenario hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail {
        kind: FailureKind,
        message: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        mismatches: Vec<Mismatch>,
    },
}

impl Outcome {
    #[must_use]
    pub fn from_result(result: &Result<(), ContractError>) -> Self {
        match result {
            Ok(()) => Self::Pass,
            Err(err) => Self::Fail {
                kind: FailureKind::from(err),
                message: err.to_string(),
                mismatches: match err {
                    ContractError::Assertion(a) => a.mismatches.clone(),
                    _ => Vec::new(),
                },
            },
        }
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    #[must_use]
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            Self::Pass => None,
            Self::Fail { kind, .. } => Some(*kind),
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.kind().map_or(0, FailureKind::exit_code)
    }
}
