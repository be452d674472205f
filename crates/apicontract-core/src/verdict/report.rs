//! Suite-level report and final verdict

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{FailureKind, Outcome};
use crate::exchange::HttpRequest;

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioReport {
    pub name: String,
    pub outcome: Outcome,
    /// Requests sent by the scenario
    pub requests: u64,
    pub elapsed_ms: u64,
    /// Last request sent, kept for reproduction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_request: Option<HttpRequest>,
}

/// Results of a whole suite run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SuiteReport {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    #[must_use]
    pub fn from_scenarios(scenarios: Vec<ScenarioReport>) -> Self {
        let total = scenarios.len() as u64;
        let passed = scenarios.iter().filter(|s| s.outcome.is_pass()).count() as u64;
        Self {
            total,
            passed,
            failed: total - passed,
            scenarios,
        }
    }

    /// Failed scenarios, in run order
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioReport> {
        self.scenarios.iter().filter(|s| !s.outcome.is_pass())
    }

    fn count_kind(&self, kind: FailureKind) -> usize {
        self.failures()
            .filter(|s| s.outcome.kind() == Some(kind))
            .count()
    }

    /// Determine verdict from scenario outcomes.
    ///
    /// PASS requires at least one scenario and every scenario passing.
    /// The exit code is the highest exit code among failed scenarios.
    #[must_use]
    pub fn verdict(&self) -> Verdict {
        let exit_code = self
            .scenarios
            .iter()
            .map(|s| s.outcome.exit_code())
            .max()
            .unwrap_or(0);

        if self.total == 0 {
            return Verdict {
                status: VerdictStatus::Fail,
                exit_code: 3,
                reason: "No scenarios were run".to_string(),
            };
        }

        if self.failed == 0 {
            return Verdict {
                status: VerdictStatus::Pass,
                exit_code: 0,
                reason: format!("All {} scenarios passed", self.total),
            };
        }

        let mut parts = Vec::new();
        for kind in [
            FailureKind::Assertion,
            FailureKind::Deserialization,
            FailureKind::Parse,
            FailureKind::Request,
            FailureKind::Transport,
        ] {
            let n = self.count_kind(kind);
            if n > 0 {
                parts.push(format!("{n} {kind}"));
            }
        }

        Verdict {
            status: VerdictStatus::Fail,
            exit_code,
            reason: format!(
                "{} of {} scenarios failed ({})",
                self.failed,
                self.total,
                parts.join(", ")
            ),
        }
    }
}

/// Final verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: VerdictStatus,
    pub exit_code: i32,
    pub reason: String,
}

/// Pass or fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictStatus {
    Pass,
    Fail,
}

impl std::fmt::Display for VerdictStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
        }
    }
}

/// Generate JSON Schema for the report format.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schemars::schema_for!(SuiteReport);
    serde_json::to_string_pretty(&schema).expect("schema serialization should not fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, outcome: Outcome) -> ScenarioReport {
        ScenarioReport {
            name: name.to_string(),
            outcome,
            requests: 1,
            elapsed_ms: 5,
            last_request: None,
        }
    }

    fn fail(kind: FailureKind) -> Outcome {
        Outcome::Fail {
            kind,
            message: format!("{kind} failure"),
            mismatches: vec![],
        }
    }

    #[test]
    fn all_pass() {
        let suite = SuiteReport::from_scenarios(vec![
            report("a", Outcome::Pass),
            report("b", Outcome::Pass),
        ]);
        let v = suite.verdict();
        assert_eq!(v.status, VerdictStatus::Pass);
        assert_eq!(v.exit_code, 0);
        assert_eq!(v.reason, "All 2 scenarios passed");
    }

    #[test]
    fn empty_suite_is_tool_error() {
        let v = SuiteReport::default().verdict();
        assert_eq!(v.status, VerdictStatus::Fail);
        assert_eq!(v.exit_code, 3);
    }

    #[test]
    fn highest_exit_code_wins() {
        let suite = SuiteReport::from_scenarios(vec![
            report("a", fail(FailureKind::Assertion)),
            report("b", fail(FailureKind::Transport)),
            report("c", Outcome::Pass),
        ]);
        assert_eq!(suite.passed, 1);
        assert_eq!(suite.failed, 2);
        let v = suite.verdict();
        assert_eq!(v.status, VerdictStatus::Fail);
        assert_eq!(v.exit_code, 3);
        assert_eq!(v.reason, "2 of 3 scenarios failed (1 assertion, 1 transport)");
    }

    #[test]
    fn failures_in_order() {
        let suite = SuiteReport::from_scenarios(vec![
            report("a", fail(FailureKind::Parse)),
            report("b", Outcome::Pass),
            report("c", fail(FailureKind::Assertion)),
        ]);
        let names: Vec<_> = suite.failures().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn schema_title() {
        let schema: serde_json::Value = serde_json::from_str(&generate_schema()).unwrap();
        assert_eq!(
            schema.get("title").and_then(|v| v.as_str()),
            Some("SuiteReport")
        );
    }
}
