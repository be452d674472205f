//! Verdict module - scenario outcomes, suite report, exit codes

mod outcome;
mod report;

pub use outcome::{FailureKind, Outcome};
pub use report::{ScenarioReport, SuiteReport, Verdict, VerdictStatus, generate_schema};
