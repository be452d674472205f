//! Runs a set of scenarios and collects one report per scenario

use std::sync::Arc;
use std::time::Instant;

use apicontract_core::dump::mask_request;
use apicontract_core::{Exchange, Outcome, ScenarioReport, SuiteReport};
use tracing::info;

use crate::executor::ContractClient;
use crate::observer::Recorder;
use crate::scenarios::{self, Scenario};

/// Everything a suite run produced
#[derive(Debug, Default)]
pub struct SuiteRun {
    pub report: SuiteReport,
    /// All exchanges, grouped by scenario in run order
    pub exchanges: Vec<Exchange>,
}

/// Scenario selection and execution mode
#[derive(Debug, Clone)]
pub struct Suite {
    scenarios: Vec<&'static Scenario>,
    parallel: bool,
}

impl Default for Suite {
    fn default() -> Self {
        Self::all()
    }
}

impl Suite {
    /// Every registered scenario
    #[must_use]
    pub fn all() -> Self {
        Self {
            scenarios: scenarios::all().iter().collect(),
            parallel: false,
        }
    }

    /// Only the named scenarios, in the order given.
    ///
    /// # Errors
    ///
    /// Returns the first name that matches no scenario.
    pub fn select<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        let scenarios = names
            .iter()
            .map(|n| scenarios::find(n.as_ref()).ok_or_else(|| n.as_ref().to_string()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            scenarios,
            parallel: false,
        })
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Run the selected scenarios against `client`.
    ///
    /// Each scenario gets its own recorder so exchanges never interleave in
    /// the result, even in parallel mode.
    pub fn run(&self, client: &ContractClient) -> SuiteRun {
        info!(
            scenarios = self.scenarios.len(),
            parallel = self.parallel,
            "suite start"
        );

        let results: Vec<(ScenarioReport, Vec<Exchange>)> = if self.parallel {
            std::thread::scope(|s| {
                let handles: Vec<_> = self
                    .scenarios
                    .iter()
                    .map(|scenario| s.spawn(move || run_one(scenario, client)))
                    .collect();
                handles
                    .into_iter()
                    .zip(&self.scenarios)
                    .map(|(h, scenario)| {
                        h.join().unwrap_or_else(|_| panicked(scenario))
                    })
                    .collect()
            })
        } else {
            self.scenarios
                .iter()
                .map(|scenario| run_one(scenario, client))
                .collect()
        };

        let mut reports = Vec::with_capacity(results.len());
        let mut exchanges = Vec::new();
        for (report, recorded) in results {
            reports.push(report);
            exchanges.extend(recorded);
        }

        let report = SuiteReport::from_scenarios(reports);
        info!(
            passed = report.passed,
            failed = report.failed,
            "suite complete"
        );

        SuiteRun { report, exchanges }
    }
}

fn run_one(scenario: &Scenario, client: &ContractClient) -> (ScenarioReport, Vec<Exchange>) {
    let recorder = Arc::new(Recorder::new());
    let scoped = client
        .for_scenario(scenario.name)
        .with_observer(recorder.clone());

    let start = Instant::now();
    let result = scenario.run(&scoped);
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    let exchanges = recorder.take();
    let report = ScenarioReport {
        name: scenario.name.to_string(),
        outcome: Outcome::from_result(&result),
        requests: exchanges.len() as u64,
        elapsed_ms,
        last_request: exchanges.last().map(|e| mask_request(&e.request)),
    };
    (report, exchanges)
}

/// A scenario thread panicked; report it as a tool error.
fn panicked(scenario: &Scenario) -> (ScenarioReport, Vec<Exchange>) {
    let err = apicontract_core::ContractError::Request(format!(
        "scenario {} panicked",
        scenario.name
    ));
    let report = ScenarioReport {
        name: scenario.name.to_string(),
        outcome: Outcome::from_result(&Err(err)),
        requests: 0,
        elapsed_ms: 0,
        last_request: None,
    };
    (report, Vec::new())
}
