//! Hooks for watching requests, responses and validations

use std::sync::Mutex;

use apicontract_core::{ContractError, Exchange, HttpRequest};
use tracing::{debug, info, warn};

/// Receives every step of a contract call. All hooks default to no-ops.
pub trait ExchangeObserver: Send + Sync {
    fn on_request(&self, _scenario: &str, _request: &HttpRequest) {}

    /// Called once per request, with either a response or a transport error.
    fn on_exchange(&self, _exchange: &Exchange) {}

    fn on_validation(&self, _scenario: &str, _scope: &str, _result: &Result<(), ContractError>) {}
}

/// Logs each step through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExchangeObserver for TracingObserver {
    fn on_request(&self, scenario: &str, request: &HttpRequest) {
        debug!(
            target: "apicontract::exchange",
            scenario = %scenario,
            method = %request.method,
            url = %request.url,
            body = request.body.as_deref().unwrap_or(""),
            "request start"
        );
    }

    fn on_exchange(&self, exchange: &Exchange) {
        match (&exchange.response, &exchange.error) {
            (Some(response), _) => info!(
                target: "apicontract::exchange",
                scenario = %exchange.scenario,
                operation = %exchange.request.operation(),
                status = response.status(),
                elapsed_ms = exchange.elapsed_ms,
                body = response.body(),
                "request complete"
            ),
            (None, error) => warn!(
                target: "apicontract::exchange",
                scenario = %exchange.scenario,
                operation = %exchange.request.operation(),
                elapsed_ms = exchange.elapsed_ms,
                "request failed: {}",
                error.as_deref().unwrap_or("no response")
            ),
        }
    }

    fn on_validation(&self, scenario: &str, scope: &str, result: &Result<(), ContractError>) {
        match result {
            Ok(()) => debug!(
                target: "apicontract::validation",
                scenario = %scenario,
                scope = %scope,
                "expectations met"
            ),
            Err(e) => warn!(
                target: "apicontract::validation",
                scenario = %scenario,
                scope = %scope,
                "{e}"
            ),
        }
    }
}

/// Keeps every exchange in memory for dumps and reproductions
#[derive(Debug, Default)]
pub struct Recorder {
    exchanges: Mutex<Vec<Exchange>>,
}

impl Recorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of exchanges recorded so far
    pub fn len(&self) -> usize {
        self.exchanges.lock().map_or(0, |e| e.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last request sent, if any
    pub fn last_request(&self) -> Option<HttpRequest> {
        self.exchanges
            .lock()
            .ok()
            .and_then(|e| e.last().map(|x| x.request.clone()))
    }

    /// Drain the recorded exchanges
    pub fn take(&self) -> Vec<Exchange> {
        self.exchanges
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl ExchangeObserver for Recorder {
    fn on_exchange(&self, exchange: &Exchange) {
        if let Ok(mut exchanges) = self.exchanges.lock() {
            exchanges.push(exchange.clone());
        }
    }
}
