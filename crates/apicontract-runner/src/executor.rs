//! Request executor: resolves a call, sends it, validates the answer

use std::sync::Arc;
use std::time::Instant;

use apicontract_core::{
    Call, Config, ContractError, Exchange, HttpRequest, RequestBody, RequestDefaults,
    ResponseExpectations, ResponseHandle, Specification,
};
use time::Duration;

use crate::observer::ExchangeObserver;
use crate::transport::{HttpTransport, Transport};

/// Shared client for one suite run.
///
/// Cheap to clone; every clone shares the transport and observers.
#[derive(Clone)]
pub struct ContractClient {
    transport: Arc<dyn Transport>,
    defaults: RequestDefaults,
    observers: Vec<Arc<dyn ExchangeObserver>>,
    timestamp_tolerance: Duration,
    scenario: String,
}

impl std::fmt::Debug for ContractClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractClient")
            .field("defaults", &self.defaults)
            .field("observers", &self.observers.len())
            .field("timestamp_tolerance", &self.timestamp_tolerance)
            .field("scenario", &self.scenario)
            .finish_non_exhaustive()
    }
}

impl ContractClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, defaults: RequestDefaults) -> Self {
        Self {
            transport,
            defaults,
            observers: Vec::new(),
            timestamp_tolerance: Duration::days(1),
            scenario: String::new(),
        }
    }

    /// Client over the blocking HTTP transport, configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ContractError> {
        let transport = HttpTransport::new(std::time::Duration::from_secs(config.timeout_secs))?;
        Ok(Self::new(Arc::new(transport), config.request_defaults())
            .with_timestamp_tolerance(Duration::seconds(
                i64::try_from(config.timestamp_tolerance_secs).unwrap_or(i64::MAX),
            )))
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExchangeObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn with_timestamp_tolerance(mut self, tolerance: Duration) -> Self {
        self.timestamp_tolerance = tolerance;
        self
    }

    /// Clone labelled with a scenario name, used in exchanges and logs.
    #[must_use]
    pub fn for_scenario(&self, name: impl Into<String>) -> Self {
        Self {
            scenario: name.into(),
            ..self.clone()
        }
    }

    /// Allowed distance between server timestamps and the local clock
    #[must_use]
    pub fn timestamp_tolerance(&self) -> Duration {
        self.timestamp_tolerance
    }

    #[must_use]
    pub fn defaults(&self) -> &RequestDefaults {
        &self.defaults
    }

    #[must_use]
    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    /// Assemble the wire request without sending it.
    ///
    /// A content type set on the call or specification wins over the one
    /// implied by the payload.
    ///
    /// # Errors
    ///
    /// [`ContractError::Request`] when no base URL is known;
    /// [`ContractError::Parse`] when the payload cannot be rendered.
    pub fn prepare(
        &self,
        call: &Call,
        payload: Option<&dyn RequestBody>,
        spec: Option<&Specification>,
    ) -> Result<HttpRequest, ContractError> {
        let resolved = call.resolve(spec, &self.defaults)?;
        let body = payload.map(|p| p.to_body()).transpose()?;

        let content_type = resolved
            .content_type
            .or_else(|| payload.and_then(|p| p.content_type()).map(str::to_string));

        let mut headers = resolved.headers;
        if let Some(ct) = content_type {
            let has_header = headers.keys().any(|k| k.eq_ignore_ascii_case("content-type"));
            if !has_header {
                headers.insert("Content-Type".to_string(), ct);
            }
        }

        Ok(HttpRequest {
            method: resolved.target.method,
            url: resolved.target.url(),
            headers,
            body,
        })
    }

    /// Send one request and capture the response.
    ///
    /// Final parameters are the call's explicit values over `spec`'s request
    /// defaults over the client defaults. Non-2xx statuses are not errors.
    ///
    /// # Errors
    ///
    /// Assembly errors from [`ContractClient::prepare`];
    /// [`ContractError::Transport`] when no response arrives.
    pub fn send(
        &self,
        call: &Call,
        payload: Option<&dyn RequestBody>,
        spec: Option<&Specification>,
    ) -> Result<ResponseHandle, ContractError> {
        let request = self.prepare(call, payload, spec)?;

        for observer in &self.observers {
            observer.on_request(&self.scenario, &request);
        }

        let start = Instant::now();
        let result = self.transport.execute(&request);
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let exchange = Exchange {
            scenario: self.scenario.clone(),
            request,
            response: result.as_ref().ok().cloned(),
            error: result.as_ref().err().map(ToString::to_string),
            elapsed_ms,
        };
        for observer in &self.observers {
            observer.on_exchange(&exchange);
        }

        result
    }

    /// Validate a response against ad-hoc expectations.
    ///
    /// # Errors
    ///
    /// See [`ResponseHandle::assert_against`].
    pub fn verify(
        &self,
        handle: &ResponseHandle,
        expectations: &ResponseExpectations,
    ) -> Result<(), ContractError> {
        let result = handle.assert_against(expectations);
        self.notify_validation("response", &result);
        result
    }

    /// Validate a response against a specification's response side.
    ///
    /// # Errors
    ///
    /// See [`ResponseHandle::satisfies`].
    pub fn verify_spec(
        &self,
        handle: &ResponseHandle,
        spec: &Specification,
    ) -> Result<(), ContractError> {
        let result = handle.satisfies(spec);
        self.notify_validation(spec.name(), &result);
        result
    }

    fn notify_validation(&self, scope: &str, result: &Result<(), ContractError>) {
        for observer in &self.observers {
            observer.on_validation(&self.scenario, scope, result);
        }
    }
}
