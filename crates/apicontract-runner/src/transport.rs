//! Wire transport: turns an assembled request into a response

use std::collections::BTreeMap;
use std::time::Duration;

use apicontract_core::{ContractError, HttpRequest, Method, ResponseHandle};

/// Sends one request and returns whatever came back.
///
/// Any HTTP status is a successful exchange; only failures to obtain a
/// response at all are errors.
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ContractError::Transport`] on connection, TLS or timeout
    /// failure.
    fn execute(&self, request: &HttpRequest) -> Result<ResponseHandle, ContractError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<ResponseHandle, ContractError> + Send + Sync,
{
    fn execute(&self, request: &HttpRequest) -> Result<ResponseHandle, ContractError> {
        self(request)
    }
}

/// Blocking reqwest transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built (e.g. TLS backend
    /// initialisation).
    pub fn new(timeout: Duration) -> Result<Self, ContractError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("apicontract/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ContractError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: &HttpRequest) -> Result<ResponseHandle, ContractError> {
        let mut req = self
            .client
            .request(to_reqwest(request.method), &request.url);
        for (k, v) in &request.headers {
            if reqwest::header::HeaderValue::from_str(v).is_err() {
                return Err(ContractError::Request(format!(
                    "header {k} has a value that cannot be sent"
                )));
            }
            req = req.header(k, v);
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let resp = req
            .send()
            .map_err(|e| ContractError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let headers: BTreeMap<String, String> = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = resp
            .text()
            .map_err(|e| ContractError::Transport(format!("reading body: {e}")))?;

        Ok(ResponseHandle::new(status, headers, body))
    }
}
