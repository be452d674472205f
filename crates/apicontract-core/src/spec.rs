//! Reusable request defaults and response expectations
//!
//! A [`Specification`] is built once and shared read-only between scenarios.
//! Per-call values are layered on top with [`RequestDefaults::overlay`]: the
//! explicit value wins field by field, anything left unset falls back to the
//! specification.

use std::collections::BTreeMap;

use crate::error::ContractError;
use crate::exchange::Method;
use crate::matcher::Matcher;
use crate::path::JsonPath;

const CONTENT_TYPE: &str = "content-type";

/// Insert `name`, replacing any entry that differs only in case.
pub(crate) fn set_header(headers: &mut BTreeMap<String, String>, name: String, value: String) {
    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
    headers.insert(name, value);
}

/// Request-side defaults. Every field is optional so layers can be merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestDefaults {
    pub base_url: Option<String>,
    pub path: Option<String>,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl RequestDefaults {
    /// Merge `explicit` over `self`. Headers merge per name, explicit wins.
    ///
    /// An explicit content type also displaces a `Content-Type` header
    /// inherited from `self`.
    #[must_use]
    pub fn overlay(&self, explicit: &RequestDefaults) -> RequestDefaults {
        let mut headers = self.headers.clone();
        if explicit.content_type.is_some() {
            headers.retain(|existing, _| !existing.eq_ignore_ascii_case(CONTENT_TYPE));
        }
        for (name, value) in &explicit.headers {
            set_header(&mut headers, name.clone(), value.clone());
        }
        RequestDefaults {
            base_url: explicit.base_url.clone().or_else(|| self.base_url.clone()),
            path: explicit.path.clone().or_else(|| self.path.clone()),
            content_type: explicit
                .content_type
                .clone()
                .or_else(|| self.content_type.clone()),
            headers,
        }
    }
}

/// A JSON path paired with the predicate it must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyMatcher {
    pub path: JsonPath,
    pub matcher: Matcher,
}

/// Response-side checks: status, headers, body paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseExpectations {
    /// Accepted statuses; empty means any
    statuses: Vec<u16>,
    headers: Vec<(String, Matcher)>,
    body: Vec<BodyMatcher>,
}

impl ResponseExpectations {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.statuses = vec![status];
        self
    }

    /// Accept any of `statuses`.
    #[must_use]
    pub fn status_in(mut self, statuses: &[u16]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, matcher: Matcher) -> Self {
        self.headers.push((name.into(), matcher));
        self
    }

    #[must_use]
    pub fn body(mut self, path: impl Into<JsonPath>, matcher: Matcher) -> Self {
        self.body.push(BodyMatcher {
            path: path.into(),
            matcher,
        });
        self
    }

    #[must_use]
    pub fn expected_status(&self) -> Option<u16> {
        match self.statuses.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    #[must_use]
    pub fn expected_statuses(&self) -> &[u16] {
        &self.statuses
    }

    #[must_use]
    pub fn header_matchers(&self) -> &[(String, Matcher)] {
        &self.headers
    }

    #[must_use]
    pub fn body_matchers(&self) -> &[BodyMatcher] {
        &self.body
    }
}

/// Named, immutable bundle of request defaults and response expectations.
#[derive(Debug, Clone, PartialEq)]
pub struct Specification {
    name: String,
    request: RequestDefaults,
    response: ResponseExpectations,
}

impl Specification {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        request: RequestDefaults,
        response: ResponseExpectations,
    ) -> Self {
        Self {
            name: name.into(),
            request,
            response,
        }
    }

    #[must_use]
    pub fn builder(name: impl Into<String>) -> SpecificationBuilder {
        SpecificationBuilder {
            name: name.into(),
            request: RequestDefaults::default(),
            response: ResponseExpectations::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn request(&self) -> &RequestDefaults {
        &self.request
    }

    #[must_use]
    pub fn response(&self) -> &ResponseExpectations {
        &self.response
    }
}

/// Fluent construction of a [`Specification`].
#[derive(Debug, Clone)]
pub struct SpecificationBuilder {
    name: String,
    request: RequestDefaults,
    response: ResponseExpectations,
}

impl SpecificationBuilder {
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.request.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.request.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.request.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.request.headers, name.into(), value.into());
        self
    }

    #[must_use]
    pub fn expect_status(mut self, status: u16) -> Self {
        self.response = self.response.status(status);
        self
    }

    #[must_use]
    pub fn expect_status_in(mut self, statuses: &[u16]) -> Self {
        self.response = self.response.status_in(statuses);
        self
    }

    #[must_use]
    pub fn expect_header(mut self, name: impl Into<String>, matcher: Matcher) -> Self {
        self.response = self.response.header(name, matcher);
        self
    }

    #[must_use]
    pub fn expect_body(mut self, path: impl Into<JsonPath>, matcher: Matcher) -> Self {
        self.response = self.response.body(path, matcher);
        self
    }

    #[must_use]
    pub fn build(self) -> Specification {
        Specification::new(self.name, self.request, self.response)
    }
}

/// Where a single request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointTarget {
    pub base_url: String,
    pub path: String,
    pub method: Method,
}

impl EndpointTarget {
    /// Base URL and path joined with exactly one `/`.
    #[must_use]
    pub fn url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.path.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{}", self.path.trim_start_matches('/'))
        }
    }
}

/// Explicit per-call parameters, layered over a specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    method: Method,
    explicit: RequestDefaults,
}

impl Call {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            explicit: RequestDefaults::default(),
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get).path(path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post).path(path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put).path(path)
    }

    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::Patch).path(path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete).path(path)
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.explicit.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.explicit.base_url = Some(base_url.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.explicit.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.explicit.headers, name.into(), value.into());
        self
    }

    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Resolve final parameters: explicit over `spec` over `fallback`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Request`] when no layer provides a base URL.
    pub fn resolve(
        &self,
        spec: Option<&Specification>,
        fallback: &RequestDefaults,
    ) -> Result<ResolvedRequest, ContractError> {
        let layered = match spec {
            Some(s) => fallback.overlay(s.request()).overlay(&self.explicit),
            None => fallback.overlay(&self.explicit),
        };

        let base_url = layered.base_url.ok_or_else(|| {
            ContractError::Request(format!(
                "no base URL for {} {}",
                self.method,
                layered.path.as_deref().unwrap_or("")
            ))
        })?;

        Ok(ResolvedRequest {
            target: EndpointTarget {
                base_url,
                path: layered.path.unwrap_or_default(),
                method: self.method,
            },
            content_type: layered.content_type,
            headers: layered.headers,
        })
    }
}

/// Outcome of layering: everything needed except the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRequest {
    pub target: EndpointTarget,
    pub content_type: Option<String>,
    pub headers: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JSON;

    fn registration_spec() -> Specification {
        Specification::builder("registration")
            .base_url("https://reqres.in")
            .path("/api/register")
            .content_type(JSON)
            .expect_status(400)
            .expect_body("error", Matcher::is("Missing password"))
            .build()
    }

    fn fallback() -> RequestDefaults {
        RequestDefaults {
            base_url: Some("http://localhost:8080".into()),
            headers: BTreeMap::from([("x-api-key".to_string(), "from-config".to_string())]),
            ..RequestDefaults::default()
        }
    }

    #[test]
    fn builder_populates_both_sides() {
        let spec = registration_spec();
        assert_eq!(spec.name(), "registration");
        assert_eq!(spec.request().path.as_deref(), Some("/api/register"));
        assert_eq!(spec.response().expected_status(), Some(400));
        assert_eq!(spec.response().body_matchers().len(), 1);
        assert_eq!(spec.response().body_matchers()[0].path.to_string(), "error");
    }

    #[test]
    fn new_equals_builder() {
        let built = registration_spec();
        let direct = Specification::new(
            "registration",
            built.request().clone(),
            built.response().clone(),
        );
        assert_eq!(direct, built);
    }

    #[test]
    fn spec_defaults_apply_when_call_is_silent() {
        let resolved = Call::new(Method::Post)
            .resolve(Some(&registration_spec()), &fallback())
            .unwrap();
        assert_eq!(resolved.target.url(), "https://reqres.in/api/register");
        assert_eq!(resolved.content_type.as_deref(), Some(JSON));
        assert_eq!(resolved.headers["x-api-key"], "from-config");
    }

    #[test]
    fn explicit_values_override_field_by_field() {
        let resolved = Call::post("/api/login")
            .resolve(Some(&registration_spec()), &fallback())
            .unwrap();
        // path overridden, base URL and content type inherited
        assert_eq!(resolved.target.url(), "https://reqres.in/api/login");
        assert_eq!(resolved.content_type.as_deref(), Some(JSON));
    }

    #[test]
    fn fallback_used_without_spec() {
        let resolved = Call::get("/api/unknown").resolve(None, &fallback()).unwrap();
        assert_eq!(resolved.target.url(), "http://localhost:8080/api/unknown");
        assert_eq!(resolved.target.method, Method::Get);
        assert_eq!(resolved.content_type, None);
    }

    #[test]
    fn explicit_header_replaces_case_insensitively() {
        let resolved = Call::get("/api/unknown")
            .header("X-Api-Key", "explicit")
            .resolve(None, &fallback())
            .unwrap();
        assert_eq!(resolved.headers.len(), 1);
        assert_eq!(resolved.headers["X-Api-Key"], "explicit");
    }

    #[test]
    fn header_names_are_unique_within_a_layer() {
        let spec = Specification::builder("keys")
            .header("X-Api-Key", "first")
            .header("x-api-key", "second")
            .build();
        assert_eq!(
            spec.request().headers,
            BTreeMap::from([("x-api-key".to_string(), "second".to_string())])
        );

        let resolved = Call::get("/api/users")
            .header("Accept", "text/plain")
            .header("ACCEPT", "application/json")
            .resolve(None, &RequestDefaults::default().overlay(&fallback()))
            .unwrap();
        assert_eq!(resolved.headers.len(), 2);
        assert_eq!(resolved.headers["ACCEPT"], "application/json");
    }

    #[test]
    fn explicit_content_type_displaces_inherited_header() {
        let spec = Specification::builder("plain")
            .header("Content-Type", "text/plain")
            .build();
        let resolved = Call::new(Method::Post)
            .content_type(JSON)
            .resolve(Some(&spec), &fallback())
            .unwrap();
        assert_eq!(resolved.content_type.as_deref(), Some(JSON));
        assert!(
            !resolved
                .headers
                .keys()
                .any(|k| k.eq_ignore_ascii_case("content-type")),
            "{:?}",
            resolved.headers
        );
    }

    #[test]
    fn missing_base_url_is_request_error() {
        let err = Call::get("/api/unknown")
            .resolve(None, &RequestDefaults::default())
            .unwrap_err();
        assert!(matches!(err, ContractError::Request(_)), "got {err:?}");
    }

    #[test]
    fn url_joins_with_single_slash() {
        let target = |base: &str, path: &str| EndpointTarget {
            base_url: base.into(),
            path: path.into(),
            method: Method::Get,
        };
        assert_eq!(target("https://reqres.in/", "/api").url(), "https://reqres.in/api");
        assert_eq!(target("https://reqres.in", "api").url(), "https://reqres.in/api");
        assert_eq!(target("https://reqres.in", "").url(), "https://reqres.in");
    }

    #[test]
    fn specification_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Specification>();
    }
}
