//! Captured responses and their validation

use std::collections::BTreeMap;
use std::fmt::Debug;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::{AssertionFailure, ContractError, Mismatch};
use crate::matcher::{Matcher, describe};
use crate::model::{self, FieldPolicy, Model};
use crate::spec::{ResponseExpectations, Specification};

/// Status, headers and body of one response. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(from = "RawResponse")]
pub struct ResponseHandle {
    status: u16,
    /// Header names are stored lower-cased
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: String,
}

/// Wire shape; header names are normalised on the way in.
#[derive(Deserialize, JsonSchema)]
struct RawResponse {
    status: u16,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    body: String,
}

impl From<RawResponse> for ResponseHandle {
    fn from(raw: RawResponse) -> Self {
        Self::new(raw.status, raw.headers, raw.body)
    }
}

impl ResponseHandle {
    #[must_use]
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
            body: body.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Parse the body; an empty body reads as `null`.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Parse`] if the body is not valid JSON.
    pub fn json(&self) -> Result<Value, ContractError> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }
        model::parse_json(&self.body)
    }

    /// Deserialize the body into a model, ignoring undeclared keys.
    ///
    /// # Errors
    ///
    /// [`ContractError::Parse`] for malformed JSON, [`ContractError::Deserialization`]
    /// for a type mismatch on a declared field.
    pub fn extract_as<M: Model>(&self) -> Result<M, ContractError> {
        model::from_json_with(&self.body, FieldPolicy::Lenient)
    }

    /// Deserialize with an explicit field policy.
    ///
    /// # Errors
    ///
    /// See [`ResponseHandle::extract_as`].
    pub fn extract_with<M: Model>(&self, policy: FieldPolicy) -> Result<M, ContractError> {
        model::from_json_with(&self.body, policy)
    }

    /// Check ad-hoc expectations.
    ///
    /// # Errors
    ///
    /// See [`ResponseHandle::assert_scoped`].
    pub fn assert_against(&self, expectations: &ResponseExpectations) -> Result<(), ContractError> {
        self.assert_scoped("response", expectations, OffsetDateTime::now_utc())
    }

    /// Check a specification's response side.
    ///
    /// # Errors
    ///
    /// See [`ResponseHandle::assert_scoped`].
    pub fn satisfies(&self, spec: &Specification) -> Result<(), ContractError> {
        self.assert_scoped(spec.name(), spec.response(), OffsetDateTime::now_utc())
    }

    /// Evaluate every check, then report all mismatches at once.
    ///
    /// The body is only parsed when body matchers exist.
    ///
    /// # Errors
    ///
    /// [`ContractError::Parse`] if body matchers exist and the body is not JSON;
    /// [`ContractError::Assertion`] listing every mismatch otherwise.
    pub fn assert_scoped(
        &self,
        scope: &str,
        expectations: &ResponseExpectations,
        now: OffsetDateTime,
    ) -> Result<(), ContractError> {
        let mut mismatches = Vec::new();

        let accepted = expectations.expected_statuses();
        if !accepted.is_empty() && !accepted.contains(&self.status) {
            let expected = match accepted {
                [single] => single.to_string(),
                many => format!(
                    "one of {}",
                    many.iter().map(u16::to_string).collect::<Vec<_>>().join(", ")
                ),
            };
            mismatches.push(Mismatch::new("status", expected, self.status.to_string()));
        }

        for (name, matcher) in expectations.header_matchers() {
            let observed = self.header(name).map(|v| Value::String(v.to_string()));
            if !matcher.matches_at(observed.as_ref(), now) {
                mismatches.push(Mismatch::new(
                    format!("header:{}", name.to_ascii_lowercase()),
                    matcher.to_string(),
                    describe(observed.as_ref()),
                ));
            }
        }

        if !expectations.body_matchers().is_empty() {
            let document = self.json()?;
            for check in expectations.body_matchers() {
                let observed = check.path.resolve(&document);
                if !check.matcher.matches_at(observed, now) {
                    mismatches.push(Mismatch::new(
                        check.path.to_string(),
                        check.matcher.to_string(),
                        describe(observed),
                    ));
                }
            }
        }

        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(AssertionFailure::new(scope, mismatches).into())
        }
    }
}

/// Assert on a value extracted from a typed model.
///
/// # Errors
///
/// Returns [`ContractError::Assertion`] naming `path` when the values differ.
pub fn expect_eq<T: PartialEq + Debug>(path: &str, expected: &T, actual: &T) -> Result<(), ContractError> {
    if expected == actual {
        Ok(())
    } else {
        Err(AssertionFailure::single(
            "model",
            path,
            format!("{expected:?}"),
            format!("{actual:?}"),
        )
        .into())
    }
}

/// Assert a matcher against an extracted value.
///
/// # Errors
///
/// Returns [`ContractError::Assertion`] naming `path` when the matcher fails.
pub fn expect_that(path: &str, matcher: &Matcher, actual: Option<&Value>) -> Result<(), ContractError> {
    if matcher.matches(actual) {
        Ok(())
    } else {
        Err(AssertionFailure::single("model", path, matcher.to_string(), describe(actual)).into())
    }
}
