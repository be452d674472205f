//! Request/response payloads: raw strings and typed models
//!
//! Both representations implement [`RequestBody`], so the executor never has
//! to know which one a scenario picked. Typed models are decoded with
//! [`FieldPolicy::Lenient`] by default: undeclared JSON keys are dropped, since
//! the remote service may add fields at any time.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ContractError;

/// Media type sent with typed models.
pub const JSON: &str = "application/json";

/// A schema-bound payload with a fixed set of declared JSON keys.
pub trait Model: Serialize + DeserializeOwned {
    /// Shape name used in error messages
    const NAME: &'static str;
    /// Declared JSON keys (after any serde renames)
    const FIELDS: &'static [&'static str];
}

/// How undeclared JSON keys are treated during decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Ignore undeclared keys
    #[default]
    Lenient,
    /// Reject the first undeclared key
    Strict,
}

/// Anything that can become a request body.
pub trait RequestBody {
    /// Wire representation of the body.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Parse`] if the payload cannot be rendered.
    fn to_body(&self) -> Result<String, ContractError>;

    /// Content type implied by the representation, if any.
    fn content_type(&self) -> Option<&'static str> {
        None
    }
}

/// Untyped payload sent verbatim, no field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPayload(String);

impl RawPayload {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RawPayload {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for RawPayload {
    fn from(body: String) -> Self {
        Self(body)
    }
}

impl RequestBody for RawPayload {
    fn to_body(&self) -> Result<String, ContractError> {
        Ok(self.0.clone())
    }
}

impl<M: Model> RequestBody for M {
    fn to_body(&self) -> Result<String, ContractError> {
        to_json(self)
    }

    fn content_type(&self) -> Option<&'static str> {
        Some(JSON)
    }
}

/// Serialize a model. Unset optional fields are omitted.
///
/// # Errors
///
/// Returns [`ContractError::Parse`] if serialization fails.
pub fn to_json<M: Model>(model: &M) -> Result<String, ContractError> {
    serde_json::to_string(model).map_err(|e| ContractError::Parse(e.to_string()))
}

/// Parse text into a JSON document.
///
/// # Errors
///
/// Returns [`ContractError::Parse`] on malformed JSON.
pub fn parse_json(text: &str) -> Result<Value, ContractError> {
    serde_json::from_str(text).map_err(|e| ContractError::Parse(e.to_string()))
}

/// Decode a model with the lenient field policy.
///
/// # Errors
///
/// [`ContractError::Parse`] for malformed JSON, [`ContractError::Deserialization`]
/// when a declared field has an incompatible type.
pub fn from_json<M: Model>(text: &str) -> Result<M, ContractError> {
    from_json_with(text, FieldPolicy::Lenient)
}

/// Decode a model with an explicit field policy.
///
/// # Errors
///
/// See [`from_json`]. Under [`FieldPolicy::Strict`] an undeclared key is also a
/// [`ContractError::Deserialization`].
pub fn from_json_with<M: Model>(text: &str, policy: FieldPolicy) -> Result<M, ContractError> {
    let value = parse_json(text)?;
    from_value_with(&value, policy)
}

/// Decode a model from an already parsed document.
///
/// # Errors
///
/// See [`from_json_with`].
pub fn from_value_with<M: Model>(value: &Value, policy: FieldPolicy) -> Result<M, ContractError> {
    if policy == FieldPolicy::Strict {
        if let Some(key) = value
            .as_object()
            .and_then(|obj| obj.keys().find(|k| !M::FIELDS.contains(&k.as_str())))
        {
            return Err(ContractError::Deserialization {
                field: key.clone(),
                message: format!("unknown field for {}", M::NAME),
            });
        }
    }

    M::deserialize(value).map_err(|e| ContractError::Deserialization {
        field: offending_field::<M>(value),
        message: e.to_string(),
    })
}

/// Locate the declared field whose value alone fails to decode.
///
/// Every declared field is optional, so a single-key object only fails when
/// that key carries the wrong type.
fn offending_field<M: Model>(value: &Value) -> String {
    let Some(obj) = value.as_object() else {
        return "$".to_string();
    };
    M::FIELDS
        .iter()
        .find(|field| {
            obj.get(**field).is_some_and(|v| {
                let probe = Value::Object(Map::from_iter([(field.to_string(), v.clone())]));
                M::deserialize(&probe).is_err()
            })
        })
        .map_or_else(|| "$".to_string(), |f| f.to_string())
}

// ── Declared models ──

/// `POST /api/register` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Model for RegistrationBody {
    const NAME: &'static str = "RegistrationBody";
    const FIELDS: &'static [&'static str] = &["email", "password"];
}

/// `POST /api/register` response, success or failure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Model for RegistrationResponse {
    const NAME: &'static str = "RegistrationResponse";
    const FIELDS: &'static [&'static str] = &["token", "error"];
}

/// `PATCH /api/users/{id}` request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
}

impl Model for UpdateBody {
    const NAME: &'static str = "UpdateBody";
    const FIELDS: &'static [&'static str] = &["name", "job"];
}

/// `PATCH /api/users/{id}` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(
        rename = "updatedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<String>,
}

impl Model for UpdateResponse {
    const NAME: &'static str = "UpdateResponse";
    const FIELDS: &'static [&'static str] = &["name", "job", "updatedAt"];
}

/// One entry of `GET /api/unknown`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pantone_value: Option<String>,
}

impl Model for Resource {
    const NAME: &'static str = "Resource";
    const FIELDS: &'static [&'static str] = &["id", "name", "year", "color", "pantone_value"];
}

/// `GET /api/unknown` page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<Resource>,
}

impl Model for ResourceList {
    const NAME: &'static str = "ResourceList";
    const FIELDS: &'static [&'static str] = &["page", "per_page", "total", "total_pages", "data"];
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registration(email: &str, password: Option<&str>) -> RegistrationBody {
        RegistrationBody {
            email: Some(email.to_string()),
            password: password.map(str::to_string),
        }
    }

    #[test]
    fn typed_body_serializes_declared_fields_only() {
        let body = registration("eve.holt@reqres.in", Some("pistol"));
        let value: Value = serde_json::from_str(&to_json(&body).unwrap()).unwrap();
        insta::assert_json_snapshot!(value, @r#"
        {
          "email": "eve.holt@reqres.in",
          "password": "pistol"
        }
        "#);
    }

    #[test]
    fn unset_fields_are_omitted() {
        let body = registration("neo", None);
        assert_eq!(to_json(&body).unwrap(), r#"{"email":"neo"}"#);
    }

    #[test]
    fn raw_and_typed_bodies_are_identical_on_the_wire() {
        let raw = RawPayload::from(r#"{ "name": "neo", "job": "hacker" }"#);
        let typed = UpdateBody {
            name: Some("neo".into()),
            job: Some("hacker".into()),
        };
        let raw_value: Value = serde_json::from_str(&raw.to_body().unwrap()).unwrap();
        let typed_value: Value = serde_json::from_str(&typed.to_body().unwrap()).unwrap();
        assert_eq!(raw_value, typed_value);
        assert_eq!(raw.content_type(), None);
        assert_eq!(typed.content_type(), Some(JSON));
    }

    #[test]
    fn raw_payload_is_sent_verbatim() {
        let raw = RawPayload::new("{ \"email\": \"eve.holt@reqres.in\" }");
        assert_eq!(raw.to_body().unwrap(), raw.as_str());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let parsed: RegistrationResponse =
            from_json(r#"{"id": 4, "token": "QpwL5tke4Pnpja7X4"}"#).unwrap();
        assert_eq!(parsed.token.as_deref(), Some("QpwL5tke4Pnpja7X4"));
        assert_eq!(parsed.error, None);
    }

    #[test]
    fn renamed_field_is_decoded() {
        let parsed: UpdateResponse = from_json(
            r#"{"name":"neo","job":"hacker","updatedAt":"2026-10-16T08:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(parsed.updated_at.as_deref(), Some("2026-10-16T08:00:00.000Z"));
    }

    #[test]
    fn absent_fields_stay_unset() {
        let parsed: UpdateResponse = from_json("{}").unwrap();
        assert_eq!(parsed, UpdateResponse::default());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = from_json::<RegistrationResponse>(r#"{"token": "#).unwrap_err();
        assert!(matches!(err, ContractError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn type_mismatch_names_field() {
        let err = from_json::<RegistrationResponse>(r#"{"token": 42, "error": null}"#).unwrap_err();
        match err {
            ContractError::Deserialization { field, .. } => assert_eq!(field, "token"),
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    #[test]
    fn nested_type_mismatch_names_outer_field() {
        let err = from_json::<ResourceList>(r#"{"page": 1, "data": [{"id": "one"}]}"#).unwrap_err();
        match err {
            ContractError::Deserialization { field, .. } => assert_eq!(field, "data"),
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    #[test]
    fn non_object_document_is_root_mismatch() {
        let err = from_json::<RegistrationResponse>("[1, 2]").unwrap_err();
        match err {
            ContractError::Deserialization { field, .. } => assert_eq!(field, "$"),
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    #[test]
    fn strict_policy_rejects_unknown_key() {
        let err = from_json_with::<RegistrationResponse>(
            r#"{"id": 4, "token": "abc"}"#,
            FieldPolicy::Strict,
        )
        .unwrap_err();
        match err {
            ContractError::Deserialization { field, message } => {
                assert_eq!(field, "id");
                assert!(message.contains("RegistrationResponse"));
            }
            other => panic!("expected Deserialization, got {other:?}"),
        }
    }

    #[test]
    fn strict_policy_accepts_declared_keys() {
        let parsed: RegistrationResponse =
            from_json_with(r#"{"error": "Missing password"}"#, FieldPolicy::Strict).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("Missing password"));
    }

    fn opt_string() -> impl Strategy<Value = Option<String>> {
        proptest::option::of(".{0,24}")
    }

    proptest! {
        #[test]
        fn registration_body_round_trips(email in opt_string(), password in opt_string()) {
            let model = RegistrationBody { email, password };
            let decoded: RegistrationBody = from_json(&to_json(&model).unwrap()).unwrap();
            prop_assert_eq!(decoded, model);
        }

        #[test]
        fn registration_response_round_trips(token in opt_string(), error in opt_string()) {
            let model = RegistrationResponse { token, error };
            let decoded: RegistrationResponse = from_json(&to_json(&model).unwrap()).unwrap();
            prop_assert_eq!(decoded, model);
        }

        #[test]
        fn update_body_round_trips(name in opt_string(), job in opt_string()) {
            let model = UpdateBody { name, job };
            let decoded: UpdateBody = from_json(&to_json(&model).unwrap()).unwrap();
            prop_assert_eq!(decoded, model);
        }

        #[test]
        fn resource_round_trips(
            id in proptest::option::of(any::<u64>()),
            name in opt_string(),
            year in proptest::option::of(1900u32..2100),
            color in opt_string(),
            pantone_value in opt_string(),
        ) {
            let model = Resource { id, name, year, color, pantone_value };
            let decoded: Resource = from_json(&to_json(&model).unwrap()).unwrap();
            prop_assert_eq!(decoded, model);
        }

        #[test]
        fn update_response_round_trips(
            name in opt_string(),
            job in opt_string(),
            updated_at in opt_string(),
        ) {
            let model = UpdateResponse { name, job, updated_at };
            let decoded: UpdateResponse = from_json(&to_json(&model).unwrap()).unwrap();
            prop_assert_eq!(decoded, model);
        }

        #[test]
        fn resource_list_round_trips(
            page in proptest::option::of(0u32..100),
            ids in proptest::collection::vec(0u64..10_000, 0..5),
        ) {
            let model = ResourceList {
                page,
                data: ids.into_iter().map(|id| Resource { id: Some(id), ..Resource::default() }).collect(),
                ..ResourceList::default()
            };
            let decoded: ResourceList = from_json(&to_json(&model).unwrap()).unwrap();
            prop_assert_eq!(decoded, model);
        }

        #[test]
        fn extra_keys_never_fail_lenient_decoding(
            extra in proptest::collection::btree_map("[a-z]{1,8}", any::<i64>(), 0..6),
            token in opt_string(),
        ) {
            let mut obj = Map::new();
            for (k, v) in extra {
                if !RegistrationResponse::FIELDS.contains(&k.as_str()) {
                    obj.insert(k, Value::from(v));
                }
            }
            if let Some(t) = &token {
                obj.insert("token".into(), Value::String(t.clone()));
            }
            let text = Value::Object(obj).to_string();
            let decoded: RegistrationResponse = from_json(&text).unwrap();
            prop_assert_eq!(decoded.token, token);
        }
    }
}
