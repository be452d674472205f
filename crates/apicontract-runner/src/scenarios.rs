//! The reqres.in contract, as a registry of named scenarios
//!
//! Each scenario is a plain function over a [`ContractClient`]. It sends its
//! requests, validates them and stops at the first error, which becomes the
//! scenario's outcome.

use std::sync::LazyLock;

use apicontract_core::model::{
    JSON, RegistrationBody, RegistrationResponse, ResourceList, UpdateBody, UpdateResponse,
};
use apicontract_core::{
    Call, ContractError, Matcher, Method, RawPayload, ResponseExpectations, Specification,
    expect_eq, expect_that,
};

use crate::executor::ContractClient;

const REGISTER_PATH: &str = "/api/register";
const USER_PATH: &str = "/api/users/2";
const RESOURCES_PATH: &str = "/api/unknown";
const MISSING_RESOURCE_PATH: &str = "/api/unknown/23";
/// The documented contract answers 200; the live service answers 404.
const MISSING_RESOURCE_STATUSES: &[u16] = &[200, 404];

const EMAIL: &str = "eve.holt@reqres.in";
const PASSWORD: &str = "pistol";
const TOKEN: &str = "QpwL5tke4Pnpja7X4";
const MISSING_PASSWORD: &str = "Missing password";

/// Request side of the registration contract
pub static REGISTRATION_REQUEST_SPEC: LazyLock<Specification> = LazyLock::new(|| {
    Specification::builder("registration request")
        .path(REGISTER_PATH)
        .content_type(JSON)
        .build()
});

/// Registration without a password is rejected
pub static REGISTRATION_RESPONSE_SPEC: LazyLock<Specification> = LazyLock::new(|| {
    Specification::builder("registration response")
        .expect_status(400)
        .expect_body("error", Matcher::is(MISSING_PASSWORD))
        .build()
});

/// A named, runnable contract check
#[derive(Clone, Copy)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub run: fn(&ContractClient) -> Result<(), ContractError>,
}

impl std::fmt::Debug for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

impl Scenario {
    /// # Errors
    ///
    /// The first error the scenario hit.
    pub fn run(&self, client: &ContractClient) -> Result<(), ContractError> {
        (self.run)(client)
    }
}

/// All scenarios, in declaration order
#[must_use]
pub fn all() -> &'static [Scenario] {
    SCENARIOS
}

/// Look up a scenario by exact name
#[must_use]
pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

static SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "successful_registration_plain",
        description: "raw JSON registration returns the fixed token",
        run: successful_registration_plain,
    },
    Scenario {
        name: "successful_registration_typed",
        description: "typed registration body, token read from the typed response",
        run: successful_registration_typed,
    },
    Scenario {
        name: "successful_update_plain",
        description: "raw JSON PATCH echoes name and job",
        run: successful_update_plain,
    },
    Scenario {
        name: "successful_update_typed",
        description: "typed PATCH echoes fields and stamps updatedAt near now",
        run: successful_update_typed,
    },
    Scenario {
        name: "list_resources",
        description: "resource list starts with id 1",
        run: list_resources,
    },
    Scenario {
        name: "missing_resource",
        description: "unknown resource id has an empty body",
        run: missing_resource,
    },
    Scenario {
        name: "negative_registration_plain",
        description: "registration without password is rejected",
        run: negative_registration_plain,
    },
    Scenario {
        name: "negative_registration_with_specs",
        description: "rejected registration via shared request/response specs",
        run: negative_registration_with_specs,
    },
];

fn successful_registration_plain(client: &ContractClient) -> Result<(), ContractError> {
    let body = RawPayload::new(format!(
        r#"{{ "email": "{EMAIL}", "password": "{PASSWORD}" }}"#
    ));
    let call = Call::post(REGISTER_PATH).content_type(JSON);
    let response = client.send(&call, Some(&body), None)?;

    client.verify(
        &response,
        &ResponseExpectations::new()
            .status(200)
            .body("token", Matcher::is(TOKEN)),
    )
}

fn successful_registration_typed(client: &ContractClient) -> Result<(), ContractError> {
    let body = RegistrationBody {
        email: Some(EMAIL.to_string()),
        password: Some(PASSWORD.to_string()),
    };
    let response = client.send(&Call::post(REGISTER_PATH), Some(&body), None)?;
    client.verify(&response, &ResponseExpectations::new().status(200))?;

    let registration: RegistrationResponse = response.extract_as()?;
    expect_eq("token", &Some(TOKEN.to_string()), &registration.token)
}

fn successful_update_plain(client: &ContractClient) -> Result<(), ContractError> {
    let body = RawPayload::new(r#"{ "name": "neo", "job": "hacker" }"#);
    let call = Call::patch(USER_PATH).content_type(JSON);
    let response = client.send(&call, Some(&body), None)?;

    client.verify(
        &response,
        &ResponseExpectations::new()
            .status(200)
            .body("name", Matcher::is("neo"))
            .body("job", Matcher::is("hacker")),
    )
}

fn successful_update_typed(client: &ContractClient) -> Result<(), ContractError> {
    let body = UpdateBody {
        name: Some("neo".to_string()),
        job: Some("hacker".to_string()),
    };
    let response = client.send(&Call::patch(USER_PATH), Some(&body), None)?;
    client.verify(&response, &ResponseExpectations::new().status(200))?;

    let update: UpdateResponse = response.extract_as()?;
    expect_eq("name", &Some("neo".to_string()), &update.name)?;
    expect_eq("job", &Some("hacker".to_string()), &update.job)?;

    let updated_at = update.updated_at.map(serde_json::Value::String);
    expect_that(
        "updatedAt",
        &Matcher::Rfc3339Within(client.timestamp_tolerance()),
        updated_at.as_ref(),
    )
}

fn list_resources(client: &ContractClient) -> Result<(), ContractError> {
    let response = client.send(&Call::get(RESOURCES_PATH), None, None)?;
    client.verify(
        &response,
        &ResponseExpectations::new()
            .status(200)
            .body("data[0].id", Matcher::is(1)),
    )?;

    // Typed view must agree with the path lookup
    let list: ResourceList = response.extract_as()?;
    expect_eq("data[0].id", &Some(1_u64), &list.data.first().and_then(|r| r.id))
}

fn missing_resource(client: &ContractClient) -> Result<(), ContractError> {
    let response = client.send(&Call::get(MISSING_RESOURCE_PATH), None, None)?;
    client.verify(
        &response,
        &ResponseExpectations::new()
            .status_in(MISSING_RESOURCE_STATUSES)
            .body("$", Matcher::IsEmpty),
    )
}

fn negative_registration_plain(client: &ContractClient) -> Result<(), ContractError> {
    let body = RawPayload::new(format!(r#"{{ "email": "{EMAIL}" }}"#));
    let call = Call::post(REGISTER_PATH).content_type(JSON);
    let response = client.send(&call, Some(&body), None)?;

    client.verify(
        &response,
        &ResponseExpectations::new()
            .status(400)
            .body("error", Matcher::is(MISSING_PASSWORD)),
    )
}

fn negative_registration_with_specs(client: &ContractClient) -> Result<(), ContractError> {
    let body = RegistrationBody {
        email: Some("neo".to_string()),
        password: None,
    };
    let response = client.send(
        &Call::new(Method::Post),
        Some(&body),
        Some(&*REGISTRATION_REQUEST_SPEC),
    )?;
    client.verify_spec(&response, &REGISTRATION_RESPONSE_SPEC)?;

    let registration: RegistrationResponse = response.extract_as()?;
    expect_eq(
        "error",
        &Some(MISSING_PASSWORD.to_string()),
        &registration.error,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique() {
        let names: HashSet<_> = all().iter().map(|s| s.name).collect();
        assert_eq!(names.len(), all().len());
        assert_eq!(all().len(), 8);
    }

    #[test]
    fn find_by_name() {
        assert!(find("list_resources").is_some());
        assert!(find("list").is_none());
    }

    #[test]
    fn registration_specs_are_shared_statics() {
        assert_eq!(REGISTRATION_REQUEST_SPEC.request().path.as_deref(), Some(REGISTER_PATH));
        assert_eq!(REGISTRATION_REQUEST_SPEC.request().content_type.as_deref(), Some(JSON));
        assert_eq!(REGISTRATION_RESPONSE_SPEC.response().expected_status(), Some(400));
        assert_eq!(REGISTRATION_RESPONSE_SPEC.response().body_matchers().len(), 1);
    }
}
