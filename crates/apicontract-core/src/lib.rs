//! apicontract-core: Core types for declarative HTTP contract tests
//!
//! This crate provides the typed payload models, reusable request/response
//! specifications, the response validator and the verdict logic that turns
//! scenario outcomes into a pass/fail result. It performs no I/O besides
//! reading config files and writing dumps.

pub mod config;
pub mod dump;
pub mod error;
pub mod exchange;
pub mod generator;
pub mod matcher;
pub mod model;
pub mod path;
pub mod response;
pub mod spec;
pub mod verdict;

pub use config::{Config, ConfigError};
pub use dump::{DumpError, DumpIndex};
pub use error::{AssertionFailure, ContractError, Mismatch};
pub use exchange::{Exchange, HttpRequest, Method};
pub use generator::to_http_file;
pub use matcher::Matcher;
pub use model::{FieldPolicy, Model, RawPayload, RequestBody};
pub use path::JsonPath;
pub use response::{ResponseHandle, expect_eq, expect_that};
pub use spec::{
    Call, EndpointTarget, RequestDefaults, ResolvedRequest, ResponseExpectations, Specification,
    SpecificationBuilder,
};
pub use verdict::{
    FailureKind, Outcome, ScenarioReport, SuiteReport, Verdict, VerdictStatus, generate_schema,
};
