//! apicontract-runner: request execution and the reqres.in scenario suite

pub mod executor;
pub mod observer;
pub mod scenarios;
pub mod suite;
pub mod transport;

pub use executor::ContractClient;
pub use observer::{ExchangeObserver, Recorder, TracingObserver};
pub use scenarios::{REGISTRATION_REQUEST_SPEC, REGISTRATION_RESPONSE_SPEC, Scenario};
pub use suite::{Suite, SuiteRun};
pub use transport::{HttpTransport, Transport};
