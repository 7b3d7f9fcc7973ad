//! Runtime-checked HTTP calls driven by an OpenAPI 3.0 JSON document.
//!
//! Loads a specification, indexes its operations, builds request URLs from the declared
//! query parameters, sends the call, and normalizes the result into one
//! [`ResponseEnvelope`] whose payload is checked against the declared response schema.
//!
//! # Usage
//!
//! ```no_run
//! use std::collections::HashMap;
//! use openapi_handler::{ApiClient, ClientConfig, SpecificationRegistry};
//!
//! let config = ClientConfig::new();
//! let registry = SpecificationRegistry::load_from_path("api.json", &config).unwrap();
//! let mut client = ApiClient::new(registry, config);
//! client.select_server("Sample API");
//!
//! let params = HashMap::from([
//!     ("id".to_string(), "my_id".to_string()),
//!     ("name".to_string(), "my_name".to_string()),
//! ]);
//! if let Some(envelope) = client.call("/GetItem", "get", Some(&params), None).unwrap() {
//!     println!("{}", envelope.response.message);
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod response;
pub mod schema;
pub mod spec;
pub mod transport;
pub mod validation;

pub use auth::{Authentication, CredentialHandle, CredentialProvider};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{
    AuthenticationError, DefinitionError, Error, RequestAbortedError, TransportError,
    ValidationError,
};
pub use registry::{read_json, SpecificationRegistry};
pub use request::{extract_parameter, ApiRequest, Extraction};
pub use response::{normalize, ResponseBody, ResponseEnvelope};
pub use schema::translate;
pub use spec::{OperationCatalog, OperationEntry, ParameterDefinition, ParameterLocation, Server};
pub use transport::{HttpMethod, HttpTransport, RawOutcome, Transport};

// Re-export dependencies for downstream crates
pub use reqwest;
pub use serde_json;
