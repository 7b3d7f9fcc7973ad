//! Error types for the openapi-handler crate.

use std::path::PathBuf;

use thiserror::Error;

/// The specification is incomplete for the operation being invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("{0}")]
    Generic(String),

    #[error("Request type '{method}' not defined for '{endpoint}'")]
    RequestType { endpoint: String, method: String },

    #[error("Resource '{endpoint}' not defined")]
    Endpoint { endpoint: String },

    #[error("Status code {endpoint}:{method}:{status} is missing.")]
    StatusCode {
        endpoint: String,
        method: String,
        status: String,
    },
}

/// A JSON value failed to match its schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("ValidationError - generic: {0}")]
    Generic(String),

    #[error("ValidationError - body: {0}")]
    Body(String),

    #[error("ValidationError - response: {0}")]
    Response(String),

    #[error("ValidationError - api_definition: {0}")]
    ApiDefinition(String),

    /// The schema itself could not be compiled.
    #[error("SchemaError: {0}")]
    Schema(String),
}

/// Credential configuration is invalid or secret material is unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum AuthenticationError {
    #[error("{method} is not implemented.")]
    NotImplemented { method: String },

    #[error("Parameter keys ({}) are missing.", .0.join(", "))]
    MissingKeys(Vec<String>),

    #[error("Parameter values ({}) are missing.", .0.join(", "))]
    MissingValues(Vec<String>),
}

/// URL construction stopped because a declared query parameter was not supplied.
///
/// The message is the one produced by the parameter rule that fired, e.g.
/// `Required parameter 'id' is missing!` or `Parameter 'name' is ignored!`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RequestAbortedError {
    pub message: String,
}

/// Failures raised by a [`Transport`](crate::transport::Transport).
///
/// These never escape the request pipeline: they are turned into a 504 envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::Connection(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Top-level error for everything the public call path can raise.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    RequestAborted(#[from] RequestAbortedError),

    #[error("failed to read JSON document: {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in document: {}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_error_names_operation() {
        let err = DefinitionError::StatusCode {
            endpoint: "/GetItem".into(),
            method: "get".into(),
            status: "418".into(),
        };
        assert_eq!(err.to_string(), "Status code /GetItem:get:418 is missing.");
    }

    #[test]
    fn authentication_errors_list_names() {
        let err = AuthenticationError::MissingKeys(vec!["username".into(), "password".into()]);
        assert_eq!(
            err.to_string(),
            "Parameter keys (username, password) are missing."
        );

        let err = AuthenticationError::MissingValues(vec!["my_user".into(), "my_pass".into()]);
        assert_eq!(
            err.to_string(),
            "Parameter values (my_user, my_pass) are missing."
        );
    }

    #[test]
    fn request_aborted_displays_message_verbatim() {
        let err = RequestAbortedError {
            message: "Parameter 'name' is ignored!".into(),
        };
        assert_eq!(err.to_string(), "Parameter 'name' is ignored!");

        let wrapped: Error = err.into();
        assert_eq!(wrapped.to_string(), "Parameter 'name' is ignored!");
    }

    #[test]
    fn validation_error_carries_kind() {
        let err = ValidationError::ApiDefinition("'paths' is a required property".into());
        assert!(err.to_string().starts_with("ValidationError - api_definition:"));
    }
}
