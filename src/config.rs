//! Client configuration.

use serde::{Deserialize, Serialize};

/// Block names copied from each operation into its catalog entry.
pub const DEFAULT_BLOCKS: [&str; 3] = ["parameters", "responses", "requestBody"];

/// Media type used to look up request and response schemas.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Configuration shared by the registry, request builder and response normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[non_exhaustive]
pub struct ClientConfig {
    /// Validate the document against the OpenAPI 3.0 meta-schema on load.
    pub validate_spec: bool,
    /// Emit `debug` events carrying full URLs, payloads and envelopes.
    pub debug_logging: bool,
    /// Operation blocks kept in each [`OperationEntry`](crate::spec::OperationEntry).
    pub blocks: Vec<String>,
    /// Media type whose schema is used for validation.
    pub content_type: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            validate_spec: true,
            debug_logging: false,
            blocks: DEFAULT_BLOCKS.iter().map(|b| (*b).to_string()).collect(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable meta-schema validation of the loaded document.
    pub fn validate_spec(mut self, validate: bool) -> Self {
        self.validate_spec = validate;
        self
    }

    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging = enabled;
        self
    }

    /// Replace the set of operation blocks kept in the catalog.
    pub fn blocks<I, S>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocks = blocks.into_iter().map(Into::into).collect();
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}
