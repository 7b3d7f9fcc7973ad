//! Raw transport outcome → uniform response envelope.
//!
//! The envelope carries a synthetic `StatusCode` (200/204/504) next to the literal HTTP
//! status. Validation of the payload against the operation's declared response schema is
//! advisory: a mismatch is reported in `Message`, never as an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::schema::{inject_components, translate};
use crate::spec::OperationEntry;
use crate::transport::RawOutcome;
use crate::validation::{validate, validate_envelope, ValidationKind};

pub const STATUS_OK: u16 = 200;
pub const STATUS_NO_CONTENT: u16 = 204;
pub const STATUS_GATEWAY_TIMEOUT: u16 = 504;

/// Appended to `Message` when the payload does not match the declared schema.
pub const SCHEMA_MISMATCH_WARNING: &str = "Response doesn't correspond to predefined schema!";

/// The single output contract of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub url: String,
    /// Literal HTTP status (500 for the transport failure stand-in).
    pub status_code: u16,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseBody {
    /// Synthetic status, see [`STATUS_OK`], [`STATUS_NO_CONTENT`], [`STATUS_GATEWAY_TIMEOUT`].
    pub status_code: u16,
    pub message: String,
    pub payload: Value,
}

impl ResponseEnvelope {
    /// Build the envelope from the decision table, without schema validation.
    pub fn new(url: &str, outcome: &RawOutcome, transport_error: Option<&TransportError>) -> Self {
        let (status_code, message) = match (transport_error, &outcome.body) {
            (Some(err), _) => (STATUS_GATEWAY_TIMEOUT, format!("Gateway timeout: {err}")),
            (None, Value::String(s)) if s.is_empty() => {
                (STATUS_NO_CONTENT, "No content: empty response".to_string())
            }
            (None, Value::Array(_)) => (STATUS_OK, "OK: list".to_string()),
            (None, Value::Object(_)) => (STATUS_OK, "OK: dict".to_string()),
            (None, _) => (STATUS_OK, "OK".to_string()),
        };

        Self {
            url: url.to_string(),
            status_code: outcome.status_code,
            response: ResponseBody {
                status_code,
                message,
                payload: outcome.body.clone(),
            },
        }
    }

    pub fn is_gateway_timeout(&self) -> bool {
        self.response.status_code == STATUS_GATEWAY_TIMEOUT
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Build the envelope for `outcome` and check its payload against the declared schema.
pub fn normalize(
    url: &str,
    outcome: &RawOutcome,
    transport_error: Option<&TransportError>,
    entry: Option<&OperationEntry>,
    components: Option<&Value>,
    config: &ClientConfig,
) -> ResponseEnvelope {
    let mut envelope = ResponseEnvelope::new(url, outcome, transport_error);

    // An empty body carries nothing to check against the declared schema.
    if transport_error.is_none() && envelope.response.status_code != STATUS_NO_CONTENT {
        check_payload(&mut envelope, entry, components, config);
    }

    let value = envelope.to_value();
    if let Err(err) = validate_envelope(&value) {
        warn!(%err, "response envelope is not valid against its schema");
    }
    if config.debug_logging {
        debug!(envelope = %value, "normalized response");
    }

    envelope
}

fn check_payload(
    envelope: &mut ResponseEnvelope,
    entry: Option<&OperationEntry>,
    components: Option<&Value>,
    config: &ClientConfig,
) {
    let status = envelope.status_code.to_string();
    let Some(schema) = entry.and_then(|e| e.response_schema(&status, &config.content_type)) else {
        debug!(
            url = %envelope.url,
            status_code = envelope.status_code,
            "no response schema declared for status code and content type"
        );
        return;
    };

    let schema = inject_components(translate(schema), components);
    if let Err(err) = validate(&envelope.response.payload, &schema, ValidationKind::Response) {
        warn!(url = %envelope.url, %err, "{SCHEMA_MISMATCH_WARNING}");
        envelope.response.message = format!(
            "{}; {SCHEMA_MISMATCH_WARNING}",
            envelope.response.message
        );
    }
}
