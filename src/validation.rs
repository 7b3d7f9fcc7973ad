//! Draft-04 JSON Schema validation and the schemas embedded in the crate.

use std::fmt;
use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::ValidationError;

const OPENAPI_META_SCHEMA: &str = include_str!("../schemas/openapi-3.0.json");
const ENVELOPE_SCHEMA: &str = include_str!("../schemas/envelope.json");

/// What is being validated; selects the [`ValidationError`] variant on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationKind {
    Generic,
    Body,
    Response,
    ApiDefinition,
}

impl ValidationKind {
    fn error(self, message: String) -> ValidationError {
        match self {
            Self::Generic => ValidationError::Generic(message),
            Self::Body => ValidationError::Body(message),
            Self::Response => ValidationError::Response(message),
            Self::ApiDefinition => ValidationError::ApiDefinition(message),
        }
    }
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generic => "generic",
            Self::Body => "body",
            Self::Response => "response",
            Self::ApiDefinition => "api_definition",
        };
        f.write_str(name)
    }
}

/// Compile a draft-04 schema.
pub fn compile(schema: &Value) -> Result<Validator, ValidationError> {
    jsonschema::draft4::new(schema).map_err(|e| ValidationError::Schema(e.to_string()))
}

/// Validate `instance` against an already compiled schema.
///
/// All violations are reported in one message, separated by `; `.
pub fn check(
    validator: &Validator,
    instance: &Value,
    kind: ValidationKind,
) -> Result<(), ValidationError> {
    let messages: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();
    if messages.is_empty() {
        Ok(())
    } else {
        Err(kind.error(messages.join("; ")))
    }
}

/// Validate `instance` against a draft-04 `schema`.
pub fn validate(
    instance: &Value,
    schema: &Value,
    kind: ValidationKind,
) -> Result<(), ValidationError> {
    let validator = compile(schema)?;
    check(&validator, instance, kind)
}

fn embedded(source: &str) -> Result<Validator, ValidationError> {
    let schema: Value =
        serde_json::from_str(source).map_err(|e| ValidationError::Schema(e.to_string()))?;
    compile(&schema)
}

/// Validate a whole document against the bundled OpenAPI 3.0 meta-schema.
pub fn validate_openapi_document(document: &Value) -> Result<(), ValidationError> {
    static META: OnceLock<Result<Validator, ValidationError>> = OnceLock::new();
    let validator = META
        .get_or_init(|| embedded(OPENAPI_META_SCHEMA))
        .as_ref()
        .map_err(Clone::clone)?;
    check(validator, document, ValidationKind::ApiDefinition)
}

/// Validate a serialized envelope against the fixed output schema.
pub fn validate_envelope(envelope: &Value) -> Result<(), ValidationError> {
    static ENVELOPE: OnceLock<Result<Validator, ValidationError>> = OnceLock::new();
    let validator = ENVELOPE
        .get_or_init(|| embedded(ENVELOPE_SCHEMA))
        .as_ref()
        .map_err(Clone::clone)?;
    check(validator, envelope, ValidationKind::Generic)
}
