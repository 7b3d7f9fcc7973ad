//! Local `$ref` resolution for operation-level objects.
//!
//! Parameter, request body, response and path item objects may be declared as
//! `{"$ref": "#/components/..."}`. They are replaced by their targets before the operation
//! catalog is built. References inside schemas are left alone: the validator resolves those
//! against the injected `components.schemas`.
//!
//! Only references into the same document (`#/...` JSON pointers) are supported.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::ValidationError;
use crate::spec::HTTP_METHODS;

fn reference(value: &Value) -> Option<&str> {
    value.get("$ref")?.as_str()
}

/// Follow `$ref` chains from `value` until a non-reference object is reached.
///
/// A value that is not a reference is returned unchanged.
pub fn resolve_ref<'a>(
    document: &'a Value,
    value: &'a Value,
) -> Result<&'a Value, ValidationError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut current = value;

    while let Some(reference) = reference(current) {
        if !seen.insert(reference) {
            return Err(ValidationError::ApiDefinition(format!(
                "Cyclic $ref detected while resolving: {reference}"
            )));
        }

        let pointer = reference.strip_prefix('#').ok_or_else(|| {
            ValidationError::ApiDefinition(format!(
                "Unsupported $ref '{reference}' (only local references are resolved)"
            ))
        })?;
        if !pointer.is_empty() && !pointer.starts_with('/') {
            return Err(ValidationError::ApiDefinition(format!(
                "Unsupported $ref fragment '{reference}' (expected a JSON pointer)"
            )));
        }

        current = document.pointer(pointer).ok_or_else(|| {
            ValidationError::ApiDefinition(format!("Unresolved $ref '{reference}'"))
        })?;
    }

    Ok(current)
}

/// Copy of `path_item` with every operation-level `$ref` replaced by its target.
pub fn dereference_path_item(
    document: &Value,
    path_item: &Value,
) -> Result<Value, ValidationError> {
    let mut item = resolve_ref(document, path_item)?.clone();

    if let Some(params) = item.get_mut("parameters") {
        dereference_parameters(document, params)?;
    }

    for method in HTTP_METHODS {
        let Some(operation) = item.get_mut(method) else {
            continue;
        };
        if let Some(params) = operation.get_mut("parameters") {
            dereference_parameters(document, params)?;
        }
        if let Some(body) = operation.get_mut("requestBody") {
            *body = resolve_ref(document, body)?.clone();
        }
        if let Some(Value::Object(responses)) = operation.get_mut("responses") {
            for response in responses.values_mut() {
                *response = resolve_ref(document, response)?.clone();
            }
        }
    }

    Ok(item)
}

fn dereference_parameters(document: &Value, params: &mut Value) -> Result<(), ValidationError> {
    if let Value::Array(params) = params {
        for param in params.iter_mut() {
            *param = resolve_ref(document, param)?.clone();
        }
    }
    Ok(())
}
