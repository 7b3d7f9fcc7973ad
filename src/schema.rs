//! OpenAPI schema dialect → JSON Schema draft-04.
//!
//! OpenAPI 3.0 schemas are close to draft-04 but add `nullable`, which a draft-04 validator
//! does not understand. The translation rewrites `{"type": T, "nullable": true}` into
//! `{"type": [T, "null"]}` at every depth and drops every `nullable` keyword.
//!
//! The input is never modified; a new tree is returned.

use serde_json::{Map, Value};

/// `$schema` marker placed on translated root documents.
pub const DRAFT_04: &str = "http://json-schema.org/draft-04/schema#";

/// Translate a schema fragment into a standalone draft-04 document.
pub fn translate(fragment: &Value) -> Value {
    let mut out = translate_fragment(fragment);
    if let Value::Object(root) = &mut out {
        root.insert("$schema".to_string(), Value::String(DRAFT_04.to_string()));
    }
    out
}

/// Translate a schema fragment without marking it as a root document.
///
/// Used for schemas embedded in another document, such as `components.schemas`.
pub fn translate_fragment(fragment: &Value) -> Value {
    match fragment {
        Value::Object(map) => Value::Object(translate_object(map)),
        Value::Array(items) => Value::Array(items.iter().map(translate_fragment).collect()),
        other => other.clone(),
    }
}

/// Place translated `components.schemas` inside a translated document so that
/// `#/components/schemas/...` references resolve against it.
pub fn inject_components(mut schema: Value, components: Option<&Value>) -> Value {
    if let (Value::Object(root), Some(schemas)) = (&mut schema, components) {
        let mut holder = Map::new();
        holder.insert("schemas".to_string(), translate_fragment(schemas));
        root.insert("components".to_string(), Value::Object(holder));
    }
    schema
}

fn translate_object(map: &Map<String, Value>) -> Map<String, Value> {
    let nullable = matches!(map.get("nullable"), Some(Value::Bool(true)));

    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        // Only the keyword form is dropped; a property called "nullable" is an object.
        if key == "nullable" && value.is_boolean() {
            continue;
        }
        out.insert(key.clone(), translate_fragment(value));
    }

    if nullable {
        if let Some(ty) = out.get_mut("type") {
            widen_type(ty);
        }
        if let Some(Value::Array(variants)) = out.get_mut("enum") {
            if !variants.contains(&Value::Null) {
                variants.push(Value::Null);
            }
        }
    }

    out
}

fn widen_type(ty: &mut Value) {
    let null = Value::String("null".to_string());
    match ty {
        Value::String(_) => *ty = Value::Array(vec![ty.take(), null]),
        Value::Array(types) => {
            if !types.contains(&null) {
                types.push(null);
            }
        }
        _ => {}
    }
}
