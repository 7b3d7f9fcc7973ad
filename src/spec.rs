//! OpenAPI path items → operation catalog
//!
//! Restructures one raw path item into a per-method lookup of the blocks the request
//! pipeline needs (`parameters`, `responses`, `requestBody` by default). Nothing is
//! validated here; every fragment stays a raw `serde_json::Value`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path item keys that name an operation.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A server entry from the document's `servers` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    /// Servers without one can never be selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    fn parse(location: &str) -> Option<Self> {
        match location {
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "path" => Some(Self::Path),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// A single declared parameter.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub struct ParameterDefinition {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: Value,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, location: ParameterLocation, required: bool) -> Self {
        Self {
            name: name.into(),
            location,
            required,
            schema: default_parameter_schema(),
        }
    }

    /// Parse a parameter object; `None` when `name` or a known `in` is missing.
    pub fn from_value(param: &Value) -> Option<Self> {
        let name = param.get("name")?.as_str()?.to_string();
        let location = ParameterLocation::parse(param.get("in")?.as_str()?)?;
        let required = param
            .get("required")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let schema = param
            .get("schema")
            .cloned()
            .unwrap_or_else(default_parameter_schema);

        Some(Self {
            name,
            location,
            required,
            schema,
        })
    }
}

fn default_parameter_schema() -> Value {
    serde_json::json!({"type": "string"})
}

/// The blocks of one (endpoint, method) pair.
///
/// Every configured block name is a key; an absent block maps to `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationEntry {
    blocks: BTreeMap<String, Option<Value>>,
}

impl OperationEntry {
    /// Build an entry from an operation object, keeping only `blocks`.
    pub fn from_operation(operation: &Value, blocks: &[String]) -> Self {
        let blocks = blocks
            .iter()
            .map(|name| (name.clone(), operation.get(name).cloned()))
            .collect();
        Self { blocks }
    }

    /// Raw fragment for `name`; `None` when absent or not a configured block.
    pub fn block(&self, name: &str) -> Option<&Value> {
        self.blocks.get(name).and_then(Option::as_ref)
    }

    /// Whether `name` is one of the configured block names (present or not).
    pub fn has_block_slot(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn parameters(&self) -> Option<&Value> {
        self.block("parameters")
    }

    pub fn responses(&self) -> Option<&Value> {
        self.block("responses")
    }

    pub fn request_body(&self) -> Option<&Value> {
        self.block("requestBody")
    }

    /// Declared parameters in declaration order. Unparseable entries are skipped.
    pub fn parameter_definitions(&self) -> Vec<ParameterDefinition> {
        self.parameters()
            .and_then(|p| p.as_array())
            .map(|params| params.iter().filter_map(ParameterDefinition::from_value).collect())
            .unwrap_or_default()
    }

    /// Whether `responses` declares the literal status code.
    pub fn declares_status(&self, status: &str) -> bool {
        self.responses().and_then(|r| r.get(status)).is_some()
    }

    /// `responses.<status>.content.<content_type>.schema`
    pub fn response_schema(&self, status: &str, content_type: &str) -> Option<&Value> {
        self.responses()?
            .get(status)?
            .get("content")?
            .get(content_type)?
            .get("schema")
    }

    /// `requestBody.content.<content_type>.schema`
    pub fn request_body_schema(&self, content_type: &str) -> Option<&Value> {
        self.request_body()?
            .get("content")?
            .get(content_type)?
            .get("schema")
    }

    pub fn request_body_required(&self) -> bool {
        self.request_body()
            .and_then(|rb| rb.get("required"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

/// All operations declared under one path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationCatalog {
    operations: BTreeMap<String, OperationEntry>,
}

impl OperationCatalog {
    /// Build the catalog for one raw path item.
    ///
    /// Path-level `parameters` are inherited by every operation; an operation-level
    /// parameter with the same `(name, in)` replaces the inherited one.
    pub fn build(path_item: &Value, blocks: &[String]) -> Self {
        let mut operations = BTreeMap::new();
        let path_level_params = path_item.get("parameters").and_then(|p| p.as_array());

        for method in HTTP_METHODS {
            let Some(operation) = path_item.get(method) else {
                continue;
            };

            let mut entry = OperationEntry::from_operation(operation, blocks);
            if let Some(shared) = path_level_params {
                if let Some(slot) = entry.blocks.get_mut("parameters") {
                    let merged = merge_parameters(shared, slot.as_ref().and_then(|v| v.as_array()));
                    *slot = Some(Value::Array(merged));
                }
            }
            operations.insert(method.to_string(), entry);
        }

        Self { operations }
    }

    pub fn get(&self, method: &str) -> Option<&OperationEntry> {
        self.operations.get(&method.to_ascii_lowercase())
    }

    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

fn parameter_key(param: &Value) -> Option<(&str, &str)> {
    Some((param.get("name")?.as_str()?, param.get("in")?.as_str()?))
}

/// Path-level parameters first, each replaced by an operation-level override when one
/// exists, followed by the remaining operation-level parameters.
fn merge_parameters(path_level: &[Value], operation_level: Option<&Vec<Value>>) -> Vec<Value> {
    let operation_level = operation_level.map(Vec::as_slice).unwrap_or_default();
    let mut merged: Vec<Value> = Vec::with_capacity(path_level.len() + operation_level.len());

    for shared in path_level {
        let key = parameter_key(shared);
        let overridden = key.and_then(|k| {
            operation_level
                .iter()
                .find(|op| parameter_key(op) == Some(k))
        });
        merged.push(overridden.unwrap_or(shared).clone());
    }
    for own in operation_level {
        let key = parameter_key(own);
        let inherited = key.is_some_and(|k| path_level.iter().any(|p| parameter_key(p) == Some(k)));
        if !inherited {
            merged.push(own.clone());
        }
    }

    merged
}
