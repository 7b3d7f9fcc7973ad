//! Loaded specification: operation catalogs plus the selected server.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{DefinitionError, Error, ValidationError};
use crate::resolver::dereference_path_item;
use crate::spec::{OperationCatalog, OperationEntry, Server};
use crate::validation::validate_openapi_document;

/// Read a JSON document from disk.
///
/// A missing file is not an error: it yields `{}` so later lookups simply find nothing.
pub fn read_json(path: impl AsRef<Path>) -> Result<Value, Error> {
    let path = path.as_ref();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if source.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "JSON document not found, using an empty document");
            return Ok(Value::Object(serde_json::Map::new()));
        }
        Err(source) => {
            return Err(Error::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// A parsed OpenAPI document indexed by endpoint.
#[derive(Debug, Clone)]
pub struct SpecificationRegistry {
    document: Value,
    catalogs: BTreeMap<String, OperationCatalog>,
    server: Option<Server>,
}

impl SpecificationRegistry {
    /// Build a registry from an already parsed document.
    ///
    /// With `config.validate_spec` the document must match the OpenAPI 3.0 meta-schema.
    /// Local `$ref`s on parameters, request bodies and responses are resolved here; one
    /// that cannot be resolved fails with [`ValidationError::ApiDefinition`].
    pub fn load(document: Value, config: &ClientConfig) -> Result<Self, ValidationError> {
        if config.validate_spec {
            validate_openapi_document(&document)?;
        }

        let mut catalogs = BTreeMap::new();
        if let Some(paths) = document.get("paths").and_then(|p| p.as_object()) {
            for (path, item) in paths {
                let item = dereference_path_item(&document, item)?;
                catalogs.insert(path.clone(), OperationCatalog::build(&item, &config.blocks));
            }
        }

        debug!(endpoints = catalogs.len(), "specification loaded");

        Ok(Self {
            document,
            catalogs,
            server: None,
        })
    }

    /// Read the document at `path` and load it. A missing file loads as `{}`.
    pub fn load_from_path(path: impl AsRef<Path>, config: &ClientConfig) -> Result<Self, Error> {
        let document = read_json(path)?;
        Ok(Self::load(document, config)?)
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Servers declared in the document, in document order.
    pub fn servers(&self) -> Vec<Server> {
        self.document
            .get("servers")
            .and_then(|s| s.as_array())
            .map(|servers| {
                servers
                    .iter()
                    .filter_map(|s| serde_json::from_value(s.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Select the first server whose description matches.
    ///
    /// An unknown description clears the selection and returns `false`.
    pub fn select_server(&mut self, description: &str) -> bool {
        self.server = self
            .servers()
            .into_iter()
            .find(|s| s.description.as_deref() == Some(description));

        if self.server.is_none() {
            warn!(description, "server description has not been found");
            return false;
        }
        true
    }

    /// The currently selected server.
    pub fn server(&self) -> Option<&Server> {
        self.server.as_ref()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }

    pub fn catalog(&self, endpoint: &str) -> Option<&OperationCatalog> {
        self.catalogs.get(endpoint)
    }

    /// Look up an operation. Unknown endpoints and methods yield `None`.
    pub fn get_operation(&self, endpoint: &str, method: &str) -> Option<&OperationEntry> {
        match self.require_operation(endpoint, method) {
            Ok(entry) => Some(entry),
            Err(err) => {
                debug!(%err, "operation lookup found nothing");
                None
            }
        }
    }

    /// Look up an operation, reporting why it is missing.
    pub fn require_operation(
        &self,
        endpoint: &str,
        method: &str,
    ) -> Result<&OperationEntry, DefinitionError> {
        let catalog = self
            .catalogs
            .get(endpoint)
            .ok_or_else(|| DefinitionError::Endpoint {
                endpoint: endpoint.to_string(),
            })?;
        catalog
            .get(method)
            .ok_or_else(|| DefinitionError::RequestType {
                endpoint: endpoint.to_string(),
                method: method.to_string(),
            })
    }

    /// `components.schemas`, used to resolve `$ref`s while validating.
    pub fn components_schemas(&self) -> Option<&Value> {
        self.document.get("components")?.get("schemas")
    }
}
