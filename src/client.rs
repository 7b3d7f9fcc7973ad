//! The public call path: operation lookup → URL → transport → envelope.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;
use tracing::debug;

use crate::auth::CredentialHandle;
use crate::config::ClientConfig;
use crate::error::{DefinitionError, Error};
use crate::registry::SpecificationRegistry;
use crate::request::ApiRequest;
use crate::response::ResponseEnvelope;
use crate::transport::{HttpMethod, HttpTransport, Transport};

/// A specification-driven HTTP client.
///
/// `select_server` needs `&mut` access through [`ApiClient::registry_mut`], so choosing a
/// server and building URLs cannot interleave on one client.
pub struct ApiClient {
    registry: SpecificationRegistry,
    config: ClientConfig,
    credentials: Option<CredentialHandle>,
    transport: Box<dyn Transport>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client over `registry` using a default [`HttpTransport`] and no credentials.
    pub fn new(registry: SpecificationRegistry, config: ClientConfig) -> Self {
        Self {
            registry,
            config,
            credentials: None,
            transport: Box::new(HttpTransport::default()),
        }
    }

    /// Load `document` and wrap it in a client.
    pub fn from_document(document: Value, config: ClientConfig) -> Result<Self, Error> {
        let registry = SpecificationRegistry::load(document, &config)?;
        Ok(Self::new(registry, config))
    }

    pub fn with_credentials(mut self, credentials: Option<CredentialHandle>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn registry(&self) -> &SpecificationRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SpecificationRegistry {
        &mut self.registry
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shorthand for `registry_mut().select_server(description)`.
    pub fn select_server(&mut self, description: &str) -> bool {
        self.registry.select_server(description)
    }

    /// Prepare a request for one operation.
    pub fn request(&self, endpoint: &str, method: &str) -> Result<ApiRequest, DefinitionError> {
        let http_method = HttpMethod::parse_for(endpoint, method)?;
        let entry = self.registry.require_operation(endpoint, http_method.as_str())?;

        Ok(ApiRequest::new(
            self.registry.server().cloned(),
            Some(entry.clone()),
            endpoint,
            http_method,
        ))
    }

    /// Call one operation.
    ///
    /// `Ok(None)` means no URL could be built because no server is selected. A declared
    /// query parameter that was not supplied aborts with [`Error::RequestAborted`].
    pub fn call(
        &self,
        endpoint: &str,
        method: &str,
        parameters: Option<&HashMap<String, String>>,
        body: Option<&Value>,
    ) -> Result<Option<ResponseEnvelope>, Error> {
        let request = self.request(endpoint, method)?;
        let Some(url) = request.build_url(parameters)? else {
            debug!(endpoint, method, "no server selected, request not sent");
            return Ok(None);
        };

        let envelope = request.execute(
            self.transport.as_ref(),
            &url,
            body,
            self.credentials.as_ref(),
            self.registry.components_schemas(),
            &self.config,
        )?;
        Ok(Some(envelope))
    }
}
