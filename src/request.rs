//! Operation + caller parameters → URL, then the call itself.
//!
//! Only `in: query` parameters are placed in the URL. Values are used exactly as given;
//! encoding them is left to the caller.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use crate::auth::CredentialHandle;
use crate::config::ClientConfig;
use crate::error::{DefinitionError, Error, RequestAbortedError, ValidationError};
use crate::response::{normalize, ResponseEnvelope};
use crate::schema::{inject_components, translate};
use crate::spec::{OperationEntry, ParameterDefinition, ParameterLocation, Server};
use crate::transport::{HttpMethod, RawOutcome, Transport};
use crate::validation::{validate, ValidationKind};

/// Outcome of looking up one declared parameter in the caller's map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The caller supplied a value.
    Extracted(String),
    /// Required, but not supplied.
    Missing(String),
    /// Optional and not supplied; the parameter is skipped.
    Ignored(String),
}

impl Extraction {
    /// Human readable reason for a parameter that was not extracted.
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Extracted(_) => None,
            Self::Missing(name) => Some(format!("Required parameter '{name}' is missing!")),
            Self::Ignored(name) => Some(format!("Parameter '{name}' is ignored!")),
        }
    }

    /// `Extracted` → value; `Missing`/`Ignored` → [`RequestAbortedError`].
    pub fn into_result(self) -> Result<String, RequestAbortedError> {
        match self {
            Self::Extracted(value) => Ok(value),
            other => Err(RequestAbortedError {
                message: other.message().unwrap_or_default(),
            }),
        }
    }
}

/// Look up `definition` in the caller-supplied parameters.
pub fn extract_parameter(
    parameters: &HashMap<String, String>,
    definition: &ParameterDefinition,
) -> Extraction {
    match parameters.get(&definition.name) {
        Some(value) => Extraction::Extracted(value.clone()),
        None if definition.required => Extraction::Missing(definition.name.clone()),
        None => Extraction::Ignored(definition.name.clone()),
    }
}

/// Render one query parameter as `name=value`.
pub fn format_query_parameter(
    parameters: &HashMap<String, String>,
    definition: &ParameterDefinition,
) -> Result<String, RequestAbortedError> {
    let value = extract_parameter(parameters, definition).into_result()?;
    Ok(format!("{}={}", definition.name, value))
}

/// One call to one operation.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    server: Option<Server>,
    entry: Option<OperationEntry>,
    endpoint: String,
    method: HttpMethod,
}

impl ApiRequest {
    pub fn new(
        server: Option<Server>,
        entry: Option<OperationEntry>,
        endpoint: impl Into<String>,
        method: HttpMethod,
    ) -> Self {
        Self {
            server,
            entry,
            endpoint: endpoint.into(),
            method,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn entry(&self) -> Option<&OperationEntry> {
        self.entry.as_ref()
    }

    /// Query string for the declared `in: query` parameters, `None` when there are none.
    ///
    /// Parameters declared `in: path`, `in: header` or `in: cookie` are not placed anywhere.
    pub fn extract_query_string(
        &self,
        parameters: Option<&HashMap<String, String>>,
    ) -> Result<Option<String>, RequestAbortedError> {
        let Some(entry) = &self.entry else {
            return Ok(None);
        };
        let empty = HashMap::new();
        let parameters = parameters.unwrap_or(&empty);

        let args = entry
            .parameter_definitions()
            .iter()
            .filter(|p| p.location == ParameterLocation::Query)
            .map(|p| format_query_parameter(parameters, p))
            .collect::<Result<Vec<_>, _>>()?;

        if args.is_empty() {
            Ok(None)
        } else {
            Ok(Some(args.join("&")))
        }
    }

    /// `server.url + endpoint [+ "?" + query]`.
    ///
    /// `Ok(None)` when no server is selected or the operation is not defined.
    pub fn build_url(
        &self,
        parameters: Option<&HashMap<String, String>>,
    ) -> Result<Option<String>, RequestAbortedError> {
        let (Some(server), Some(_)) = (&self.server, &self.entry) else {
            return Ok(None);
        };

        let url = match self.extract_query_string(parameters)? {
            Some(query) => format!("{}{}?{}", server.url, self.endpoint, query),
            None => format!("{}{}", server.url, self.endpoint),
        };
        Ok(Some(url))
    }

    /// Check an outgoing body against the declared `requestBody` schema.
    pub fn validate_body(
        &self,
        body: Option<&Value>,
        components: Option<&Value>,
        config: &ClientConfig,
    ) -> Result<(), ValidationError> {
        let Some(entry) = &self.entry else {
            return Ok(());
        };

        match body {
            None if entry.request_body_required() => Err(ValidationError::Body(format!(
                "Request body is required for {}:{}",
                self.endpoint, self.method
            ))),
            None => Ok(()),
            Some(body) => match entry.request_body_schema(&config.content_type) {
                Some(schema) => validate(
                    body,
                    &inject_components(translate(schema), components),
                    ValidationKind::Body,
                ),
                None => Ok(()),
            },
        }
    }

    /// Whether the operation declares `status_code` among its responses.
    pub fn check_response(&self, status_code: u16) -> Result<(), DefinitionError> {
        let Some(entry) = &self.entry else {
            return Ok(());
        };
        let status = status_code.to_string();
        if entry.declares_status(&status) {
            Ok(())
        } else {
            Err(DefinitionError::StatusCode {
                endpoint: self.endpoint.clone(),
                method: self.method.to_string(),
                status,
            })
        }
    }

    /// Send the request and normalize whatever comes back.
    ///
    /// Transport failures do not escape: they become a 504 envelope. A status the operation
    /// does not declare is accepted without a payload check.
    pub fn execute(
        &self,
        transport: &dyn Transport,
        url: &str,
        body: Option<&Value>,
        credentials: Option<&CredentialHandle>,
        components: Option<&Value>,
        config: &ClientConfig,
    ) -> Result<ResponseEnvelope, Error> {
        self.validate_body(body, components, config)?;

        if config.debug_logging {
            debug!(method = %self.method, url, ?body, "sending request");
        }

        let envelope = match transport.execute(self.method, url, body, credentials) {
            Ok(raw) => {
                let entry = match self.check_response(raw.status_code) {
                    Ok(()) => self.entry.as_ref(),
                    Err(err) => {
                        debug!(url, %err, "No schema found for validation of status code");
                        None
                    }
                };
                normalize(url, &raw, None, entry, components, config)
            }
            Err(err) => {
                debug!(url, error = %err, "transport failed");
                normalize(
                    url,
                    &RawOutcome::transport_failure(),
                    Some(&err),
                    self.entry.as_ref(),
                    components,
                    config,
                )
            }
        };
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::registry::SpecificationRegistry;
    use serde_json::json;
    use std::cell::RefCell;

    fn registry() -> SpecificationRegistry {
        let doc = serde_json::from_str(include_str!("../testdata/api.json")).unwrap();
        let mut registry = SpecificationRegistry::load(doc, &ClientConfig::default()).unwrap();
        registry.select_server("Sample API");
        registry
    }

    fn create_request(
        registry: &SpecificationRegistry,
        endpoint: &str,
        method: HttpMethod,
    ) -> ApiRequest {
        ApiRequest::new(
            registry.server().cloned(),
            registry.get_operation(endpoint, method.as_str()).cloned(),
            endpoint,
            method,
        )
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn id_definition() -> ParameterDefinition {
        ParameterDefinition::from_value(&json!({
            "name": "id",
            "in": "query",
            "description": "Item Id",
            "required": true,
            "example": "item_id",
            "schema": {"type": "string"}
        }))
        .unwrap()
    }

    #[test]
    fn extract_parameter_present() {
        let extraction = extract_parameter(&params(&[("id", "my_id")]), &id_definition());
        assert_eq!(extraction, Extraction::Extracted("my_id".into()));
    }

    #[test]
    fn extract_parameter_missing_required() {
        let extraction = extract_parameter(&HashMap::new(), &id_definition());
        assert_eq!(extraction, Extraction::Missing("id".into()));
        assert_eq!(
            extraction.message().as_deref(),
            Some("Required parameter 'id' is missing!")
        );
    }

    #[test]
    fn extract_parameter_ignored_optional() {
        let optional = ParameterDefinition::new("name", ParameterLocation::Query, false);
        let extraction = extract_parameter(&HashMap::new(), &optional);
        assert_eq!(extraction, Extraction::Ignored("name".into()));
        assert_eq!(extraction.message().as_deref(), Some("Parameter 'name' is ignored!"));
    }

    #[test]
    fn format_query_parameter_renders_pair() {
        let pair = format_query_parameter(&params(&[("id", "my_id")]), &id_definition()).unwrap();
        assert_eq!(pair, "id=my_id");
    }

    #[test]
    fn format_query_parameter_does_not_encode() {
        let pair =
            format_query_parameter(&params(&[("id", "a b&c")]), &id_definition()).unwrap();
        assert_eq!(pair, "id=a b&c");
    }

    #[test]
    fn build_url_with_all_parameters() {
        let registry = registry();
        for method in [HttpMethod::Get, HttpMethod::Post] {
            let request = create_request(&registry, "/GetItem", method);
            let url = request
                .build_url(Some(&params(&[("id", "my_id"), ("name", "my_name")])))
                .unwrap();
            assert_eq!(
                url.as_deref(),
                Some("http://url:1234/api/v1/GetItem?id=my_id&name=my_name")
            );
        }
    }

    #[test]
    fn build_url_aborts_on_ignored_parameter() {
        let registry = registry();
        for method in [HttpMethod::Get, HttpMethod::Post] {
            let request = create_request(&registry, "/GetItem", method);
            let err = request
                .build_url(Some(&params(&[("id", "my_id")])))
                .unwrap_err();
            assert_eq!(err.to_string(), "Parameter 'name' is ignored!");
        }
    }

    #[test]
    fn build_url_aborts_on_missing_required_parameter() {
        let registry = registry();
        let request = create_request(&registry, "/GetItem", HttpMethod::Get);
        let err = request
            .build_url(Some(&params(&[("name", "my_name")])))
            .unwrap_err();
        assert_eq!(err.message, "Required parameter 'id' is missing!");
    }

    #[test]
    fn build_url_without_query_parameters() {
        let registry = registry();
        for method in [HttpMethod::Get, HttpMethod::Post] {
            let request = create_request(&registry, "/GetItems", method);
            assert_eq!(request.extract_query_string(None).unwrap(), None);
            assert_eq!(
                request.build_url(None).unwrap().as_deref(),
                Some("http://url:1234/api/v1/GetItems")
            );
        }
    }

    #[test]
    fn build_url_without_server() {
        let mut registry = registry();
        registry.select_server("");
        let request = create_request(&registry, "/GetItems", HttpMethod::Get);
        assert_eq!(request.build_url(None).unwrap(), None);
    }

    #[test]
    fn build_url_without_definition() {
        let registry = registry();
        let request = create_request(&registry, "/GetItem_bad", HttpMethod::Get);
        assert!(request.entry().is_none());
        assert_eq!(request.build_url(None).unwrap(), None);
    }

    #[test]
    fn build_url_skips_header_parameters() {
        let registry = registry();
        let request = create_request(&registry, "/Items", HttpMethod::Delete);
        let url = request
            .build_url(Some(&params(&[("tenant", "t1"), ("id", "42")])))
            .unwrap();
        assert_eq!(
            url.as_deref(),
            Some("http://url:1234/api/v1/Items?tenant=t1&id=42")
        );
    }

    #[test]
    fn validate_body_against_declared_schema() {
        let registry = registry();
        let request = create_request(&registry, "/Items", HttpMethod::Put);
        let config = ClientConfig::default();
        let components = registry.components_schemas();

        let good = json!({"Guid": "1", "Name": "one", "FirstStation": null});
        assert!(request.validate_body(Some(&good), components, &config).is_ok());

        let bad = json!({"Guid": 1});
        let err = request.validate_body(Some(&bad), components, &config).unwrap_err();
        assert!(matches!(err, ValidationError::Body(_)));

        let err = request.validate_body(None, components, &config).unwrap_err();
        assert!(matches!(err, ValidationError::Body(_)));
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn execute(
            &self,
            _method: HttpMethod,
            _url: &str,
            _body: Option<&Value>,
            _credentials: Option<&CredentialHandle>,
        ) -> Result<RawOutcome, TransportError> {
            Err(TransportError::Connection("connection refused".into()))
        }
    }

    struct RecordingTransport {
        outcome: RawOutcome,
        calls: RefCell<Vec<(HttpMethod, String, Option<Value>)>>,
    }

    impl Transport for RecordingTransport {
        fn execute(
            &self,
            method: HttpMethod,
            url: &str,
            body: Option<&Value>,
            _credentials: Option<&CredentialHandle>,
        ) -> Result<RawOutcome, TransportError> {
            self.calls
                .borrow_mut()
                .push((method, url.to_string(), body.cloned()));
            Ok(self.outcome.clone())
        }
    }

    #[test]
    fn execute_converts_transport_failure_to_gateway_timeout() {
        let registry = registry();
        let request = create_request(&registry, "/GetItem", HttpMethod::Get);
        let url = request
            .build_url(Some(&params(&[("id", "my_id"), ("name", "my_name")])))
            .unwrap()
            .unwrap();

        let envelope = request
            .execute(
                &FailingTransport,
                &url,
                None,
                None,
                registry.components_schemas(),
                &ClientConfig::default(),
            )
            .unwrap();
        assert_eq!(envelope.status_code, 500);
        assert_eq!(envelope.response.status_code, 504);
        assert_eq!(
            envelope.response.message,
            "Gateway timeout: connection failed: connection refused"
        );
        assert_eq!(envelope.response.payload, json!({}));
    }

    #[test]
    fn execute_rejects_invalid_body_before_sending() {
        let registry = registry();
        let request = create_request(&registry, "/Items", HttpMethod::Put);
        let transport = RecordingTransport {
            outcome: RawOutcome::new(201, json!({})),
            calls: RefCell::new(Vec::new()),
        };

        let result = request.execute(
            &transport,
            "http://url:1234/api/v1/Items?tenant=t1",
            Some(&json!({"Name": 3})),
            None,
            registry.components_schemas(),
            &ClientConfig::default(),
        );
        assert!(matches!(result, Err(Error::Validation(ValidationError::Body(_)))));
        assert!(transport.calls.borrow().is_empty());
    }

    #[test]
    fn execute_passes_method_url_and_body_to_transport() {
        let registry = registry();
        let request = create_request(&registry, "/Items", HttpMethod::Put);
        let body = json!({"Guid": "1", "Name": "one"});
        let transport = RecordingTransport {
            outcome: RawOutcome::new(201, body.clone()),
            calls: RefCell::new(Vec::new()),
        };

        let envelope = request
            .execute(
                &transport,
                "http://url:1234/api/v1/Items?tenant=t1",
                Some(&body),
                None,
                registry.components_schemas(),
                &ClientConfig::default(),
            )
            .unwrap();
        assert_eq!(envelope.response.message, "OK: dict");

        let calls = transport.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, HttpMethod::Put);
        assert_eq!(calls[0].1, "http://url:1234/api/v1/Items?tenant=t1");
        assert_eq!(calls[0].2.as_ref(), Some(&body));
    }

    fn referenced_document() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "Refs", "version": "1.0"},
            "servers": [{"url": "http://h", "description": "H"}],
            "paths": {
                "/GetItem": {
                    "get": {
                        "parameters": [{"$ref": "#/components/parameters/Id"}],
                        "responses": {"200": {"$ref": "#/components/responses/ItemsOk"}}
                    }
                }
            },
            "components": {
                "parameters": {
                    "Id": {
                        "name": "id",
                        "in": "query",
                        "required": true,
                        "schema": {"type": "string"}
                    }
                },
                "responses": {
                    "ItemsOk": {
                        "description": "ok",
                        "content": {"application/json": {"schema": {"type": "array"}}}
                    }
                }
            }
        })
    }

    #[test]
    fn referenced_required_parameter_is_enforced() {
        let mut registry =
            SpecificationRegistry::load(referenced_document(), &ClientConfig::default()).unwrap();
        registry.select_server("H");
        let request = create_request(&registry, "/GetItem", HttpMethod::Get);

        let err = request.build_url(None).unwrap_err();
        assert_eq!(err.message, "Required parameter 'id' is missing!");
        assert_eq!(
            request.build_url(Some(&params(&[("id", "7")]))).unwrap().as_deref(),
            Some("http://h/GetItem?id=7")
        );
    }

    #[test]
    fn referenced_response_schema_is_checked() {
        let registry =
            SpecificationRegistry::load(referenced_document(), &ClientConfig::default()).unwrap();
        let request = create_request(&registry, "/GetItem", HttpMethod::Get);
        let transport = RecordingTransport {
            outcome: RawOutcome::new(200, json!({"a": 1})),
            calls: RefCell::new(Vec::new()),
        };

        let envelope = request
            .execute(
                &transport,
                "http://h/GetItem?id=7",
                None,
                None,
                registry.components_schemas(),
                &ClientConfig::default(),
            )
            .unwrap();
        assert_eq!(
            envelope.response.message,
            "OK: dict; Response doesn't correspond to predefined schema!"
        );
    }

    #[test]
    fn check_response_reports_undeclared_status() {
        let registry = registry();
        let request = create_request(&registry, "/GetItem", HttpMethod::Get);
        assert!(request.check_response(200).is_ok());

        let err = request.check_response(418).unwrap_err();
        assert_eq!(err.to_string(), "Status code /GetItem:get:418 is missing.");
    }

    #[test]
    fn execute_skips_payload_check_for_undeclared_status() {
        let registry = registry();
        let request = create_request(&registry, "/GetItems", HttpMethod::Get);
        let transport = RecordingTransport {
            outcome: RawOutcome::new(404, json!({"error": "not found"})),
            calls: RefCell::new(Vec::new()),
        };

        let envelope = request
            .execute(
                &transport,
                "http://url:1234/api/v1/GetItems",
                None,
                None,
                registry.components_schemas(),
                &ClientConfig::default(),
            )
            .unwrap();
        assert_eq!(envelope.status_code, 404);
        assert_eq!(envelope.response.message, "OK: dict");
    }
}
