//! The wire seam: send one request, get back a status code and a JSON body.

use std::fmt;
use std::str::FromStr;

use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;

use crate::auth::CredentialHandle;
use crate::error::{DefinitionError, TransportError};

/// HTTP methods the request pipeline can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    /// Parse `method` (case insensitive) for a call to `endpoint`.
    ///
    /// An unsupported name fails with [`DefinitionError::RequestType`].
    pub fn parse_for(endpoint: &str, method: &str) -> Result<Self, DefinitionError> {
        match method.to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            "put" => Ok(Self::Put),
            "delete" => Ok(Self::Delete),
            _ => Err(DefinitionError::RequestType {
                endpoint: endpoint.to_string(),
                method: method.to_string(),
            }),
        }
    }

    /// Lowercase name, as used for path item keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_for("", s)
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// What came back from the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOutcome {
    pub status_code: u16,
    pub body: Value,
}

impl RawOutcome {
    pub fn new(status_code: u16, body: Value) -> Self {
        Self { status_code, body }
    }

    /// Stand-in used when the transport failed before any response arrived.
    pub fn transport_failure() -> Self {
        Self::new(500, Value::Object(serde_json::Map::new()))
    }
}

/// Issues a single HTTP call.
///
/// Any non-2xx status is still an `Ok` outcome; `Err` means no response was received.
pub trait Transport {
    fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        credentials: Option<&CredentialHandle>,
    ) -> Result<RawOutcome, TransportError>;
}

/// [`Transport`] over a blocking reqwest client.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&Value>,
        credentials: Option<&CredentialHandle>,
    ) -> Result<RawOutcome, TransportError> {
        let mut req = self.client.request(method.into(), url);

        if let Some(credentials) = credentials {
            req = credentials.apply(req);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send()?;
        let status_code = resp.status().as_u16();
        let text = resp.text()?;

        // Non-JSON bodies (including an empty one) are kept as a JSON string.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(RawOutcome::new(status_code, body))
    }
}
