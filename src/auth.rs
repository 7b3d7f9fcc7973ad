//! Credentials for outgoing calls.
//!
//! Callers name *environment variables*, never secrets: `{"username": "API_USER"}` means
//! "read the username from `$API_USER`".

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use reqwest::blocking::RequestBuilder;

use crate::error::AuthenticationError;

/// Supported authentication schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authentication {
    #[default]
    None,
    HttpBasic,
}

impl Authentication {
    /// Credential keys that must be mapped to environment variables.
    pub fn required_keys(self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::HttpBasic => &["username", "password"],
        }
    }
}

impl FromStr for Authentication {
    type Err = AuthenticationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Self::None),
            "HTTPBasicAuth" | "basic" => Ok(Self::HttpBasic),
            other => Err(AuthenticationError::NotImplemented {
                method: other.to_string(),
            }),
        }
    }
}

/// Resolved credentials, applied to each outgoing request.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialHandle {
    Basic { username: String, password: String },
}

impl CredentialHandle {
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

// Keep secrets out of logs.
impl fmt::Debug for CredentialHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Turns an [`Authentication`] plus a key → variable-name map into a [`CredentialHandle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialProvider;

impl CredentialProvider {
    /// Resolve against the process environment.
    pub fn resolve(
        method: Authentication,
        parameters: &HashMap<String, String>,
    ) -> Result<Option<CredentialHandle>, AuthenticationError> {
        Self::resolve_with(method, parameters, |name| std::env::var(name).ok())
    }

    /// Resolve with an explicit variable lookup.
    pub fn resolve_with<F>(
        method: Authentication,
        parameters: &HashMap<String, String>,
        lookup: F,
    ) -> Result<Option<CredentialHandle>, AuthenticationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let keys = method.required_keys();

        let missing_keys: Vec<String> = keys
            .iter()
            .filter(|key| !parameters.contains_key(**key))
            .map(|key| (*key).to_string())
            .collect();
        if !missing_keys.is_empty() {
            return Err(AuthenticationError::MissingKeys(missing_keys));
        }

        let mut values = HashMap::with_capacity(keys.len());
        let mut missing_values = Vec::new();
        for key in keys {
            let variable = &parameters[*key];
            match lookup(variable) {
                Some(value) => {
                    values.insert(*key, value);
                }
                None => missing_values.push(variable.clone()),
            }
        }
        if !missing_values.is_empty() {
            return Err(AuthenticationError::MissingValues(missing_values));
        }

        Ok(match method {
            Authentication::None => None,
            Authentication::HttpBasic => Some(CredentialHandle::Basic {
                username: values.remove("username").unwrap_or_default(),
                password: values.remove("password").unwrap_or_default(),
            }),
        })
    }
}
