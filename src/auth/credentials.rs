//! Static credential providers
//!
//! API key and HTTP basic authentication. Both are pure functions of the
//! configuration: the header is computed once and returned on every call.

use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::error::{AuthError, ConfigError};
use crate::util::SecretString;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{HeaderName, HeaderValue};

/// API key authentication provider
#[derive(Debug, Clone)]
pub struct ApiKeyProvider {
    header_name: HeaderName,
    api_key: SecretString,
}

impl ApiKeyProvider {
    /// Create a new API key provider
    ///
    /// Fails if the header name is not a valid HTTP header name or the key
    /// cannot be sent as a header value.
    pub fn new(header_name: &str, api_key: SecretString) -> Result<Self, ConfigError> {
        let name = HeaderName::from_bytes(header_name.trim().as_bytes()).map_err(|e| {
            ConfigError::InvalidHeader {
                name: header_name.to_string(),
                reason: e.to_string(),
            }
        })?;

        if api_key.is_empty() {
            return Err(ConfigError::Missing {
                field: "servicenow.auth.api_key.api_key".to_string(),
            });
        }

        if HeaderValue::from_str(api_key.expose_secret()).is_err() {
            return Err(ConfigError::InvalidHeader {
                name: header_name.to_string(),
                reason: "API key contains characters not allowed in a header value".to_string(),
            });
        }

        Ok(Self {
            header_name: name,
            api_key,
        })
    }
}

#[async_trait]
impl AuthProvider for ApiKeyProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        Ok(AuthHeader::ApiKey {
            header_name: self.header_name.clone(),
            api_key: self.api_key.clone(),
        })
    }

    fn auth_type(&self) -> &'static str {
        "API Key"
    }
}

/// HTTP basic authentication provider
#[derive(Debug, Clone)]
pub struct BasicProvider {
    encoded: SecretString,
}

impl BasicProvider {
    /// Create a new basic auth provider
    ///
    /// The credentials are `base64("username:password")` over the UTF-8
    /// bytes, standard alphabet, padded, unwrapped.
    pub fn new(username: &str, password: &SecretString) -> Result<Self, ConfigError> {
        if username.is_empty() {
            return Err(ConfigError::Missing {
                field: "servicenow.auth.basic.username".to_string(),
            });
        }

        // RFC 7617: the user-id cannot contain a colon
        if username.contains(':') {
            return Err(ConfigError::Invalid {
                message: "servicenow.auth.basic.username must not contain ':'".to_string(),
            });
        }

        let encoded = STANDARD.encode(format!("{}:{}", username, password.expose_secret()));

        Ok(Self {
            encoded: SecretString::new(encoded),
        })
    }
}

#[async_trait]
impl AuthProvider for BasicProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        Ok(AuthHeader::Basic(self.encoded.clone()))
    }

    fn auth_type(&self) -> &'static str {
        "Basic"
    }
}
