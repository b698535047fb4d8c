//! Authentication provider trait
//!
//! Every authentication scheme is an [`AuthProvider`] producing one
//! [`AuthHeader`] per request.

use crate::error::AuthError;
use crate::util::SecretString;
// async_trait required for dyn-compatibility with Box<dyn AuthProvider>
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};

/// Authentication provider trait
///
/// Implementations provide the credential header for ServiceNow requests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Get the authentication header for the next request
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError>;

    /// Drop cached credentials after the instance rejected them
    ///
    /// Returns `true` if anything was dropped and a retry could obtain
    /// different credentials. Static schemes have nothing to drop.
    async fn invalidate(&self) -> bool {
        false
    }

    /// Get a description of the auth method (for logging)
    fn auth_type(&self) -> &'static str;
}

/// Authentication header to use with requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthHeader {
    /// API key sent in a configurable header
    ApiKey {
        header_name: HeaderName,
        api_key: SecretString,
    },
    /// `Authorization: Basic`, holding the base64 credentials
    Basic(SecretString),
    /// `Authorization: Bearer`, holding the access token
    Bearer(SecretString),
}

impl AuthHeader {
    /// Get the header name for this auth type
    pub fn header_name(&self) -> HeaderName {
        match self {
            AuthHeader::ApiKey { header_name, .. } => header_name.clone(),
            AuthHeader::Basic(_) | AuthHeader::Bearer(_) => AUTHORIZATION,
        }
    }

    /// Get the header value for this auth type, marked sensitive
    pub fn header_value(&self) -> Result<HeaderValue, AuthError> {
        let mut value = match self {
            AuthHeader::ApiKey { api_key, .. } => HeaderValue::from_str(api_key.expose_secret())
                .map_err(|_| AuthError::InvalidToken("API key is not a valid header value".into()))?,
            AuthHeader::Basic(encoded) => {
                HeaderValue::from_str(&format!("Basic {}", encoded.expose_secret()))
                    .map_err(|_| AuthError::InvalidToken("malformed basic credentials".into()))?
            }
            AuthHeader::Bearer(token) => {
                HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())).map_err(
                    |_| AuthError::InvalidToken("access token is not a valid header value".into()),
                )?
            }
        };
        value.set_sensitive(true);
        Ok(value)
    }
}

/// Box type alias for auth providers
pub type BoxedAuthProvider = Box<dyn AuthProvider>;
