//! Header resolution
//!
//! [`HeaderResolver`] turns the configured authentication scheme into the
//! complete header map merged into every request sent to the instance.

use crate::auth::provider::AuthProvider;
use crate::auth::create_auth_provider;
use crate::config::ServiceNowConfig;
use crate::error::AuthError;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::sync::Arc;

const APPLICATION_JSON: &str = "application/json";

/// Produces request headers for the configured instance
#[derive(Clone)]
pub struct HeaderResolver {
    provider: Arc<dyn AuthProvider>,
}

impl HeaderResolver {
    /// Wrap an existing provider
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }

    /// Build the provider selected by `config.auth`
    pub fn from_config(config: &ServiceNowConfig) -> crate::error::Result<Self> {
        Ok(Self::new(Arc::from(create_auth_provider(config)?)))
    }

    /// Headers for the next request
    ///
    /// Always contains `Accept` and `Content-Type` set to JSON plus the
    /// credential header of the active scheme. Nothing is returned when the
    /// credential cannot be produced.
    pub async fn resolve(&self) -> Result<HeaderMap, AuthError> {
        let auth = self.provider.get_auth_header().await?;

        let mut headers = HeaderMap::with_capacity(3);
        headers.insert(ACCEPT, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        headers.insert(auth.header_name(), auth.header_value()?);

        Ok(headers)
    }

    /// Drop cached credentials after the instance answered 401
    pub async fn invalidate(&self) -> bool {
        self.provider.invalidate().await
    }

    pub fn auth_type(&self) -> &'static str {
        self.provider.auth_type()
    }
}

impl std::fmt::Debug for HeaderResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeaderResolver")
            .field("auth_type", &self.provider.auth_type())
            .finish()
    }
}
