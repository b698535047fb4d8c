//! Authentication module
//!
//! Supports the three ServiceNow schemes: API key, basic credentials and
//! OAuth 2.0 bearer tokens. [`HeaderResolver`] is the entry point used by
//! the instance client.

pub mod credentials;
pub mod oauth;
pub mod provider;
pub mod resolver;

pub use credentials::{ApiKeyProvider, BasicProvider};
pub use oauth::{OAuthProvider, OAuthTokenProvider, TokenProvider};
pub use provider::{AuthHeader, AuthProvider, BoxedAuthProvider};
pub use resolver::HeaderResolver;

use crate::config::{AuthConfig, ServiceNowConfig};
use crate::error::AuthError;
use std::sync::Arc;
use tracing::debug;

/// Create an auth provider from configuration
pub fn create_auth_provider(config: &ServiceNowConfig) -> crate::error::Result<BoxedAuthProvider> {
    let auth = config.auth.as_ref().ok_or(AuthError::NotConfigured)?;
    debug!(auth_type = auth.type_name(), "Creating auth provider");

    let provider: BoxedAuthProvider = match auth {
        AuthConfig::ApiKey(api_key) => Box::new(ApiKeyProvider::new(
            &api_key.header_name,
            api_key.api_key.clone(),
        )?),
        AuthConfig::Basic(basic) => Box::new(BasicProvider::new(&basic.username, &basic.password)?),
        AuthConfig::OAuth(oauth) => {
            let tokens =
                OAuthTokenProvider::new(oauth, config.base_url(), config.verify_ssl)?;
            Box::new(OAuthProvider::new(Arc::new(tokens)))
        }
    };

    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiKeyConfig, BasicConfig};
    use crate::error::AppError;

    fn instance(auth: Option<AuthConfig>) -> ServiceNowConfig {
        ServiceNowConfig {
            instance_url: "https://dev1.service-now.com".to_string(),
            auth,
            ..Default::default()
        }
    }

    #[test]
    fn test_provider_per_variant() {
        let api_key = instance(Some(AuthConfig::ApiKey(ApiKeyConfig {
            header_name: "x-sn-apikey".to_string(),
            api_key: "k".into(),
        })));
        assert_eq!(create_auth_provider(&api_key).unwrap().auth_type(), "API Key");

        let basic = instance(Some(AuthConfig::Basic(BasicConfig {
            username: "alice".to_string(),
            password: "wonderland".into(),
        })));
        assert_eq!(create_auth_provider(&basic).unwrap().auth_type(), "Basic");
    }

    #[test]
    fn test_missing_auth() {
        let result = create_auth_provider(&instance(None));
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::NotConfigured))
        ));
    }

    #[test]
    fn test_invalid_header_name_is_config_error() {
        let config = instance(Some(AuthConfig::ApiKey(ApiKeyConfig {
            header_name: "bad header".to_string(),
            api_key: "k".into(),
        })));
        assert!(matches!(
            create_auth_provider(&config),
            Err(AppError::Config(_))
        ));
    }
}
