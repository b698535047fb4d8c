//! OAuth 2.0 authentication
//!
//! Access tokens come from the instance token endpoint (`/oauth_token.do`
//! by default) and are cached until shortly before they expire.

use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::config::OAuthConfig;
use crate::error::{AuthError, ConfigError};
use crate::util::SecretString;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Lifetime assumed when the token response omits `expires_in`
///
/// Matches the default access token lifespan of a ServiceNow OAuth client.
const DEFAULT_EXPIRES_IN_SECS: u64 = 1800;

/// Source of OAuth access tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a valid access token, fetching a new one if needed
    async fn get_token(&self) -> Result<SecretString, AuthError>;

    /// Forget the cached token; returns `true` if one was cached
    async fn invalidate(&self) -> bool {
        false
    }
}

/// Grant used to obtain tokens
#[derive(Debug, Clone)]
enum Grant {
    ClientCredentials,
    Password {
        username: String,
        password: SecretString,
    },
}

impl Grant {
    fn as_str(&self) -> &'static str {
        match self {
            Grant::ClientCredentials => "client_credentials",
            Grant::Password { .. } => "password",
        }
    }
}

#[derive(Debug)]
struct CachedToken {
    access_token: SecretString,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, margin: Duration) -> bool {
        Instant::now()
            .checked_add(margin)
            .is_some_and(|deadline| deadline < self.expires_at)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<serde_json::Value>,
}

impl TokenResponse {
    /// `expires_in` as seconds; some proxies send it as a string
    fn expires_in_secs(&self) -> u64 {
        match &self.expires_in {
            Some(serde_json::Value::Number(n)) => n.as_u64(),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
    }
}

/// Token provider backed by the instance token endpoint
///
/// Holds at most one token. Callers that find it stale wait on the same
/// mutex, so concurrent requests trigger a single token request.
pub struct OAuthTokenProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: SecretString,
    grant: Grant,
    scope: Option<String>,
    refresh_margin: Duration,
    timeout: Duration,
    cache: Mutex<Option<CachedToken>>,
}

impl OAuthTokenProvider {
    /// Create a token provider for an instance
    pub fn new(
        config: &OAuthConfig,
        instance_url: &str,
        verify_ssl: bool,
    ) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs(config.token_timeout_secs.max(1));

        let http = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .user_agent(format!("servicenow-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Invalid {
                message: format!("cannot build OAuth HTTP client: {}", e),
            })?;

        let grant = match (&config.username, &config.password) {
            (Some(username), Some(password)) => Grant::Password {
                username: username.clone(),
                password: password.clone(),
            },
            _ => Grant::ClientCredentials,
        };

        Ok(Self {
            http,
            token_url: config.token_endpoint(instance_url),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            grant,
            scope: config.scope.clone(),
            refresh_margin: Duration::from_secs(config.refresh_margin_secs),
            timeout,
            cache: Mutex::new(None),
        })
    }

    /// Token endpoint in use
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    #[instrument(skip(self), fields(grant = self.grant.as_str(), url = %self.token_url))]
    async fn request_token(&self) -> Result<CachedToken, AuthError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", self.grant.as_str()),
            ("client_id", &self.client_id),
            ("client_secret", self.client_secret.expose_secret()),
        ];
        if let Grant::Password { username, password } = &self.grant {
            form.push(("username", username));
            form.push(("password", password.expose_secret()));
        }
        if let Some(scope) = &self.scope {
            form.push(("scope", scope));
        }

        debug!("Requesting OAuth access token");

        let exchange = async {
            let response = self
                .http
                .post(&self.token_url)
                .header(reqwest::header::ACCEPT, "application/json")
                .form(&form)
                .send()
                .await?;

            let status = response.status();
            let body = response.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| {
                if e.is_timeout() {
                    self.timeout_error()
                } else {
                    AuthError::Request(e)
                }
            })?;

        if !status.is_success() {
            let message = oauth_error_message(&body);
            warn!(status = status.as_u16(), error = %message, "Token request failed");
            return Err(match status.as_u16() {
                400 | 401 => AuthError::Rejected {
                    status: status.as_u16(),
                    message,
                },
                code => AuthError::Failed(format!("token endpoint returned HTTP {}: {}", code, message)),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| AuthError::InvalidToken(format!("unreadable token response: {}", e)))?;

        let access_token = parsed
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidToken("token response has no access_token".into()))?;

        let expires_in = parsed.expires_in_secs();
        let expires_at = Instant::now()
            .checked_add(Duration::from_secs(expires_in))
            .ok_or_else(|| {
                AuthError::InvalidToken(format!("expires_in out of range: {}", expires_in))
            })?;
        info!(expires_in, "Obtained OAuth access token");

        Ok(CachedToken {
            access_token: SecretString::new(access_token),
            expires_at,
        })
    }

    fn timeout_error(&self) -> AuthError {
        AuthError::Timeout {
            timeout_secs: self.timeout.as_secs(),
        }
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn get_token(&self) -> Result<SecretString, AuthError> {
        let mut cache = self.cache.lock().await;

        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh(self.refresh_margin)) {
            return Ok(token.access_token.clone());
        }

        // On failure the previous entry stays in place
        let fresh = self.request_token().await?;
        let token = fresh.access_token.clone();
        *cache = Some(fresh);

        Ok(token)
    }

    async fn invalidate(&self) -> bool {
        self.cache.lock().await.take().is_some()
    }
}

/// Bearer authentication backed by a [`TokenProvider`]
#[derive(Clone)]
pub struct OAuthProvider {
    tokens: Arc<dyn TokenProvider>,
}

impl OAuthProvider {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl AuthProvider for OAuthProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        Ok(AuthHeader::Bearer(self.tokens.get_token().await?))
    }

    async fn invalidate(&self) -> bool {
        self.tokens.invalidate().await
    }

    fn auth_type(&self) -> &'static str {
        "OAuth 2.0"
    }
}

/// Pull a readable message out of an RFC 6749 error body
fn oauth_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        parsed
            .as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    field("error_description")
        .or_else(|| field("error"))
        .unwrap_or_else(|| {
            if body.is_empty() {
                "empty response".to_string()
            } else {
                body.chars().take(200).collect()
            }
        })
}
