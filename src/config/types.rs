//! Configuration types for servicenow-mcp
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::error::ConfigError;
use crate::util::SecretString;
use serde::Deserialize;
use std::collections::HashMap;

/// Default header carrying a ServiceNow REST API key
pub const DEFAULT_API_KEY_HEADER: &str = "x-sn-apikey";

/// Path of the OAuth token endpoint on a ServiceNow instance
pub const DEFAULT_TOKEN_PATH: &str = "/oauth_token.do";

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// ServiceNow instance settings
    pub servicenow: ServiceNowConfig,

    /// Server/transport settings
    pub server: ServerConfig,

    /// Access control rules
    pub access_control: AccessControlConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// ServiceNow instance configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceNowConfig {
    /// Instance URL (e.g., `https://dev12345.service-now.com`)
    pub instance_url: String,

    /// Authentication scheme (exactly one variant)
    pub auth: Option<AuthConfig>,

    /// Verbose logging of outbound requests
    pub debug: bool,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Whether to verify TLS certificates
    pub verify_ssl: bool,
}

impl Default for ServiceNowConfig {
    fn default() -> Self {
        Self {
            instance_url: String::new(),
            auth: None,
            debug: false,
            timeout_secs: 30,
            verify_ssl: true,
        }
    }
}

impl ServiceNowConfig {
    /// Instance URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.instance_url.trim_end_matches('/')
    }

    /// Table API URL for a table (e.g., `incident`)
    pub fn table_url(&self, table: &str) -> String {
        format!("{}/api/now/table/{}", self.base_url(), table)
    }
}

/// Authentication configuration
///
/// On disk this is a tagged table:
///
/// ```toml
/// [servicenow.auth]
/// type = "basic"
///
/// [servicenow.auth.basic]
/// username = "admin"
/// password = "..."
/// ```
///
/// Only the payload named by `type` is read; the others are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawAuthConfig")]
pub enum AuthConfig {
    ApiKey(ApiKeyConfig),
    Basic(BasicConfig),
    OAuth(OAuthConfig),
}

impl AuthConfig {
    /// Scheme name as written in configuration
    pub fn type_name(&self) -> &'static str {
        match self {
            AuthConfig::ApiKey(_) => "api_key",
            AuthConfig::Basic(_) => "basic",
            AuthConfig::OAuth(_) => "oauth",
        }
    }
}

/// Untyped form of [`AuthConfig`] as it appears in TOML and environment
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawAuthConfig {
    #[serde(rename = "type")]
    pub auth_type: Option<String>,
    pub api_key: Option<ApiKeyConfig>,
    pub basic: Option<BasicConfig>,
    pub oauth: Option<OAuthConfig>,
}

impl TryFrom<RawAuthConfig> for AuthConfig {
    type Error = ConfigError;

    fn try_from(raw: RawAuthConfig) -> Result<Self, Self::Error> {
        let auth_type = raw.auth_type.ok_or_else(|| ConfigError::Missing {
            field: "servicenow.auth.type".to_string(),
        })?;

        match auth_type.trim().to_ascii_lowercase().as_str() {
            "api_key" => {
                let config = raw.api_key.ok_or_else(|| missing("servicenow.auth.api_key"))?;
                if config.api_key.is_empty() {
                    return Err(missing("servicenow.auth.api_key.api_key"));
                }
                if config.header_name.trim().is_empty() {
                    return Err(missing("servicenow.auth.api_key.header_name"));
                }
                Ok(AuthConfig::ApiKey(config))
            }
            "basic" => {
                let config = raw.basic.ok_or_else(|| missing("servicenow.auth.basic"))?;
                if config.username.is_empty() {
                    return Err(missing("servicenow.auth.basic.username"));
                }
                Ok(AuthConfig::Basic(config))
            }
            "oauth" => {
                let config = raw.oauth.ok_or_else(|| missing("servicenow.auth.oauth"))?;
                if config.client_id.is_empty() {
                    return Err(missing("servicenow.auth.oauth.client_id"));
                }
                if config.username.is_some() != config.password.is_some() {
                    return Err(ConfigError::Invalid {
                        message: "servicenow.auth.oauth.username and password must be set together"
                            .to_string(),
                    });
                }
                Ok(AuthConfig::OAuth(config))
            }
            _ => Err(ConfigError::UnsupportedAuthType(auth_type)),
        }
    }
}

fn missing(field: &str) -> ConfigError {
    ConfigError::Missing {
        field: field.to_string(),
    }
}

/// API key authentication
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiKeyConfig {
    /// Header carrying the key
    #[serde(default = "default_api_key_header")]
    pub header_name: String,

    /// The API key (prefer env var SERVICENOW_API_KEY)
    ///
    /// Empty when only the header is configured; rejected once API key
    /// auth is selected.
    #[serde(default)]
    pub api_key: SecretString,
}

fn default_api_key_header() -> String {
    DEFAULT_API_KEY_HEADER.to_string()
}

/// HTTP basic authentication
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BasicConfig {
    pub username: String,
    pub password: SecretString,
}

/// OAuth 2.0 authentication against the instance token endpoint
///
/// With `username` and `password` set the password grant is used,
/// otherwise client credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,

    pub client_secret: SecretString,

    /// Token endpoint (default: `<instance_url>/oauth_token.do`)
    #[serde(default)]
    pub token_url: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<SecretString>,

    #[serde(default)]
    pub scope: Option<String>,

    /// Refresh this many seconds before the token expires
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin_secs: u64,

    /// Upper bound on a single token request
    #[serde(default = "default_token_timeout")]
    pub token_timeout_secs: u64,
}

fn default_refresh_margin() -> u64 {
    60
}

fn default_token_timeout() -> u64 {
    30
}

impl OAuthConfig {
    /// Resolve the token endpoint for an instance
    pub fn token_endpoint(&self, instance_url: &str) -> String {
        match &self.token_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => format!(
                "{}{}",
                instance_url.trim_end_matches('/'),
                DEFAULT_TOKEN_PATH
            ),
        }
    }
}

/// Server/transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Transport mode
    pub transport: TransportMode,

    /// HTTP host (for http transport)
    pub host: String,

    /// HTTP port (for http transport)
    pub port: u16,

    /// Server name for MCP
    pub name: String,

    /// Server version for MCP
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportMode::Stdio,
            host: "127.0.0.1".to_string(),
            port: 20390,
            name: "servicenow-mcp".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Transport mode selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Standard input/output (default)
    #[default]
    Stdio,
    /// Streamable HTTP
    Http,
}

/// Access control configuration
///
/// Precedence, highest first: per-tool `actions` override, `allow`
/// patterns, `deny` patterns, then the base `all` level.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AccessControlConfig {
    /// Base access level for all tools
    pub all: AccessLevel,

    /// Deny patterns (regex)
    pub deny: Vec<String>,

    /// Allow patterns (regex, can override deny)
    pub allow: Vec<String>,

    /// Individual tool overrides
    pub actions: HashMap<String, ActionPermission>,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            all: AccessLevel::Full,
            deny: Vec::new(),
            allow: Vec::new(),
            actions: HashMap::new(),
        }
    }
}

/// Base access level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// No tools
    None,
    /// Read-only tools (list, get)
    Read,
    /// All tools
    #[default]
    Full,
}

/// Individual action permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionPermission {
    /// Explicitly allow this action
    Allow,
    /// Explicitly deny this action
    Deny,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
