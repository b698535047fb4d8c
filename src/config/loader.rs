//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (SERVICENOW_MCP_*, `__` between nested keys)
//! 2. Conventional ServiceNow variables (SERVICENOW_INSTANCE_URL, SERVICENOW_API_KEY, ...)
//! 3. Configuration file (TOML)
//! 4. Default values

use crate::config::types::{AppConfig, AuthConfig, RawAuthConfig};
use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use reqwest::Url;
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "servicenow-mcp.toml",
    ".servicenow-mcp.toml",
    "~/.config/servicenow-mcp/config.toml",
    "/etc/servicenow-mcp/config.toml",
];

/// Prefix for structured environment overrides
const ENV_PREFIX: &str = "SERVICENOW_MCP";

/// Conventional variables and the keys they populate
const INSTANCE_ENV_VARS: &[(&str, &str)] = &[
    ("SERVICENOW_INSTANCE_URL", "servicenow.instance_url"),
    ("SERVICENOW_AUTH_TYPE", "servicenow.auth.type"),
    ("SERVICENOW_API_KEY", "servicenow.auth.api_key.api_key"),
    ("SERVICENOW_API_KEY_HEADER", "servicenow.auth.api_key.header_name"),
];

/// Load configuration from a TOML string (useful for testing)
///
/// Authentication may be omitted here; everything else is validated.
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config = deserialize(config)?;
    validate_config_relaxed(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Defaults come from serde defaults on AppConfig

    // 2. Configuration file
    if let Some(path) = config_path {
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Structured overrides, e.g. SERVICENOW_MCP_SERVICENOW__TIMEOUT_SECS
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. Conventional ServiceNow variables
    builder = apply_servicenow_env(builder)?;

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config = deserialize(config)?;
    validate_config(&app_config)?;

    Ok(app_config)
}

/// Map the conventional SERVICENOW_* variables onto configuration keys
///
/// A variable is skipped when the equivalent SERVICENOW_MCP_* variable is set,
/// so the structured form always wins.
fn apply_servicenow_env(
    mut builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    for (var, key) in INSTANCE_ENV_VARS {
        if let Some(value) = non_empty_env(var) {
            builder = override_unless_prefixed(builder, key, value)?;
        }
    }

    // An API key alone selects API key auth, unless a file says otherwise
    if non_empty_env("SERVICENOW_API_KEY").is_some() {
        builder = builder
            .set_default("servicenow.auth.type", "api_key")
            .map_err(|e| ConfigError::Load(e.to_string()))?;
    }

    let username = non_empty_env("SERVICENOW_USERNAME");
    let password = non_empty_env("SERVICENOW_PASSWORD");

    // Only complete payloads are written: a partial table would fail to
    // deserialize even when another auth type is selected.
    if let (Some(username), Some(password)) = (&username, &password) {
        builder = override_unless_prefixed(builder, "servicenow.auth.basic.username", username.clone())?;
        builder = override_unless_prefixed(builder, "servicenow.auth.basic.password", password.clone())?;
    }

    if let (Some(client_id), Some(client_secret)) = (
        non_empty_env("SERVICENOW_CLIENT_ID"),
        non_empty_env("SERVICENOW_CLIENT_SECRET"),
    ) {
        builder = override_unless_prefixed(builder, "servicenow.auth.oauth.client_id", client_id)?;
        builder =
            override_unless_prefixed(builder, "servicenow.auth.oauth.client_secret", client_secret)?;

        if let Some(token_url) = non_empty_env("SERVICENOW_TOKEN_URL") {
            builder = override_unless_prefixed(builder, "servicenow.auth.oauth.token_url", token_url)?;
        }
        if let (Some(username), Some(password)) = (username, password) {
            builder = override_unless_prefixed(builder, "servicenow.auth.oauth.username", username)?;
            builder = override_unless_prefixed(builder, "servicenow.auth.oauth.password", password)?;
        }
    }

    Ok(builder)
}

fn override_unless_prefixed(
    builder: ConfigBuilder<DefaultState>,
    key: &str,
    value: String,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    if non_empty_env(&prefixed_var(key)).is_some() {
        return Ok(builder);
    }
    builder
        .set_override(key, value)
        .map_err(|e| ConfigError::Load(e.to_string()))
}

/// SERVICENOW_MCP_* variable name for a dotted key
fn prefixed_var(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key.replace('.', "__").to_uppercase())
}

fn non_empty_env(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.is_empty())
}

/// Deserialize the merged sources into `AppConfig`
///
/// The auth table is converted on its own first so that an unknown auth
/// type surfaces as `ConfigError::UnsupportedAuthType` rather than as an
/// opaque deserialization message.
fn deserialize(config: Config) -> Result<AppConfig, ConfigError> {
    match config.get::<RawAuthConfig>("servicenow.auth") {
        Ok(raw) => {
            AuthConfig::try_from(raw)?;
        }
        Err(config::ConfigError::NotFound(_)) => {}
        Err(e) => return Err(ConfigError::Load(e.to_string())),
    }

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))
}

/// Validate configuration values (relaxed - authentication may be absent)
fn validate_config_relaxed(config: &AppConfig) -> Result<(), ConfigError> {
    validate_instance_url(&config.servicenow.instance_url)?;

    if config.servicenow.timeout_secs == 0 {
        return Err(ConfigError::Invalid {
            message: "servicenow.timeout_secs must be greater than 0".to_string(),
        });
    }

    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    validate_patterns(&config.access_control.deny, "access_control.deny")?;
    validate_patterns(&config.access_control.allow, "access_control.allow")?;

    Ok(())
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_config_relaxed(config)?;

    if config.servicenow.auth.is_none() {
        return Err(ConfigError::Missing {
            field: "servicenow.auth (set SERVICENOW_API_KEY or configure [servicenow.auth])"
                .to_string(),
        });
    }

    Ok(())
}

/// The instance URL must be a non-empty absolute http(s) URL with a host
fn validate_instance_url(url: &str) -> Result<(), ConfigError> {
    if url.is_empty() {
        return Err(ConfigError::Missing {
            field: "servicenow.instance_url (set SERVICENOW_INSTANCE_URL)".to_string(),
        });
    }

    let parsed = Url::parse(url).map_err(|e| ConfigError::Invalid {
        message: format!("servicenow.instance_url is not a valid URL ({}): {}", e, url),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ConfigError::Invalid {
            message: format!(
                "servicenow.instance_url must be an absolute http:// or https:// URL, got: {}",
                url
            ),
        });
    }

    Ok(())
}

/// Validate that all patterns are valid regex
fn validate_patterns(patterns: &[String], field_path: &str) -> Result<(), ConfigError> {
    for pattern in patterns {
        if let Err(e) = regex::Regex::new(pattern) {
            return Err(ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason: format!("in {}: {}", field_path, e),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessLevel, AuthConfig};

    #[test]
    fn test_load_config_from_str_basic_auth() {
        let toml = r#"
[servicenow]
instance_url = "https://dev1.service-now.com"

[servicenow.auth]
type = "basic"

[servicenow.auth.basic]
username = "alice"
password = "wonderland"
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.servicenow.instance_url, "https://dev1.service-now.com");
        match config.servicenow.auth {
            Some(AuthConfig::Basic(basic)) => {
                assert_eq!(basic.username, "alice");
                assert_eq!(basic.password.expose_secret(), "wonderland");
            }
            other => panic!("unexpected auth: {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_auth_type_is_typed() {
        let toml = r#"
[servicenow]
instance_url = "https://dev1.service-now.com"

[servicenow.auth]
type = "kerberos"
"#;

        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedAuthType(ref t) if t == "kerberos"));
    }

    #[test]
    fn test_invalid_url_error() {
        let toml = r#"
[servicenow]
instance_url = "dev1.service-now.com"
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_empty_url_error() {
        let toml = r#"
[servicenow]
instance_url = ""
"#;
        assert!(matches!(
            load_config_from_str(toml),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_invalid_regex_pattern() {
        let config = AppConfig {
            servicenow: crate::config::ServiceNowConfig {
                instance_url: "https://dev1.service-now.com".to_string(),
                ..Default::default()
            },
            access_control: crate::config::AccessControlConfig {
                deny: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            validate_config_relaxed(&config),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_full_validation_requires_auth() {
        let config = AppConfig {
            servicenow: crate::config::ServiceNowConfig {
                instance_url: "https://dev1.service-now.com".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(validate_config_relaxed(&config).is_ok());
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_read_only_policy() {
        let toml = r#"
[servicenow]
instance_url = "https://dev1.service-now.com"

[access_control]
all = "read"
deny = ["^get_incident_by_date$"]
"#;

        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.access_control.all, AccessLevel::Read);
        assert_eq!(config.access_control.deny, vec!["^get_incident_by_date$"]);
    }

    #[test]
    fn test_prefixed_var_name() {
        assert_eq!(
            prefixed_var("servicenow.auth.api_key.api_key"),
            "SERVICENOW_MCP_SERVICENOW__AUTH__API_KEY__API_KEY"
        );
    }
}
