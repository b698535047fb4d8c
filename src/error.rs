//! Error types for servicenow-mcp
//!
//! This module defines the error hierarchy used throughout the application.
//! We use `thiserror` for library-style errors that are part of the API,
//! and convert to MCP error responses at the boundary.

pub mod mcp_mapper;

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("ServiceNow API error: {0}")]
    ServiceNow(#[from] ServiceNowError),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),

    #[error("Tool execution error: {0}")]
    Tool(#[from] ToolError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

/// Configuration-related errors
///
/// These are fatal: they are reported at startup, before any request
/// reaches the instance, and are never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("unsupported authentication type: {0}")]
    UnsupportedAuthType(String),

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },
}

/// ServiceNow API specific errors
#[derive(Error, Debug)]
pub enum ServiceNowError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("ServiceNow API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Unauthorized: credentials were rejected by the instance")]
    Unauthorized,

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Invalid response from ServiceNow: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

impl ServiceNowError {
    /// Create an appropriate error from an HTTP status code and response body
    ///
    /// ServiceNow reports failures as `{"error": {"message": ..., "detail": ...}}`;
    /// the message is surfaced when present.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_error_message(body);

        match status {
            401 => ServiceNowError::Unauthorized,
            403 => ServiceNowError::Forbidden {
                message: message.unwrap_or_else(|| "insufficient permissions".into()),
            },
            404 => ServiceNowError::NotFound {
                resource: message.unwrap_or_else(|| "requested resource".into()),
            },
            429 => ServiceNowError::RateLimited { retry_after: 60 },
            _ => ServiceNowError::Api {
                status,
                message: message.unwrap_or_else(|| {
                    if body.is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        body.to_string()
                    }
                }),
            },
        }
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    let message = error.get("message").and_then(|m| m.as_str())?;

    match error.get("detail").and_then(|d| d.as_str()) {
        Some(detail) if !detail.is_empty() => Some(format!("{}: {}", message, detail)),
        _ => Some(message.to_string()),
    }
}

/// Access control errors
#[derive(Error, Debug)]
#[error("Access denied for tool '{tool}': {reason}")]
pub struct AccessDeniedError {
    pub tool: String,
    pub reason: String,
}

impl AccessDeniedError {
    pub fn new(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(String),

    #[error("ServiceNow API error: {0}")]
    ServiceNow(#[from] ServiceNowError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Incident not found: {0}")]
    IncidentNotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(#[from] AccessDeniedError),
}

/// Authentication errors
///
/// Raised while producing credentials for a request. Unlike [`ConfigError`],
/// some of these are transient; see [`AuthError::is_retryable`].
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No authentication configured")]
    NotConfigured,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token endpoint rejected the credentials (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Token request timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Token request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Failed(String),
}

impl AuthError {
    /// Whether a later attempt could succeed without a configuration change
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Timeout { .. } | AuthError::Request(_) => true,
            AuthError::Failed(_) => true,
            AuthError::NotConfigured | AuthError::InvalidToken(_) | AuthError::Rejected { .. } => {
                false
            }
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for ServiceNow API operations
pub type ServiceNowResult<T> = std::result::Result<T, ServiceNowError>;
