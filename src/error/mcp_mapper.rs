//! MCP error code mapping.
//!
//! Maps application errors to MCP protocol errors with JSON-RPC error codes.
//!
//! # Strategy
//! - Protocol-level errors (unknown tool) → `Err(McpError)`
//! - Tool execution errors → `Ok(CallToolResult { is_error: true })`, with
//!   the mapped `data` as the result's structured content

use rmcp::ErrorData as McpError;
use rmcp::model::ErrorCode;
use serde_json::json;
use std::borrow::Cow;

use super::{AccessDeniedError, ServiceNowError, ToolError};

/// Maps a `ToolError` to an MCP protocol error.
pub fn map_tool_error(error: &ToolError) -> McpError {
    match error {
        ToolError::NotFound(name) => McpError {
            code: ErrorCode::METHOD_NOT_FOUND,
            message: Cow::Owned(format!("Tool '{}' not found", name)),
            data: Some(json!({
                "tool": name,
                "error_type": "ToolNotFound"
            })),
        },

        ToolError::InvalidArguments(msg) => McpError {
            code: ErrorCode::INVALID_PARAMS,
            message: Cow::Owned(msg.clone()),
            data: Some(json!({
                "error_type": "InvalidArguments"
            })),
        },

        ToolError::MissingArgument(arg) => McpError {
            code: ErrorCode::INVALID_PARAMS,
            message: Cow::Owned(format!("Missing required argument: {}", arg)),
            data: Some(json!({
                "argument": arg,
                "error_type": "MissingArgument"
            })),
        },

        ToolError::Serialization(e) => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(format!("Failed to serialize result: {}", e)),
            data: Some(json!({
                "error_type": "SerializationError"
            })),
        },

        ToolError::IncidentNotFound(id) => McpError {
            code: ErrorCode::RESOURCE_NOT_FOUND,
            message: Cow::Owned(error.to_string()),
            data: Some(json!({
                "error_type": "IncidentNotFound",
                "incident": id
            })),
        },

        ToolError::ServiceNow(err) => map_servicenow_error(err),

        ToolError::AccessDenied(access_err) => map_access_denied_error(access_err),
    }
}

/// Maps a `ServiceNowError` to an MCP protocol error.
pub fn map_servicenow_error(error: &ServiceNowError) -> McpError {
    match error {
        ServiceNowError::Unauthorized => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Borrowed("ServiceNow authentication failed"),
            data: Some(json!({
                "error_type": "Unauthorized",
                "hint": "Check the configured ServiceNow credentials"
            })),
        },

        ServiceNowError::Forbidden { message } => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(format!("Forbidden: {}", message)),
            data: Some(json!({
                "error_type": "Forbidden"
            })),
        },

        ServiceNowError::NotFound { resource } => McpError {
            code: ErrorCode::RESOURCE_NOT_FOUND,
            message: Cow::Owned(format!("Resource not found: {}", resource)),
            data: Some(json!({
                "error_type": "NotFound",
                "resource": resource
            })),
        },

        ServiceNowError::RateLimited { retry_after } => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(format!("Rate limited, retry after {} seconds", retry_after)),
            data: Some(json!({
                "error_type": "RateLimited",
                "retry_after": retry_after,
                "retryable": true
            })),
        },

        ServiceNowError::Auth(auth) => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(format!("Authentication failed: {}", auth)),
            data: Some(json!({
                "error_type": "AuthError",
                "retryable": auth.is_retryable()
            })),
        },

        ServiceNowError::Api { status, message } => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(format!("ServiceNow API error (HTTP {}): {}", status, message)),
            data: Some(json!({
                "error_type": "ApiError",
                "status": status
            })),
        },

        ServiceNowError::Request(e) => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(format!("HTTP request failed: {}", e)),
            data: Some(json!({
                "error_type": "RequestError",
                "retryable": true
            })),
        },

        ServiceNowError::InvalidResponse(msg) => McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::Owned(format!("Invalid response from ServiceNow: {}", msg)),
            data: Some(json!({
                "error_type": "InvalidResponse"
            })),
        },
    }
}

/// Maps an `AccessDeniedError` to an MCP protocol error.
pub fn map_access_denied_error(error: &AccessDeniedError) -> McpError {
    McpError {
        code: ErrorCode::INTERNAL_ERROR,
        message: Cow::Owned(error.to_string()),
        data: Some(json!({
            "error_type": "AccessDenied",
            "tool": error.tool,
            "reason": error.reason
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;

    #[test]
    fn test_map_tool_not_found() {
        let error = ToolError::NotFound("close_incident".into());
        let mcp_error = map_tool_error(&error);

        assert_eq!(mcp_error.code, ErrorCode::METHOD_NOT_FOUND);
        assert!(mcp_error.message.contains("close_incident"));
        assert!(mcp_error.data.is_some());
    }

    #[test]
    fn test_map_missing_argument() {
        let error = ToolError::MissingArgument("incident_id".into());
        let mcp_error = map_tool_error(&error);

        assert_eq!(mcp_error.code, ErrorCode::INVALID_PARAMS);
        assert!(mcp_error.message.contains("incident_id"));
    }

    #[test]
    fn test_map_incident_not_found() {
        let error = ToolError::IncidentNotFound("INC0000404".into());
        let mcp_error = map_tool_error(&error);

        assert_eq!(mcp_error.code, ErrorCode::RESOURCE_NOT_FOUND);
        assert_eq!(mcp_error.message, "Incident not found: INC0000404");
    }

    #[test]
    fn test_map_rate_limited() {
        let mcp_error = map_servicenow_error(&ServiceNowError::RateLimited { retry_after: 30 });

        assert!(mcp_error.message.contains("30"));
        assert_eq!(mcp_error.data.unwrap()["retry_after"], 30);
    }

    #[test]
    fn test_map_auth_error_reports_retryability() {
        let error = ServiceNowError::Auth(AuthError::Timeout { timeout_secs: 30 });
        let data = map_servicenow_error(&error).data.unwrap();
        assert_eq!(data["retryable"], true);

        let error = ServiceNowError::Auth(AuthError::Rejected {
            status: 401,
            message: "invalid_client".into(),
        });
        let data = map_servicenow_error(&error).data.unwrap();
        assert_eq!(data["retryable"], false);
    }

    #[test]
    fn test_map_access_denied() {
        let error = AccessDeniedError::new("resolve_incident", "write access required");
        let mcp_error = map_access_denied_error(&error);

        assert!(mcp_error.message.contains("resolve_incident"));
        assert_eq!(mcp_error.data.unwrap()["tool"], "resolve_incident");
    }
}
