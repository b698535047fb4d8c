//! Tool execution framework
//!
//! Every tool is a typed argument struct implementing [`ToolExecutor`].
//! The registry deserializes the MCP arguments into that struct and hands
//! it a [`ToolContext`].

use crate::access_control::{AccessResolver, OperationType};
use crate::error::ToolError;
use crate::servicenow::ServiceNowClient;
// async_trait keeps ToolExecutor usable behind the registry's trait objects
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// Per-call context passed to tools
#[derive(Clone)]
pub struct ToolContext {
    /// ServiceNow client
    pub client: Arc<ServiceNowClient>,
    /// Access control resolver
    pub access: Arc<AccessResolver>,
    /// Request ID for tracing and audit logs
    pub request_id: String,
}

impl ToolContext {
    pub fn new(
        client: Arc<ServiceNowClient>,
        access: Arc<AccessResolver>,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            access,
            request_id: request_id.into(),
        }
    }
}

/// Static tool metadata, generated by `#[incident_tool]`
pub trait ToolInfo {
    fn name() -> &'static str;
    fn description() -> &'static str;
    fn operation_type() -> OperationType;
}

/// Tool behavior
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, ctx: &ToolContext) -> Result<ToolOutput, ToolError>;
}

/// Content produced by a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    Text { text: String },
}

/// Tool result
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful plain-text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Successful result holding pretty-printed JSON
    pub fn json_value<T: Serialize>(value: T) -> Result<Self, ToolError> {
        Ok(Self::text(serde_json::to_string_pretty(&value)?))
    }

    /// First text block, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().map(|ContentBlock::Text { text }| text.as_str()).next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_output() {
        let output = ToolOutput::json_value(json!({"success": true})).unwrap();
        assert!(!output.is_error);
        let parsed: serde_json::Value =
            serde_json::from_str(output.first_text().unwrap()).unwrap();
        assert_eq!(parsed["success"], true);
    }

    #[test]
    fn test_text_output() {
        let output = ToolOutput::text("Incident not found: INC0000001");
        assert!(!output.is_error);
        assert_eq!(output.first_text(), Some("Incident not found: INC0000001"));
    }
}
