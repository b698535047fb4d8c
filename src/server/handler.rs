//! MCP server handler
//!
//! Implements the MCP protocol handler for the ServiceNow incident tools.

use crate::access_control::AccessResolver;
use crate::config::AppConfig;
use crate::error::ToolError;
use crate::error::mcp_mapper::map_tool_error;
use crate::servicenow::ServiceNowClient;
use crate::tools::{ContentBlock, ToolContext, ToolOutput, ToolRegistry, definitions};
use rmcp::ErrorData as McpError;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, InitializeResult,
    ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities, Tool,
    ToolsCapability,
};
use rmcp::service::{RequestContext, RoleServer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Prefix marking tools the access policy denies outright
pub const UNAVAILABLE_PREFIX: &str = "UNAVAILABLE: ";

/// ServiceNow MCP server handler
#[derive(Clone)]
pub struct ServiceNowMcpHandler {
    /// Server name for MCP
    name: String,
    /// Server version
    version: String,
    registry: Arc<ToolRegistry>,
    client: Arc<ServiceNowClient>,
    access: Arc<AccessResolver>,
}

impl ServiceNowMcpHandler {
    /// Create a new handler from configuration
    pub fn new(config: &AppConfig, client: ServiceNowClient, access: AccessResolver) -> Self {
        Self::new_with_shared(config, Arc::new(client), Arc::new(access))
    }

    /// Create a new handler with shared (Arc-wrapped) resources
    ///
    /// The HTTP transport builds one handler per session; they all share
    /// the client (and its OAuth token cache) and the access resolver.
    pub fn new_with_shared(
        config: &AppConfig,
        client: Arc<ServiceNowClient>,
        access: Arc<AccessResolver>,
    ) -> Self {
        let mut registry = ToolRegistry::new();
        definitions::register_all_tools(&mut registry);

        info!(tools = registry.len(), "Initialized ServiceNow MCP handler");

        Self {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
            registry: Arc::new(registry),
            client,
            access,
        }
    }

    /// Get the number of registered tools
    pub fn tool_count(&self) -> usize {
        self.registry.len()
    }

    fn create_context(&self, request_id: &str) -> ToolContext {
        ToolContext::new(self.client.clone(), self.access.clone(), request_id)
    }

    /// Convert internal tool output to MCP result
    fn to_mcp_result(output: ToolOutput) -> CallToolResult {
        let content = output
            .content
            .into_iter()
            .map(|ContentBlock::Text { text }| Content::text(text))
            .collect();

        CallToolResult {
            content,
            is_error: Some(output.is_error),
            meta: None,
            structured_content: None,
        }
    }

    /// Convert registry tools to MCP tool definitions
    ///
    /// Tools the policy denies get their description prefixed with
    /// [`UNAVAILABLE_PREFIX`].
    pub fn mcp_tools(&self) -> Vec<Tool> {
        self.registry
            .tools()
            .map(|tool| {
                let schema_value = serde_json::to_value(&tool.input_schema)
                    .unwrap_or_else(|_| serde_json::json!({}));

                let mut input_schema: Map<String, Value> = Map::new();
                input_schema.insert("type".to_string(), Value::String("object".to_string()));
                if let Some(props) = schema_value.get("properties") {
                    input_schema.insert("properties".to_string(), props.clone());
                }
                if let Some(required) = schema_value.get("required") {
                    input_schema.insert("required".to_string(), required.clone());
                }

                let description = if self.access.is_globally_denied(tool.name, tool.operation) {
                    format!("{}{}", UNAVAILABLE_PREFIX, tool.description)
                } else {
                    tool.description.to_string()
                };

                Tool {
                    name: Cow::Borrowed(tool.name),
                    description: Some(Cow::Owned(description)),
                    input_schema: Arc::new(input_schema),
                    annotations: None,
                    icons: None,
                    meta: None,
                    output_schema: None,
                    title: None,
                }
            })
            .collect()
    }

    /// Execute a tool call
    ///
    /// An unknown tool is a protocol error; every other failure is reported
    /// as an error result so the session continues. Error results carry the
    /// mapped error details (`error_type`, `retryable`, ...) as structured
    /// content.
    pub async fn execute_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> Result<CallToolResult, McpError> {
        let request_id = format!("{:x}", rand::random::<u64>());
        let ctx = self.create_context(&request_id);

        let args = arguments
            .map(Value::Object)
            .unwrap_or_else(|| serde_json::json!({}));

        match self.registry.execute(name, &ctx, args).await {
            Ok(output) => Ok(Self::to_mcp_result(output)),
            Err(e @ ToolError::NotFound(_)) => Err(map_tool_error(&e)),
            Err(e) => {
                error!(error = %e, request_id = %request_id, "Tool execution failed");
                Ok(CallToolResult {
                    content: vec![Content::text(format!("Error: {}", e))],
                    is_error: Some(true),
                    meta: None,
                    structured_content: map_tool_error(&e).data,
                })
            }
        }
    }
}

impl ServerHandler for ServiceNowMcpHandler {
    fn get_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            server_info: Implementation {
                name: self.name.clone(),
                version: self.version.clone(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(format!(
                "ServiceNow MCP Server - create, update, comment on, resolve and look up incidents ({} auth)",
                self.client.auth_type()
            )),
        }
    }

    #[instrument(skip(self, _context))]
    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        debug!("Listing tools");
        async move {
            Ok(ListToolsResult {
                tools: self.mcp_tools(),
                next_cursor: None,
                meta: None,
            })
        }
    }

    #[instrument(skip(self, _context), fields(tool = %request.name))]
    fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> impl Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        debug!(?request.arguments, "Calling tool");
        async move { self.execute_tool(&request.name, request.arguments).await }
    }
}
