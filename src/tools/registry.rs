//! Tool registry
//!
//! Manages the collection of available tools and their metadata.

use crate::access_control::{AccessDecision, OperationType};
use crate::error::{AccessDeniedError, ToolError};
use crate::tools::executor::{ToolContext, ToolExecutor, ToolInfo, ToolOutput};
// async_trait required for dyn-compatibility with Box<dyn ToolHandler>
use async_trait::async_trait;
use schemars::Schema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A registered tool with all its metadata
pub struct RegisteredTool {
    /// Tool name
    pub name: &'static str,
    /// Tool description
    pub description: &'static str,
    /// Operation type for access control
    pub operation: OperationType,
    /// JSON Schema for the tool's input
    pub input_schema: Schema,
    handler: Box<dyn ToolHandler>,
}

/// Internal trait for type-erased tool handling
#[async_trait]
trait ToolHandler: Send + Sync {
    /// Execute the tool with raw JSON arguments
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError>;
}

struct TypedToolHandler<T> {
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> TypedToolHandler<T> {
    fn new() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<T> ToolHandler for TypedToolHandler<T>
where
    T: ToolExecutor + DeserializeOwned + Send + Sync + 'static,
{
    async fn call(&self, ctx: &ToolContext, args: Value) -> Result<ToolOutput, ToolError> {
        let tool: T = serde_json::from_value(args).map_err(|e| {
            ToolError::InvalidArguments(format!("Failed to parse arguments: {}", e))
        })?;

        tool.execute(ctx).await
    }
}

/// Tool registry
///
/// Tools are kept sorted by name so listings are stable.
pub struct ToolRegistry {
    tools: BTreeMap<&'static str, RegisteredTool>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool
    pub fn register<T>(&mut self)
    where
        T: ToolExecutor
            + DeserializeOwned
            + schemars::JsonSchema
            + ToolInfo
            + Send
            + Sync
            + 'static,
    {
        let name = <T as ToolInfo>::name();
        let operation = <T as ToolInfo>::operation_type();

        let tool = RegisteredTool {
            name,
            description: <T as ToolInfo>::description(),
            operation,
            input_schema: schemars::schema_for!(T),
            handler: Box::new(TypedToolHandler::<T>::new()),
        };

        self.tools.insert(name, tool);
        debug!(name, operation = %operation, "Registered tool");
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    pub fn tool_names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().copied()
    }

    pub fn tools(&self) -> impl Iterator<Item = &RegisteredTool> {
        self.tools.values()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool by name
    ///
    /// The access policy is checked before the arguments are parsed, so a
    /// denied call never reaches the instance.
    #[instrument(skip(self, ctx, args), fields(tool = %name, request_id = %ctx.request_id))]
    pub async fn execute(
        &self,
        name: &str,
        ctx: &ToolContext,
        args: Value,
    ) -> Result<ToolOutput, ToolError> {
        let start = Instant::now();

        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        if let AccessDecision::Denied(reason) = ctx.access.check(name, tool.operation) {
            // Audit log
            warn!(
                tool = %name,
                operation = %tool.operation,
                reason = %reason,
                request_id = %ctx.request_id,
                "Access denied to tool"
            );
            return Err(ToolError::AccessDenied(AccessDeniedError::new(name, reason)));
        }

        let result = tool.handler.call(ctx, args).await;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(output) => info!(elapsed_ms, is_error = output.is_error, "Tool completed"),
            Err(e) => warn!(elapsed_ms, error = %e, "Tool failed"),
        }

        result
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_tool_not_found() {
        let registry = ToolRegistry::new();
        assert!(registry.get("nonexistent").is_none());
    }
}
