//! Stdio transport
//!
//! Runs the MCP server over standard input/output. Logs go to stderr.

use crate::server::ServiceNowMcpHandler;
use rmcp::ServiceExt;
use rmcp::transport::io::stdio;
use tracing::info;

/// Run the MCP server using stdio transport
pub async fn run_stdio(handler: ServiceNowMcpHandler) -> anyhow::Result<()> {
    info!(
        tools = handler.tool_count(),
        "Starting ServiceNow MCP server with stdio transport"
    );

    let server = handler.serve(stdio()).await?;
    let reason = server.waiting().await?;

    info!(?reason, "ServiceNow MCP server stopped");
    Ok(())
}
