//! Streamable HTTP transport
//!
//! Serves MCP over streamable HTTP at `/mcp` using axum.

use crate::server::ServiceNowMcpHandler;
use axum::Router;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Default port for HTTP transport
pub const DEFAULT_HTTP_PORT: u16 = 20390;

/// Configuration for the HTTP server
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Address to bind to (e.g., "127.0.0.1:20390")
    pub bind: SocketAddr,
    /// Path of the MCP endpoint (default: "/mcp")
    pub mcp_path: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)),
            mcp_path: "/mcp".to_string(),
        }
    }
}

impl HttpConfig {
    /// Create a new HTTP config with the specified bind address
    pub fn new(bind: SocketAddr) -> Self {
        Self {
            bind,
            ..Default::default()
        }
    }

    /// Create config from host and port strings
    pub fn from_host_port(host: &str, port: u16) -> Result<Self, std::net::AddrParseError> {
        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        Ok(Self::new(addr))
    }
}

/// Handle to a running HTTP server
pub struct HttpServer {
    /// Address actually bound (port 0 resolves to a free port)
    pub local_addr: SocketAddr,
    /// Cancel to shut the server down
    pub ct: CancellationToken,
    /// Server task
    pub task: JoinHandle<()>,
}

/// Build the axum router serving MCP at `config.mcp_path`
pub fn router<F>(handler_factory: F, config: &HttpConfig) -> Router
where
    F: Fn() -> ServiceNowMcpHandler + Send + Sync + 'static,
{
    let service = StreamableHttpService::new(
        move || Ok(handler_factory()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );

    Router::new()
        .nest_service(&config.mcp_path, service)
        .layer(TraceLayer::new_for_http())
}

/// Start the MCP server using streamable HTTP transport
///
/// Each MCP session gets a handler from `handler_factory`.
pub async fn run_http<F>(handler_factory: F, config: HttpConfig) -> anyhow::Result<HttpServer>
where
    F: Fn() -> ServiceNowMcpHandler + Send + Sync + 'static,
{
    let listener = TcpListener::bind(config.bind).await?;
    let local_addr = listener.local_addr()?;
    let app = router(handler_factory, &config);

    info!(
        "ServiceNow MCP server listening on http://{}{}",
        local_addr, config.mcp_path
    );

    let ct = CancellationToken::new();
    let shutdown = ct.clone();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            error!(error = %e, "HTTP server error");
        }
    });

    Ok(HttpServer {
        local_addr,
        ct,
        task,
    })
}

/// Run the MCP server using HTTP transport and wait for shutdown
///
/// Stops on Ctrl+C.
pub async fn run_http_blocking<F>(handler_factory: F, config: HttpConfig) -> anyhow::Result<()>
where
    F: Fn() -> ServiceNowMcpHandler + Send + Sync + 'static,
{
    let server = run_http(handler_factory, config).await?;

    info!("Press Ctrl+C to stop the server");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        _ = server.ct.cancelled() => {
            info!("Server cancelled");
        }
    }

    server.ct.cancel();
    server.task.await?;

    info!("HTTP server stopped");
    Ok(())
}
