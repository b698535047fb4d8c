//! ServiceNow MCP Server
//!
//! A Model Context Protocol server for ServiceNow incident management.

use clap::Parser;
use servicenow_mcp::{
    access_control::AccessResolver,
    auth::HeaderResolver,
    config::{AppConfig, LogFormat, TransportMode, load_config},
    server::ServiceNowMcpHandler,
    servicenow::ServiceNowClient,
    transport::{DEFAULT_HTTP_PORT, HttpConfig, run_http_blocking, run_stdio},
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// ServiceNow MCP Server - incident management over MCP
#[derive(Parser, Debug)]
#[command(name = "servicenow-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "SERVICENOW_MCP_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "SERVICENOW_MCP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Transport mode (stdio, http)
    #[arg(long, env = "SERVICENOW_MCP_TRANSPORT")]
    transport: Option<String>,

    /// HTTP server host (for http transport)
    #[arg(long, env = "SERVICENOW_MCP_HTTP_HOST")]
    http_host: Option<String>,

    /// HTTP server port (for http transport)
    #[arg(long, env = "SERVICENOW_MCP_HTTP_PORT")]
    http_port: Option<u16>,
}

/// Initialize logging on stderr
///
/// `RUST_LOG` wins over the CLI flag, which wins over the config file.
/// `servicenow.debug` raises the config default to `debug`.
fn init_logging(args: &Args, config: &AppConfig) {
    let level = args.log_level.clone().unwrap_or_else(|| {
        if config.servicenow.debug {
            "debug".to_string()
        } else {
            config.logging.level.clone()
        }
    });

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&args, &config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        instance = %config.servicenow.base_url(),
        "Starting ServiceNow MCP server"
    );

    let headers = HeaderResolver::from_config(&config.servicenow)
        .inspect_err(|e| error!(error = %e, "Failed to create auth provider"))?;
    info!(auth_type = headers.auth_type(), "Authentication configured");

    let client = Arc::new(
        ServiceNowClient::new(&config.servicenow, headers)
            .inspect_err(|e| error!(error = %e, "Failed to create ServiceNow client"))?,
    );

    let access = Arc::new(
        AccessResolver::new(&config.access_control)
            .inspect_err(|e| error!(error = %e, "Failed to create access resolver"))?,
    );

    let transport = args
        .transport
        .as_deref()
        .map(|t| match t {
            "stdio" => TransportMode::Stdio,
            "http" => TransportMode::Http,
            _ => config.server.transport,
        })
        .unwrap_or(config.server.transport);

    match transport {
        TransportMode::Stdio => {
            let handler = ServiceNowMcpHandler::new_with_shared(&config, client, access);
            run_stdio(handler).await?;
        }
        TransportMode::Http => {
            let host = args.http_host.as_deref().unwrap_or(&config.server.host);
            let port = args.http_port.unwrap_or(match config.server.port {
                0 => DEFAULT_HTTP_PORT,
                port => port,
            });
            let http_config = HttpConfig::from_host_port(host, port)?;

            let config = Arc::new(config);
            run_http_blocking(
                move || ServiceNowMcpHandler::new_with_shared(&config, client.clone(), access.clone()),
                http_config,
            )
            .await?;
        }
    }

    Ok(())
}
