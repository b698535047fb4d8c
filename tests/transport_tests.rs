//! Transport layer tests
//!
//! HTTP configuration plus a live streamable HTTP round trip.

use servicenow_mcp::access_control::AccessResolver;
use servicenow_mcp::auth::{BasicProvider, HeaderResolver};
use servicenow_mcp::config::{AppConfig, ServiceNowConfig};
use servicenow_mcp::server::ServiceNowMcpHandler;
use servicenow_mcp::servicenow::ServiceNowClient;
use servicenow_mcp::transport::{DEFAULT_HTTP_PORT, HttpConfig, run_http};
use std::net::SocketAddr;
use std::sync::Arc;

#[test]
fn test_http_config_default() {
    let config = HttpConfig::default();

    assert_eq!(config.bind, SocketAddr::from(([127, 0, 0, 1], DEFAULT_HTTP_PORT)));
    assert_eq!(config.mcp_path, "/mcp");
}

#[test]
fn test_http_config_new() {
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let config = HttpConfig::new(addr);

    assert_eq!(config.bind, addr);
    assert_eq!(config.mcp_path, "/mcp");
}

#[test]
fn test_http_config_from_host_port() {
    let config = HttpConfig::from_host_port("127.0.0.1", 9000).unwrap();

    assert_eq!(config.bind.port(), 9000);
    assert_eq!(config.bind.ip().to_string(), "127.0.0.1");
}

#[test]
fn test_http_config_from_host_port_ipv6() {
    // IPv6 addresses need brackets
    let config = HttpConfig::from_host_port("[::1]", 8080).unwrap();

    assert_eq!(config.bind.port(), 8080);
    assert!(config.bind.ip().is_ipv6());
}

#[test]
fn test_http_config_from_host_port_invalid() {
    assert!(HttpConfig::from_host_port("not-an-ip", 8080).is_err());
}

fn handler_factory() -> impl Fn() -> ServiceNowMcpHandler + Send + Sync + 'static {
    let config = AppConfig {
        servicenow: ServiceNowConfig {
            instance_url: "https://dev1.service-now.com".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    let provider = BasicProvider::new("admin", &"admin".into()).unwrap();
    let client = Arc::new(
        ServiceNowClient::new(&config.servicenow, HeaderResolver::new(Arc::new(provider))).unwrap(),
    );
    let access = Arc::new(AccessResolver::allow_all());

    move || ServiceNowMcpHandler::new_with_shared(&config, client.clone(), access.clone())
}

#[tokio::test]
async fn test_http_server_initialize() {
    let server = run_http(
        handler_factory(),
        HttpConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))),
    )
    .await
    .unwrap();
    assert_ne!(server.local_addr.port(), 0);

    let initialize = serde_json::json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "transport-test", "version": "0.0.1"}
        }
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/mcp", server.local_addr))
        .header("accept", "application/json, text/event-stream")
        .json(&initialize)
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("mcp-session-id"));
    drop(response);

    server.ct.cancel();
}

#[tokio::test]
async fn test_http_server_unknown_path() {
    let server = run_http(
        handler_factory(),
        HttpConfig::new(SocketAddr::from(([127, 0, 0, 1], 0))),
    )
    .await
    .unwrap();

    let response = reqwest::Client::new()
        .get(format!("http://{}/sse", server.local_addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    drop(response);

    server.ct.cancel();
    server.task.await.unwrap();
}
