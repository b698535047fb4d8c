//! ServiceNow client integration tests using wiremock

use serde_json::{Value, json};
use servicenow_mcp::auth::{ApiKeyProvider, HeaderResolver};
use servicenow_mcp::config::{AuthConfig, OAuthConfig, ServiceNowConfig};
use servicenow_mcp::error::{AuthError, ServiceNowError};
use servicenow_mcp::servicenow::{IncidentRef, ServiceNowClient};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(mock_server: &MockServer) -> ServiceNowClient {
    let config = ServiceNowConfig {
        instance_url: mock_server.uri(),
        ..Default::default()
    };
    let provider = ApiKeyProvider::new("x-sn-apikey", "test-key".into()).unwrap();
    ServiceNowClient::new(&config, HeaderResolver::new(Arc::new(provider))).unwrap()
}

fn create_oauth_client(mock_server: &MockServer) -> ServiceNowClient {
    let config = ServiceNowConfig {
        instance_url: mock_server.uri(),
        auth: Some(AuthConfig::OAuth(OAuthConfig {
            client_id: "abc".to_string(),
            client_secret: "s3cret".into(),
            token_url: None,
            username: None,
            password: None,
            scope: None,
            refresh_margin_secs: 60,
            token_timeout_secs: 5,
        })),
        ..Default::default()
    };
    let headers = HeaderResolver::from_config(&config).unwrap();
    ServiceNowClient::new(&config, headers).unwrap()
}

#[tokio::test]
async fn test_get_sends_auth_and_json_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .and(query_param("sysparm_limit", "1"))
        .and(header("x-sn-apikey", "test-key"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"sys_id": "abc123", "number": "INC0010001"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let records: Vec<IncidentRef> = client.get("/incident?sysparm_limit=1").await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].sys_id, "abc123");
    assert_eq!(records[0].number, "INC0010001");
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/now/table/incident"))
        .and(body_json(json!({"short_description": "Printer on fire"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "result": {"sys_id": "new1", "number": "INC0010002"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let record: IncidentRef = client
        .post("/incident", &json!({"short_description": "Printer on fire"}))
        .await
        .unwrap();

    assert_eq!(record.number, "INC0010002");
}

#[tokio::test]
async fn test_not_found_error_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "No Record found", "detail": "Record doesn't exist or ACL restricts the record retrieval"},
            "status": "failure"
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.get::<Value>("/incident/missing").await.unwrap_err();

    match err {
        ServiceNowError::NotFound { resource } => assert!(resource.starts_with("No Record found")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.get::<Value>("/incident").await.unwrap_err();

    assert!(matches!(err, ServiceNowError::RateLimited { retry_after: 12 }));
}

#[tokio::test]
async fn test_unauthorized_with_static_credentials_is_not_resent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.get::<Value>("/incident").await.unwrap_err();

    assert!(matches!(err, ServiceNowError::Unauthorized));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.get::<Value>("/incident").await.unwrap_err();

    match err {
        ServiceNowError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_envelope_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"sys_id": "x"}])))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server);
    let err = client.get::<Vec<IncidentRef>>("/incident").await.unwrap_err();

    assert!(matches!(err, ServiceNowError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_oauth_token_used_for_table_requests() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth_token.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = create_oauth_client(&mock_server);
    assert_eq!(client.auth_type(), "OAuth 2.0");

    let first: Vec<IncidentRef> = client.get("/incident").await.unwrap();
    let second: Vec<IncidentRef> = client.get("/incident").await.unwrap();
    assert!(first.is_empty() && second.is_empty());
}

#[tokio::test]
async fn test_revoked_oauth_token_is_replaced_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth_token.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "revoked",
            "expires_in": 1800
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth_token.do"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .and(header("authorization", "Bearer revoked"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"sys_id": "abc123", "number": "INC0010001"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_oauth_client(&mock_server);
    let records: Vec<IncidentRef> = client.get("/incident").await.unwrap();

    assert_eq!(records[0].sys_id, "abc123");
}

#[tokio::test]
async fn test_token_failure_never_reaches_table_api() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth_token.do"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "access_denied",
            "error_description": "Client authentication failed"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/now/table/incident"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": []})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = create_oauth_client(&mock_server);
    let err = client.get::<Value>("/incident").await.unwrap_err();

    assert!(matches!(
        err,
        ServiceNowError::Auth(AuthError::Rejected { status: 401, .. })
    ));
}
