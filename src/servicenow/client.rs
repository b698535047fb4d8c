//! ServiceNow API client
//!
//! Thin wrapper over the Table API. Every request carries the headers
//! produced by the [`HeaderResolver`]; responses are unwrapped from the
//! `{"result": ...}` envelope.

use crate::auth::HeaderResolver;
use crate::config::ServiceNowConfig;
use crate::error::{ServiceNowError, ServiceNowResult};
use crate::servicenow::types::Envelope;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// ServiceNow Table API client
pub struct ServiceNowClient {
    http: Client,
    base_url: String,
    headers: HeaderResolver,
    debug: bool,
}

impl ServiceNowClient {
    /// Create a new client from configuration
    pub fn new(config: &ServiceNowConfig, headers: HeaderResolver) -> ServiceNowResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .user_agent(format!("servicenow-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ServiceNowError::Request)?;

        Ok(Self {
            http,
            base_url: config.table_url("").trim_end_matches('/').to_string(),
            headers,
            debug: config.debug,
        })
    }

    /// Build a URL for a Table API endpoint (e.g., `/incident?sysparm_limit=1`)
    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// Auth scheme in use, for logging
    pub fn auth_type(&self) -> &'static str {
        self.headers.auth_type()
    }

    /// Send one request
    ///
    /// Requests are not retried. The only exception is a single re-send after
    /// HTTP 401 when the auth provider dropped a cached token, so a revoked
    /// OAuth token is replaced instead of failing every call until it expires.
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> ServiceNowResult<Response> {
        let response = self.send(method.clone(), endpoint, body).await?;

        if response.status() == StatusCode::UNAUTHORIZED && self.headers.invalidate().await {
            warn!(endpoint, "Credentials rejected, retrying with a fresh token");
            let response = self.send(method, endpoint, body).await?;
            return self.handle_response(response).await;
        }

        self.handle_response(response).await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> ServiceNowResult<Response> {
        let headers = self.headers.resolve().await?;
        let mut request = self.http.request(method, self.url(endpoint)).headers(headers);

        if let Some(body) = body {
            if self.debug {
                debug!(
                    body = %serde_json::to_string(body).unwrap_or_default(),
                    "Request body"
                );
            }
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Handle API response
    async fn handle_response(&self, response: Response) -> ServiceNowResult<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(60);
            return Err(ServiceNowError::RateLimited { retry_after });
        }

        let body = response.text().await.unwrap_or_default();
        if self.debug {
            debug!(status = status.as_u16(), body = %body, "Error response");
        }

        Err(ServiceNowError::from_response(status.as_u16(), &body))
    }

    /// Read the `result` member of a successful response
    async fn parse<T: DeserializeOwned>(&self, response: Response) -> ServiceNowResult<T> {
        let text = response.text().await?;
        if self.debug {
            debug!(body = %text, "Response body");
        }

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            ServiceNowError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(envelope.result)
    }

    /// Make a GET request
    #[instrument(skip(self), fields(endpoint = %endpoint))]
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ServiceNowResult<T> {
        let response = self
            .execute::<()>(Method::GET, endpoint, None)
            .await?;
        self.parse(response).await
    }

    /// Make a POST request
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ServiceNowResult<T> {
        let response = self.execute(Method::POST, endpoint, Some(body)).await?;
        self.parse(response).await
    }

    /// Make a PUT request
    #[instrument(skip(self, body), fields(endpoint = %endpoint))]
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ServiceNowResult<T> {
        let response = self.execute(Method::PUT, endpoint, Some(body)).await?;
        self.parse(response).await
    }

    /// URL-encode a path segment (sys_id, table name)
    pub fn encode_segment(segment: &str) -> String {
        urlencoding::encode(segment).into_owned()
    }
}

impl std::fmt::Debug for ServiceNowClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceNowClient")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .finish()
    }
}
