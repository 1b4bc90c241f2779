//! Request gateway
//!
//! Every outbound API call passes through [`ApiClient::execute`]: the
//! current credential is attached, an expired-credential response joins
//! (or starts) the shared refresh episode, and the request is replayed once
//! with the new credential. A second expiry after that replay is returned
//! to the caller as [`ApiError::RetryExhausted`].

use std::sync::Arc;
use std::time::Duration;

use bookdesk_common::{CredentialStore, RefreshCoordinator};
use bookdesk_domain::constants::DEFAULT_EXPIRED_STATUS;
use bookdesk_domain::{ApiConfig, Credential, SessionConfig};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::errors::ApiError;
use crate::http::{HttpClient, HttpClientBuilder};

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "http://localhost:8080/api")
    pub base_url: String,
    /// Timeout for one transport attempt
    pub timeout: Duration,
    /// Transport attempts for idempotent requests
    pub max_attempts: usize,
    /// Status the server uses to signal an expired credential
    pub expired_status: StatusCode,
    pub user_agent: Option<String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        let api = ApiConfig::default();
        Self {
            timeout: api.request_timeout(),
            max_attempts: api.max_attempts,
            base_url: api.base_url,
            expired_status: StatusCode::UNAUTHORIZED,
            user_agent: None,
        }
    }
}

impl ApiClientConfig {
    /// Build from the loaded API and session sections
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if `expired_status` is not a valid HTTP
    /// status code.
    pub fn from_config(api: &ApiConfig, session: &SessionConfig) -> Result<Self, ApiError> {
        let expired_status = StatusCode::from_u16(session.expired_status).map_err(|_| {
            ApiError::Config(format!(
                "invalid expired status {} (default {DEFAULT_EXPIRED_STATUS})",
                session.expired_status
            ))
        })?;

        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            timeout: api.request_timeout(),
            max_attempts: api.max_attempts,
            expired_status,
            user_agent: api.user_agent.clone(),
        })
    }
}

/// A captured outbound call
///
/// Holds everything needed to resubmit the call after a refresh. The
/// gateway marks it retried before the replay, and a retried request is
/// never replayed again.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Value>,
    retried: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: HeaderMap::new(), body: None, retried: false }
    }

    /// Add a header; `Authorization` is always replaced by the gateway.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attach a JSON body
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if `body` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Client(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// `true` once the request has been replayed after a refresh.
    pub fn is_retried(&self) -> bool {
        self.retried
    }
}

/// Authenticated API client
pub struct ApiClient {
    http_client: HttpClient,
    config: ApiClientConfig,
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    ///
    /// * `config` - Client configuration
    /// * `store` - Credential store read at attach time
    /// * `coordinator` - Refresh episode coordinator shared with every
    ///   other client of the same session
    ///
    /// # Errors
    ///
    /// Returns error if the HttpClient cannot be created
    pub fn new(
        config: ApiClientConfig,
        store: Arc<CredentialStore>,
        coordinator: Arc<RefreshCoordinator>,
    ) -> Result<Self, ApiError> {
        let mut builder =
            HttpClientBuilder::default().timeout(config.timeout).max_attempts(config.max_attempts);
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {}", e)))?;

        Ok(Self { http_client, config, store, coordinator })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Send a request through the gateway and return the raw response
    ///
    /// Non-success statuses other than the expired status are returned
    /// unchanged; use the typed helpers to have them mapped to errors.
    ///
    /// # Errors
    ///
    /// - [`ApiError::RefreshDenied`] if the refresh this request waited on
    ///   failed (the session has ended)
    /// - [`ApiError::RetryExhausted`] if the replay was rejected as expired
    /// - Transport errors from the underlying HTTP client
    #[instrument(
        skip(self, request),
        fields(method = %request.method, path = %request.path, request_id = %Uuid::new_v4())
    )]
    pub async fn execute(&self, request: PendingRequest) -> Result<Response, ApiError> {
        let mut request = request;
        let mut credential = self.store.get();

        loop {
            let response = self.send_once(&request, credential.as_ref()).await?;
            let status = response.status();

            if status != self.config.expired_status {
                return Ok(response);
            }

            if request.retried {
                warn!(%status, "Credential rejected after refresh, giving up");
                return Err(ApiError::RetryExhausted { status: status.as_u16() });
            }

            request.retried = true;
            debug!(%status, "Credential expired, awaiting refresh");

            let fresh = self.coordinator.await_fresh(credential.as_ref()).await?;
            debug!(credential = %fresh, "Replaying request with refreshed credential");
            credential = Some(fresh);
        }
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self), fields(path = %path))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.call(PendingRequest::new(Method::GET, path)).await
    }

    /// Execute a POST request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn post<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        self.call(PendingRequest::new(Method::POST, path).json(body)?).await
    }

    /// Execute a PUT request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn put<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        self.call(PendingRequest::new(Method::PUT, path).json(body)?).await
    }

    /// Execute a PATCH request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self, body), fields(path = %path))]
    pub async fn patch<T: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        self.call(PendingRequest::new(Method::PATCH, path).json(body)?).await
    }

    /// Execute a DELETE request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    #[instrument(skip(self), fields(path = %path))]
    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R, ApiError> {
        self.call(PendingRequest::new(Method::DELETE, path)).await
    }

    async fn call<R: DeserializeOwned>(&self, request: PendingRequest) -> Result<R, ApiError> {
        let method = request.method.clone();
        let url = self.url(&request.path);
        let response = self.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_status_error(status, &url, body));
        }

        // Handle 204/205 No Content responses
        let result: R = if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            serde_json::from_value(Value::Null).map_err(|_| {
                ApiError::Client(format!(
                    "No content response ({}), but response type cannot be deserialized from empty body",
                    status.as_u16()
                ))
            })?
        } else {
            response
                .json()
                .await
                .map_err(|e| ApiError::Client(format!("Failed to parse response: {}", e)))?
        };

        info!(%method, url = %url, "API request successful");
        Ok(result)
    }

    async fn send_once(
        &self,
        request: &PendingRequest,
        credential: Option<&Credential>,
    ) -> Result<Response, ApiError> {
        let mut headers = request.headers.clone();
        headers.remove(AUTHORIZATION);
        if let Some(credential) = credential {
            let mut value = HeaderValue::from_str(&credential.bearer_header())
                .map_err(|_| ApiError::Client("credential is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = self
            .http_client
            .request(request.method.clone(), self.url(&request.path))
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(self.http_client.send(builder).await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn map_status_error(status: StatusCode, url: &str, body: String) -> ApiError {
        let message = if body.is_empty() {
            format!("{} returned status {}", url, status)
        } else {
            format!("{} returned status {}: {}", url, status, body)
        };

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            ApiError::Auth(message)
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            ApiError::RateLimit(message)
        } else if status.is_server_error() {
            ApiError::Server(message)
        } else if status.is_client_error() {
            ApiError::Client(message)
        } else {
            ApiError::Network(message)
        }
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    store: Option<Arc<CredentialStore>>,
    coordinator: Option<Arc<RefreshCoordinator>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the credential store
    pub fn store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the refresh coordinator
    pub fn coordinator(mut self, coordinator: Arc<RefreshCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let store =
            self.store.ok_or_else(|| ApiError::Config("Credential store not set".to_string()))?;
        let coordinator = self
            .coordinator
            .ok_or_else(|| ApiError::Config("Refresh coordinator not set".to_string()))?;

        ApiClient::new(config, store, coordinator)
    }
}
