//! Session transport
//!
//! The only client that talks to the `/auth/*` endpoints. It owns a cookie
//! jar: the server sets the long-lived session proof as a cookie on login
//! and it rides along on every refresh and logout. The proof never leaves
//! this transport and is never attached to ordinary API calls. Logout
//! empties the jar whether or not the server answered.

use std::sync::Arc;

use async_trait::async_trait;
use bookdesk_common::{RefreshDenied, RefreshTransport};
use bookdesk_domain::{ApiConfig, Credential, SessionConfig};
use reqwest::{Method, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use crate::http::{HttpClient, HttpClientBuilder, SessionCookies};

/// Token response shared by the login and refresh endpoints
#[derive(Debug, Deserialize)]
struct TokenPayload {
    #[serde(rename = "accessToken", alias = "access_token", alias = "token")]
    access_token: Option<String>,
}

impl TokenPayload {
    fn into_credential(self) -> Option<Credential> {
        self.access_token.map(Credential::new).filter(|credential| !credential.is_blank())
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Cookie-carrying transport for login, refresh and logout
pub struct SessionTransport {
    http_client: HttpClient,
    cookies: Arc<SessionCookies>,
    base_url: String,
    config: SessionConfig,
}

impl SessionTransport {
    /// Create a transport with its own cookie jar
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the HTTP client cannot be created
    pub fn new(api: &ApiConfig, session: &SessionConfig) -> Result<Self, ApiError> {
        let cookies = Arc::new(SessionCookies::new());
        let http_client = HttpClientBuilder::from_config(api)
            .cookie_jar(Arc::clone(&cookies))
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build session transport: {}", e)))?;

        Ok(Self {
            http_client,
            cookies,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            config: session.clone(),
        })
    }

    /// Exchange username and password for a credential
    ///
    /// The server's proof cookie is kept in this transport's jar.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Auth`] with the server's message on a non-2xx answer
    /// - [`ApiError::Client`] if the response carries no credential
    /// - Transport errors
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        let request = self
            .http_client
            .request(Method::POST, self.url(&self.config.login_path))
            .json(&LoginRequest { username, password });
        let response = self.http_client.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let message = server_message(response).await;
            warn!(%status, "Login rejected");
            return Err(ApiError::Auth(format!("login rejected with status {}: {}", status, message)));
        }

        let payload: TokenPayload = response
            .json()
            .await
            .map_err(|e| ApiError::Client(format!("Failed to parse login response: {}", e)))?;
        let credential = payload
            .into_credential()
            .ok_or_else(|| ApiError::Client("login response carried no access token".into()))?;

        info!(credential = %credential, "Login accepted");
        Ok(credential)
    }

    /// Tell the server to invalidate the session proof, then drop it
    ///
    /// The jar is emptied even when the server call fails, so no later
    /// refresh can present the old proof.
    ///
    /// # Errors
    ///
    /// Returns the transport error or [`ApiError::Server`] for a non-2xx
    /// answer. Callers treat logout as best-effort.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self.invalidate_proof().await;
        self.cookies.clear();
        debug!("Session proof dropped");
        result
    }

    /// `true` while a session proof is held for the refresh endpoint.
    pub fn holds_proof(&self) -> bool {
        self.url(&self.config.refresh_path)
            .parse::<reqwest::Url>()
            .is_ok_and(|url| self.cookies.has_cookies_for(&url))
    }

    async fn invalidate_proof(&self) -> Result<(), ApiError> {
        let request = self.http_client.request(Method::POST, self.url(&self.config.logout_path));
        let response = self.http_client.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let message = server_message(response).await;
            return Err(ApiError::Server(format!("logout returned status {}: {}", status, message)));
        }

        debug!("Server session invalidated");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl RefreshTransport for SessionTransport {
    async fn exchange(&self) -> Result<Credential, RefreshDenied> {
        let request = self.http_client.request(Method::POST, self.url(&self.config.refresh_path));
        let response = self
            .http_client
            .send(request)
            .await
            .map_err(|e| RefreshDenied::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = server_message(response).await;
            return Err(RefreshDenied::Rejected { status: status.as_u16(), detail });
        }

        let payload: TokenPayload = response
            .json()
            .await
            .map_err(|e| RefreshDenied::Malformed(e.to_string()))?;

        payload
            .into_credential()
            .ok_or_else(|| RefreshDenied::Malformed("response carried no access token".into()))
    }
}

/// Best human-readable message from an error response body
async fn server_message(response: Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&body) {
        Ok(Value::Object(map)) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map_or(body.clone(), str::to_string),
        _ => body,
    }
}
