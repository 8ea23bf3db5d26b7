use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::auth::{RefreshResponse, TokenPair};

use crate::credentials::Credentials;
use crate::error::ApiError;
use crate::jwt;

const REFRESH_PATH: &str = "users/token/refresh/";
const EXPIRY_LEEWAY_SECONDS: i64 = 10;

/// HTTP client for the clinic REST backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.api_endpoint(""),
        }
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Request without credentials (sign-in, registration).
    pub async fn public_request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, None, body.as_ref()).await?;
        Ok(Self::decode(response).await?)
    }

    /// Authenticated request with the refresh interceptor.
    ///
    /// An access token that is already past its `exp` is refreshed up front.
    /// A `401` triggers exactly one refresh and one retry; if the refresh itself
    /// is refused the session is over.
    pub async fn request<T>(
        &self,
        credentials: &Credentials,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let mut access = credentials.access_token().await;

        if jwt::is_expired(&access, EXPIRY_LEEWAY_SECONDS) {
            debug!("Access token expired before request to {}, refreshing", path);
            access = self.refresh(credentials, &access).await?;
        }

        let response = self.send(method.clone(), path, Some(&access), body.as_ref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(Self::decode(response).await?);
        }

        debug!("Backend answered 401 for {}, refreshing token", path);
        let access = self.refresh(credentials, &access).await?;

        let retried = self.send(method, path, Some(&access), body.as_ref()).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!("Request to {} still unauthorized after token refresh", path);
            return Err(ApiError::Unauthorized.into());
        }

        Ok(Self::decode(retried).await?)
    }

    /// Exchanges the refresh token for a new access token and stores it.
    ///
    /// `stale_access` is the token the caller was using; if another request
    /// has already rotated it, the fresh one is returned without a new exchange.
    async fn refresh(&self, credentials: &Credentials, stale_access: &str) -> Result<String, ApiError> {
        let mut tokens = credentials.lock_for_refresh().await;
        if tokens.access != stale_access {
            return Ok(tokens.access.clone());
        }

        let body = json!({ "refresh": tokens.refresh });
        let response = self.send(Method::POST, REFRESH_PATH, None, Some(&body)).await?;

        if !response.status().is_success() {
            warn!("Token refresh refused with status {}", response.status());
            return Err(ApiError::SessionExpired);
        }

        let refreshed: RefreshResponse = Self::decode(response).await?;
        let rotated = TokenPair {
            access: refreshed.access,
            refresh: refreshed.refresh.unwrap_or_else(|| tokens.refresh.clone()),
        };

        *tokens = rotated;
        debug!("Access token refreshed");
        Ok(tokens.access.clone())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        access_token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let url = self.endpoint(path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url);

        if let Some(token) = access_token {
            req = req.bearer_auth(token);
        }

        if let Some(body_data) = body {
            req = req.json(body_data);
        }

        Ok(req.send().await?)
    }

    async fn decode<T>(response: Response) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            let message = extract_message(&error_text);
            return Err(match status {
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => ApiError::Rejected { status, message },
            });
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::from_value(Value::Null)?);
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Pulls the human-readable part out of a backend error body.
fn extract_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    parsed
        .as_ref()
        .and_then(|value| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        })
        .or_else(|| parsed.as_ref().filter(|value| value.is_object()).map(Value::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
