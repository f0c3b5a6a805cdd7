//! HTTP client for the SkillForge API.
//!
//! Wraps a `reqwest::Client` with the configured base URL and the bearer
//! token installed by the session manager, and maps HTTP failures onto
//! [`ApiError`].

use std::sync::RwLock;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::types::errors::ApiError;
use crate::types::settings::ClientSettings;

/// Shared API client. One instance per signed-in user session.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: RwLock<Option<String>>,
}

impl ApiClient {
    /// Builds a client from settings. Falls back to a default `reqwest::Client`
    /// if the configured one cannot be built.
    pub fn new(settings: &ClientSettings) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            token: RwLock::new(None),
        }
    }

    /// Client pointed at an arbitrary base URL with default timeouts.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let settings = ClientSettings {
            api_base_url: base_url.into(),
            ..ClientSettings::default()
        };
        Self::new(&settings)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Installs or removes the bearer token sent with every request.
    pub fn set_bearer_token(&self, token: Option<String>) {
        let mut guard = match self.token.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = token;
    }

    pub fn has_token(&self) -> bool {
        let guard = match self.token.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.is_some()
    }

    fn bearer_token(&self) -> Option<String> {
        let guard = match self.token.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }

    /// Starts a request to `path` (relative to the base URL) with auth attached.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.http.request(method, url);
        match self.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Starts a request whose path is the base URL followed by `segments`.
    ///
    /// Each segment is percent-encoded as a single path segment, so `/`, `?`
    /// and `%` inside a segment never change which endpoint is addressed.
    pub(crate) fn request_segments(
        &self,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder, ApiError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ApiError::Network(format!("invalid api base url: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Network(format!("api base url cannot hold a path: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        let builder = self.http.request(method, url);
        Ok(match self.bearer_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Sends a request and returns its JSON body, mapping failure statuses to errors.
    ///
    /// An empty success body is returned as `Value::Null`.
    pub(crate) async fn send_json(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "api request failed to send");
            ApiError::Network(e.to_string())
        })?;

        let status = response.status();
        let url = response.url().path().to_string();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            match serde_json::from_str(&text) {
                Ok(v) => v,
                Err(e) if status.is_success() => return Err(ApiError::Decode(e.to_string())),
                Err(_) => Value::Null,
            }
        };

        debug!(%status, path = %url, "api response");

        if status.is_success() {
            return Ok(body);
        }

        let message = error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            _ => ApiError::Server {
                status: status.as_u16(),
                message,
            },
        })
    }
}

/// Extracts the server's human-readable failure text, if any.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    body.get("error")
        .or_else(|| body.get("message"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Deserializes an optional field of a response body.
pub(crate) fn field<T: DeserializeOwned>(body: &Value, key: &str) -> Result<Option<T>, ApiError> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|e| ApiError::Decode(format!("field '{}': {}", key, e))),
    }
}
