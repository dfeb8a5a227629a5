//! HTTP client for the Clash of Clans API
//!
//! Thin boundary over reqwest: injects the bearer credential, enforces the
//! request timeout, and maps upstream HTTP statuses onto the typed
//! [`ApiError`]. No caching and no retries happen here; callers decide what a
//! failure means for their resource.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Production endpoint of the Clash of Clans API
pub const DEFAULT_BASE_URL: &str = "https://api.clashofclans.com/v1";

/// Upper bound on any single request, including the response body
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors surfaced by the API boundary
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API token is configured; detected before any request is issued
    #[error("API token is not configured")]
    MissingToken,

    /// Upstream returned 404 for this path
    #[error("resource not found: {path}")]
    NotFound { path: String },

    /// Upstream returned 429
    #[error("rate limited by the API")]
    RateLimited,

    /// Upstream returned 503
    #[error("API temporarily unavailable")]
    Unavailable,

    /// The request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Request never produced a response (DNS, connection, TLS)
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// Any other non-success status
    #[error("API returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    /// Response body was not the expected JSON shape
    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether retrying later could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ApiError::RateLimited | ApiError::Unavailable | ApiError::Timeout | ApiError::Network(_)
        )
    }
}

/// Client for the Clash of Clans REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Base URL for the API (allows override for testing and proxies)
    base_url: String,
    /// Bearer credential; requests fail fast when absent
    token: Option<String>,
    /// Per-request timeout
    timeout: Duration,
}

impl ApiClient {
    /// Creates a new ApiClient against the production API
    ///
    /// An empty token is treated the same as an absent one.
    pub fn new(token: Option<String>) -> Self {
        Self {
            http_client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout: REQUEST_TIMEOUT,
        }
    }

    /// Overrides the base URL (tests, self-hosted proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the per-request timeout
    #[allow(dead_code)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Issues a GET against the API and decodes the JSON response
    ///
    /// # Arguments
    /// * `path` - Path relative to the base URL, already percent-encoded
    ///   (e.g., "clans/%232GQLU8YLP/members")
    ///
    /// # Returns
    /// * `Ok(T)` on a 2xx response that decodes
    /// * `Err(ApiError)` with the status mapped per variant otherwise
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::MissingToken)?;
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        tracing::debug!(%url, "requesting");
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            // A 404 can be a domain answer (no league group, no raid history);
            // callers escalate when it is not.
            if status == StatusCode::NOT_FOUND {
                tracing::debug!(%url, "resource not found");
            } else {
                tracing::warn!(%url, status = status.as_u16(), "API request failed");
            }
            return Err(match status {
                StatusCode::NOT_FOUND => ApiError::NotFound {
                    path: path.to_string(),
                },
                StatusCode::TOO_MANY_REQUESTS => ApiError::RateLimited,
                StatusCode::SERVICE_UNAVAILABLE => ApiError::Unavailable,
                _ => ApiError::Status {
                    status: status.as_u16(),
                    path: path.to_string(),
                },
            });
        }

        let body = response.text().await.map_err(transport_error)?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Maps a reqwest transport failure onto the error taxonomy
fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err)
    }
}
