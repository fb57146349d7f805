//! # Remote API Client
//!
//! The seam between the sync layer and the remote CRM API: a single-method
//! trait the gateway and drain depend on, plus the production HTTP
//! implementation.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Remote Request Flow                              │
//! │                                                                         │
//! │  execute(method, "/work-orders/42", Some(body))                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  base_url + path  →  https://api.example.com/work-orders/42            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reqwest request (JSON body, optional bearer token, timeout)           │
//! │       │                                                                 │
//! │       ├── send failed        → RemoteError::Transport / Timeout        │
//! │       ├── non-2xx status     → RemoteError::Status { code, body }      │
//! │       ├── empty 2xx body     → Value::Null                             │
//! │       └── 2xx JSON body      → parsed Value                            │
//! │                                                                         │
//! │  The client performs NO retries: the gateway propagates failures       │
//! │  unchanged, and the drain's cycle discipline owns redelivery.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use fieldops_core::HttpMethod;

use crate::error::RemoteError;

// =============================================================================
// Remote API Trait
// =============================================================================

/// Issues one request against the remote CRM API.
///
/// Everything the sync layer knows about the remote surface goes through
/// this trait, so tests install scripted doubles and the drain replays
/// stored queue items without caring what transport sits underneath.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Executes a request and returns the parsed JSON response body.
    ///
    /// `body`, when present, is a complete JSON document ready to send —
    /// queue payloads are replayed byte-for-byte as they were stored.
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
    ) -> Result<Value, RemoteError>;
}

// =============================================================================
// HTTP Configuration
// =============================================================================

/// Configuration for the HTTP remote client.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Base URL of the remote CRM API (scheme + authority, no trailing `/`).
    pub base_url: String,

    /// Request timeout.
    pub timeout: Duration,

    /// Optional bearer token attached to every request.
    pub bearer_token: Option<String>,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        HttpApiConfig {
            base_url: String::new(),
            timeout: Duration::from_secs(30),
            bearer_token: None,
        }
    }
}

// =============================================================================
// HTTP Remote Client
// =============================================================================

/// Production [`RemoteApi`] implementation over reqwest.
#[derive(Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    config: HttpApiConfig,
}

impl HttpApi {
    /// Creates an HTTP client with the given configuration.
    pub fn new(config: HttpApiConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(HttpApi { client, config })
    }

    /// Joins the configured base URL with a resource path.
    fn full_url(&self, path: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }

    fn reqwest_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[async_trait]
impl RemoteApi for HttpApi {
    async fn execute(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
    ) -> Result<Value, RemoteError> {
        let full_url = self.full_url(url);

        let mut request = self.client.request(Self::reqwest_method(method), &full_url);

        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                RemoteError::Timeout(self.config.timeout.as_secs())
            } else {
                RemoteError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                code: status.as_u16(),
                body: text,
            });
        }

        // 204-style responses have nothing to parse
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
