//! # Sync Error Types
//!
//! Error types for the gateway and drain engine.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Gateway Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Offline      │  │     Remote      │  │     Persistence         │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Read while     │  │  Transport      │  │  Queue write failed     │ │
//! │  │  offline, or    │  │  Timeout        │  │  while offline          │ │
//! │  │  queuing        │  │  HTTP status    │  │  (never silently        │ │
//! │  │  disallowed     │  │  Bad JSON body  │  │  dropped)               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  The gateway is a thin router: remote errors pass through unchanged,   │
//! │  never retried or reinterpreted. The only value-add is deciding        │
//! │  whether to attempt the network call at all.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for gateway and drain operations.
pub type SyncResult<T> = Result<T, GatewayError>;

// =============================================================================
// Remote Error
// =============================================================================

/// A failure surfaced by the remote API client.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never completed (DNS, connect, reset, ...).
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The remote answered with a non-success status.
    #[error("Remote returned {code}: {body}")]
    Status { code: u16, body: String },

    /// A success status carried a body that was not valid JSON.
    #[error("Response was not valid JSON: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Returns true if a replay of the same request may succeed later.
    ///
    /// ## Retryable
    /// - Transport failures and timeouts (network trouble)
    /// - HTTP 408 / 429 (server asked to come back later)
    /// - HTTP 5xx (server-side fault)
    ///
    /// ## Non-Retryable
    /// - Other 4xx (the request itself is wrong; resending cannot help)
    /// - Unparseable success bodies (the mutation may already have landed,
    ///   so replaying risks a duplicate)
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Transport(_) | RemoteError::Timeout(_) => true,
            RemoteError::Status { code, .. } => {
                matches!(code, 408 | 429) || *code >= 500
            }
            RemoteError::InvalidResponse(_) => false,
        }
    }
}

// =============================================================================
// Gateway Error
// =============================================================================

/// Gateway error covering the full offline-routing taxonomy.
///
/// ## Design Principles
/// - `Offline` is a distinguishable marker: callers branch UI behavior on
///   [`is_offline`](GatewayError::is_offline) ("you are offline" vs. a
///   generic failure).
/// - Remote errors are propagated unchanged, never transformed.
/// - All errors are `Send + Sync` for async compatibility.
#[derive(Debug, Error)]
pub enum GatewayError {
    // =========================================================================
    // Routing Errors
    // =========================================================================
    /// The network is offline and the operation could not proceed: either a
    /// read was attempted, or the mutation disallowed queuing.
    #[error("Network is offline")]
    Offline,

    /// The remote API failed while online. Propagated unchanged.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The local queue store failed. Deferred mutations are never silently
    /// dropped; enqueue failures always surface.
    #[error("Queue persistence failed: {0}")]
    Persistence(#[from] fieldops_db::DbError),

    /// A payload was unsuitable for optimistic synthesis or replay.
    #[error(transparent)]
    Payload(#[from] fieldops_core::CoreError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Channel send/receive failed.
    #[error("Channel error: {0}")]
    ChannelError(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for GatewayError {
    fn from(err: std::io::Error) -> Self {
        GatewayError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for GatewayError {
    fn from(err: toml::de::Error) -> Self {
        GatewayError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for GatewayError {
    fn from(err: toml::ser::Error) -> Self {
        GatewayError::ConfigSaveFailed(err.to_string())
    }
}

impl From<url::ParseError> for GatewayError {
    fn from(err: url::ParseError) -> Self {
        GatewayError::InvalidUrl(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl GatewayError {
    /// Returns true if the failure was the offline marker.
    ///
    /// The type guard callers use to branch between "you are offline"
    /// messaging and hard-failure messaging.
    pub fn is_offline(&self) -> bool {
        matches!(self, GatewayError::Offline)
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            GatewayError::InvalidConfig(_)
                | GatewayError::InvalidUrl(_)
                | GatewayError::ConfigLoadFailed(_)
                | GatewayError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_remote_errors() {
        assert!(RemoteError::Transport("connection refused".into()).is_retryable());
        assert!(RemoteError::Timeout(30).is_retryable());
        assert!(RemoteError::Status { code: 503, body: String::new() }.is_retryable());
        assert!(RemoteError::Status { code: 429, body: String::new() }.is_retryable());
        assert!(RemoteError::Status { code: 408, body: String::new() }.is_retryable());

        assert!(!RemoteError::Status { code: 422, body: String::new() }.is_retryable());
        assert!(!RemoteError::Status { code: 404, body: String::new() }.is_retryable());
        assert!(!RemoteError::InvalidResponse("trailing garbage".into()).is_retryable());
    }

    #[test]
    fn test_offline_type_guard() {
        assert!(GatewayError::Offline.is_offline());

        let remote: GatewayError = RemoteError::Timeout(10).into();
        assert!(!remote.is_offline());
    }

    #[test]
    fn test_config_categorization() {
        assert!(GatewayError::InvalidUrl("ftp://nope".into()).is_config_error());
        assert!(!GatewayError::Offline.is_config_error());
    }
}
