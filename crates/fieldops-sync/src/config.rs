//! # Sync Configuration
//!
//! Configuration management for the offline sync layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FIELDOPS_API_BASE_URL=https://api.example.com                      │
//! │     FIELDOPS_MAX_ATTEMPTS=5                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/fieldops/sync.toml (Linux)                               │
//! │     ~/Library/Application Support/com.fieldops.crm/sync.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # sync.toml
//! [api]
//! base_url = "https://api.example.com"
//! timeout_secs = 30
//!
//! [queue]
//! default_priority = 10
//!
//! [drain]
//! poll_interval_secs = 5
//! batch_size = 100
//! max_attempts = 10
//! abandoned_retention_days = 30
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{GatewayError, SyncResult};
use crate::remote::HttpApiConfig;

// =============================================================================
// API Settings
// =============================================================================

/// Settings for the remote CRM API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the remote API. Must be http:// or https://.
    #[serde(default)]
    pub base_url: String,

    /// Request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Optional bearer token attached to every request.
    #[serde(default)]
    pub bearer_token: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        ApiSettings {
            base_url: String::new(),
            timeout_secs: default_timeout(),
            bearer_token: None,
        }
    }
}

// =============================================================================
// Queue Settings
// =============================================================================

/// Settings for the enqueue side of the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    /// Priority assigned when the caller supplies none.
    /// Lower values drain first.
    #[serde(default = "default_priority")]
    pub default_priority: i64,
}

fn default_priority() -> i64 {
    fieldops_core::PRIORITY_DEFAULT
}

impl Default for QueueSettings {
    fn default() -> Self {
        QueueSettings {
            default_priority: default_priority(),
        }
    }
}

// =============================================================================
// Drain Settings
// =============================================================================

/// Settings for the drain processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrainSettings {
    /// Interval between drain poll cycles (seconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Number of queue entries replayed per cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Failed-attempt ceiling. An item failing this many times is
    /// abandoned and leaves the drain set.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// How long abandoned entries stay queryable before purging (days).
    #[serde(default = "default_retention_days")]
    pub abandoned_retention_days: u32,
}

fn default_poll_interval() -> u64 {
    5
}
fn default_batch_size() -> u32 {
    100
}
fn default_max_attempts() -> i64 {
    10
}
fn default_retention_days() -> u32 {
    30
}

impl Default for DrainSettings {
    fn default() -> Self {
        DrainSettings {
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            max_attempts: default_max_attempts(),
            abandoned_retention_days: default_retention_days(),
        }
    }
}

// =============================================================================
// Main Sync Configuration
// =============================================================================

/// Complete sync layer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote API settings.
    #[serde(default)]
    pub api: ApiSettings,

    /// Enqueue settings.
    #[serde(default)]
    pub queue: QueueSettings,

    /// Drain processor settings.
    #[serde(default)]
    pub drain: DrainSettings,
}

impl SyncConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sync.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SyncResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sync config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sync config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SyncResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| GatewayError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Sync config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SyncResult<()> {
        if self.api.base_url.is_empty() {
            return Err(GatewayError::InvalidConfig(
                "api.base_url must be set".into(),
            ));
        }

        let parsed = Url::parse(&self.api.base_url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(GatewayError::InvalidUrl(format!(
                "API base URL must be http:// or https://, got: {}",
                self.api.base_url
            )));
        }

        if self.drain.batch_size == 0 {
            return Err(GatewayError::InvalidConfig(
                "drain.batch_size must be greater than 0".into(),
            ));
        }

        if self.drain.max_attempts <= 0 {
            return Err(GatewayError::InvalidConfig(
                "drain.max_attempts must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FIELDOPS_API_BASE_URL") {
            debug!(url = %url, "Overriding API base URL from environment");
            self.api.base_url = url;
        }

        if let Ok(token) = std::env::var("FIELDOPS_API_TOKEN") {
            self.api.bearer_token = Some(token);
        }

        if let Ok(secs) = std::env::var("FIELDOPS_API_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                self.api.timeout_secs = s;
            }
        }

        if let Ok(priority) = std::env::var("FIELDOPS_DEFAULT_PRIORITY") {
            if let Ok(p) = priority.parse::<i64>() {
                self.queue.default_priority = p;
            }
        }

        if let Ok(interval) = std::env::var("FIELDOPS_POLL_INTERVAL_SECS") {
            if let Ok(i) = interval.parse::<u64>() {
                debug!(interval = i, "Overriding drain poll interval from environment");
                self.drain.poll_interval_secs = i;
            }
        }

        if let Ok(size) = std::env::var("FIELDOPS_BATCH_SIZE") {
            if let Ok(s) = size.parse::<u32>() {
                self.drain.batch_size = s;
            }
        }

        if let Ok(attempts) = std::env::var("FIELDOPS_MAX_ATTEMPTS") {
            if let Ok(a) = attempts.parse::<i64>() {
                self.drain.max_attempts = a;
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "fieldops", "crm")
            .map(|dirs| dirs.config_dir().join("sync.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Builds the HTTP client configuration from the API settings.
    pub fn http_config(&self) -> HttpApiConfig {
        HttpApiConfig {
            base_url: self.api.base_url.clone(),
            timeout: Duration::from_secs(self.api.timeout_secs),
            bearer_token: self.api.bearer_token.clone(),
        }
    }

    /// Returns the drain poll interval as a Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.drain.poll_interval_secs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.queue.default_priority, 10);
        assert_eq!(config.drain.poll_interval_secs, 5);
        assert_eq!(config.drain.batch_size, 100);
        assert_eq!(config.drain.max_attempts, 10);
    }

    #[test]
    fn test_config_validation() {
        let mut config = SyncConfig::default();

        // Empty base URL should fail
        assert!(config.validate().is_err());

        // Non-http scheme should fail
        config.api.base_url = "ftp://api.example.com".to_string();
        assert!(matches!(config.validate(), Err(GatewayError::InvalidUrl(_))));

        // Valid https URL should pass
        config.api.base_url = "https://api.example.com".to_string();
        assert!(config.validate().is_ok());

        // Zero batch size should fail
        config.drain.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SyncConfig::default();
        config.api.base_url = "https://api.example.com".to_string();
        config.drain.max_attempts = 3;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.toml");
        config.save(Some(path.clone())).unwrap();

        let loaded = SyncConfig::load(Some(path)).unwrap();
        assert_eq!(loaded.api.base_url, "https://api.example.com");
        assert_eq!(loaded.drain.max_attempts, 3);
        assert_eq!(loaded.drain.batch_size, 100);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: SyncConfig = toml::from_str(
            r#"
            [api]
            base_url = "https://api.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.api.base_url, "https://api.example.com");
        assert_eq!(parsed.drain.poll_interval_secs, 5);
        assert_eq!(parsed.queue.default_priority, 10);
    }

    #[test]
    fn test_http_config_conversion() {
        let mut config = SyncConfig::default();
        config.api.base_url = "https://api.example.com".to_string();
        config.api.timeout_secs = 12;
        config.api.bearer_token = Some("tok".to_string());

        let http = config.http_config();
        assert_eq!(http.base_url, "https://api.example.com");
        assert_eq!(http.timeout, Duration::from_secs(12));
        assert_eq!(http.bearer_token.as_deref(), Some("tok"));
    }
}
