//! # fieldops-sync: Offline Gateway & Drain Engine
//!
//! This crate provides the offline-aware mutation layer for the Fieldops
//! CRM client: transparent passthrough while online, durable queuing with
//! optimistic responses while offline, and strictly ordered replay once
//! connectivity returns.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Sync Layer Architecture                          │
//! │                                                                         │
//! │   Caller (UI hooks, host app)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────┐   online    ┌──────────────────────────────────┐ │
//! │  │  OfflineGateway  │ ──────────► │  RemoteApi (reqwest HttpApi)     │ │
//! │  │                  │             └──────────────▲───────────────────┘ │
//! │  │  get/post/put/   │   offline                  │                     │
//! │  │  patch/delete    │ ──────────┐                │ sequential replay   │
//! │  └──────────────────┘           │                │                     │
//! │       │                         ▼                │                     │
//! │       │ pending views   ┌──────────────┐   ┌─────┴──────────┐          │
//! │       └───────────────► │  sync_queue  │──►│ DrainProcessor │          │
//! │                         │ (fieldops-db)│   │                │          │
//! │                         └──────────────┘   └─────┬──────────┘          │
//! │                                                  │ events              │
//! │  ┌──────────────────┐  watch transitions         ▼                     │
//! │  │  NetworkStatus   │ ─────────────────► DrainEventSink               │
//! │  │  (injected)      │                    (cache invalidation cue)     │
//! │  └──────────────────┘                                                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`gateway`] - The offline-aware mutation gateway
//! - [`drain`] - Sequential queue replay with retry/abandonment discipline
//! - [`connectivity`] - The injected online/offline signal
//! - [`remote`] - The remote API seam and its reqwest implementation
//! - [`config`] - TOML + environment configuration
//! - [`error`] - Error taxonomy (offline / remote / persistence)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fieldops_db::{Database, DbConfig};
//! use fieldops_sync::{
//!     DrainProcessor, HttpApi, NetworkStatus, NoOpSink, OfflineGateway,
//!     OfflineRequestOptions, SyncConfig,
//! };
//!
//! let config = SyncConfig::load_or_default(None);
//! let db = Database::new(DbConfig::new("queue.db")).await?;
//! let remote = Arc::new(HttpApi::new(config.http_config())?);
//! let status = Arc::new(NetworkStatus::default());
//!
//! let gateway = OfflineGateway::new(db.clone(), remote.clone(), status.clone());
//!
//! let (drain, handle) = DrainProcessor::new(
//!     db, remote, status.subscribe(), config.drain.clone(), Arc::new(NoOpSink),
//! );
//! tokio::spawn(drain.run());
//!
//! // Works online and offline alike:
//! let outcome = gateway
//!     .post("/work-orders", payload, OfflineRequestOptions::new())
//!     .await?;
//! if outcome.offline_queued {
//!     // show a "pending sync" indicator
//! }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod connectivity;
pub mod drain;
pub mod error;
pub mod gateway;
pub mod remote;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ApiSettings, DrainSettings, QueueSettings, SyncConfig};
pub use connectivity::{ConnectivityProbe, NetworkStatus};
pub use drain::{DrainEventSink, DrainHandle, DrainProcessor, DrainReport, NoOpSink};
pub use error::{GatewayError, RemoteError, SyncResult};
pub use gateway::{MutationOutcome, OfflineGateway, OfflineRequestOptions, QueueStatus};
pub use remote::{HttpApi, HttpApiConfig, RemoteApi};
