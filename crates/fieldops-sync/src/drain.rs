//! # Drain Processor
//!
//! Replays the persisted queue against the remote API, strictly in order.
//!
//! ## Drain Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Drain Processor Flow                              │
//! │                                                                         │
//! │  WAKE SOURCES                                                          │
//! │  ├── poll interval tick (while online)                                 │
//! │  ├── connectivity offline→online transition                            │
//! │  └── manual trigger via DrainHandle                                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT pending ORDER BY priority, created_at, seq LIMIT batch_size    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  For each item, IN ORDER, ONE AT A TIME:                               │
//! │       │                                                                 │
//! │       ├── replay succeeded   → DELETE row, emit on_delivered           │
//! │       ├── retryable failure  → attempts += 1, keep for next cycle      │
//! │       ├── attempts ceiling   → abandon, emit on_abandoned              │
//! │       └── permanent failure  → abandon immediately (a 422 replayed     │
//! │           (4xx, bad body)      ten times is still a 422)               │
//! │                                                                         │
//! │  ORDERING INVARIANT:                                                   │
//! │  Each attempt is awaited before the next is issued. Later items may    │
//! │  semantically depend on earlier ones (an update referencing a queued   │
//! │  create), so concurrent replay is never permitted. Causal order of     │
//! │  queued mutations is preserved across the offline/online boundary.    │
//! │                                                                         │
//! │  A failed item does not halt the cycle; the remaining items are still  │
//! │  attempted in order.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use fieldops_core::QueueItem;
use fieldops_db::Database;

use crate::config::DrainSettings;
use crate::error::{GatewayError, SyncResult};
use crate::remote::RemoteApi;

// =============================================================================
// Drain Events
// =============================================================================

/// Observer for drain outcomes.
///
/// The host application subscribes to invalidate caches after a delivery
/// (the explicit replacement for a shared query-cache singleton) and to
/// surface sync failures in the UI.
pub trait DrainEventSink: Send + Sync {
    /// A queued mutation was delivered and removed from the store.
    fn on_delivered(&self, item: &QueueItem);

    /// A delivery attempt failed; the item stays queued for the next cycle.
    fn on_retry_scheduled(&self, item: &QueueItem, error: &str);

    /// An item was permanently given up on.
    fn on_abandoned(&self, item: &QueueItem, error: &str);

    /// A drain cycle finished.
    fn on_cycle_complete(&self, report: &DrainReport);
}

/// No-op event sink for hosts that don't observe drains.
pub struct NoOpSink;

impl DrainEventSink for NoOpSink {
    fn on_delivered(&self, _item: &QueueItem) {}
    fn on_retry_scheduled(&self, _item: &QueueItem, _error: &str) {}
    fn on_abandoned(&self, _item: &QueueItem, _error: &str) {}
    fn on_cycle_complete(&self, _report: &DrainReport) {}
}

// =============================================================================
// Drain Report
// =============================================================================

/// Outcome of one drain cycle.
#[derive(Debug, Clone, Default)]
pub struct DrainReport {
    /// Items delivered and removed this cycle.
    pub delivered: usize,

    /// Items that failed retryably and stay queued.
    pub retried: usize,

    /// Items permanently abandoned this cycle.
    pub abandoned: usize,

    /// Items still pending after the cycle.
    pub remaining: i64,
}

// =============================================================================
// Drain Handle
// =============================================================================

/// Handle for controlling a running drain processor.
#[derive(Clone)]
pub struct DrainHandle {
    /// Manual drain trigger ("sync now").
    trigger_tx: mpsc::Sender<()>,

    /// Shutdown sender.
    shutdown_tx: mpsc::Sender<()>,
}

impl DrainHandle {
    /// Requests an immediate drain cycle.
    pub async fn trigger(&self) -> SyncResult<()> {
        self.trigger_tx
            .send(())
            .await
            .map_err(|_| GatewayError::ChannelError("Drain trigger channel closed".into()))
    }

    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) -> SyncResult<()> {
        self.shutdown_tx
            .send(())
            .await
            .map_err(|_| GatewayError::ChannelError("Shutdown channel closed".into()))
    }
}

// =============================================================================
// Drain Processor
// =============================================================================

/// Replays the persisted queue sequentially when connectivity allows.
pub struct DrainProcessor {
    /// Queue store.
    db: Database,

    /// Remote API client used for replay.
    remote: Arc<dyn RemoteApi>,

    /// Connectivity subscription; a false→true transition wakes the loop.
    connectivity: watch::Receiver<bool>,

    /// Drain settings (poll interval, batch size, attempt ceiling).
    settings: DrainSettings,

    /// Event observer.
    sink: Arc<dyn DrainEventSink>,

    /// Manual trigger receiver.
    trigger_rx: mpsc::Receiver<()>,

    /// Shutdown receiver.
    shutdown_rx: mpsc::Receiver<()>,
}

impl DrainProcessor {
    /// Creates a drain processor and its control handle.
    pub fn new(
        db: Database,
        remote: Arc<dyn RemoteApi>,
        connectivity: watch::Receiver<bool>,
        settings: DrainSettings,
        sink: Arc<dyn DrainEventSink>,
    ) -> (Self, DrainHandle) {
        let (trigger_tx, trigger_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let processor = DrainProcessor {
            db,
            remote,
            connectivity,
            settings,
            sink,
            trigger_rx,
            shutdown_rx,
        };

        let handle = DrainHandle {
            trigger_tx,
            shutdown_tx,
        };

        (processor, handle)
    }

    /// Runs the drain loop.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Drain processor starting");

        let poll_interval = Duration::from_secs(self.settings.poll_interval_secs);
        let mut interval = tokio::time::interval(poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                // Poll on interval
                _ = interval.tick() => {
                    if let Err(e) = self.drain_once().await {
                        error!(?e, "Drain cycle failed");
                    }
                }

                // Wake on connectivity transitions
                changed = self.connectivity.changed() => {
                    match changed {
                        Ok(()) => {
                            if *self.connectivity.borrow() {
                                info!("Connectivity restored, draining queue");
                                if let Err(e) = self.drain_once().await {
                                    error!(?e, "Reconnect drain failed");
                                }
                            }
                        }
                        // Signal owner dropped: no more transitions will come
                        Err(_) => {
                            warn!("Connectivity signal closed, stopping drain processor");
                            break;
                        }
                    }
                }

                // Manual trigger
                Some(()) = self.trigger_rx.recv() => {
                    debug!("Manual drain trigger");
                    if let Err(e) = self.drain_once().await {
                        error!(?e, "Triggered drain failed");
                    }
                }

                // Shutdown
                _ = self.shutdown_rx.recv() => {
                    info!("Drain processor shutting down");
                    break;
                }
            }
        }

        info!("Drain processor stopped");
    }

    /// Runs one drain cycle.
    ///
    /// Fetches up to `batch_size` pending items in drain order and replays
    /// them one at a time, awaiting each attempt before issuing the next.
    /// Exposed for manual invocation and tests; the background loop calls
    /// it on every wake.
    pub async fn drain_once(&mut self) -> SyncResult<DrainReport> {
        if !*self.connectivity.borrow() {
            debug!("Offline, skipping drain cycle");
            return Ok(DrainReport::default());
        }

        let queue = self.db.queue();
        let batch = queue.get_pending_ordered(self.settings.batch_size).await?;

        if batch.is_empty() {
            debug!("No pending queue entries");
            return Ok(DrainReport::default());
        }

        info!(count = batch.len(), "Draining queue");

        let mut report = DrainReport::default();

        for item in batch {
            match self
                .remote
                .execute(item.method, &item.url, item.payload.as_deref())
                .await
            {
                Ok(_) => {
                    queue.mark_delivered(&item.id).await?;
                    debug!(id = %item.id, entity = %item.entity, "Queue item delivered");
                    report.delivered += 1;
                    self.sink.on_delivered(&item);
                }
                Err(err) => {
                    let message = err.to_string();

                    if !err.is_retryable() {
                        warn!(
                            id = %item.id,
                            entity = %item.entity,
                            error = %message,
                            "Permanent failure, abandoning queue item"
                        );
                        queue.abandon(&item.id, &message).await?;
                        report.abandoned += 1;
                        self.sink.on_abandoned(&item, &message);
                    } else if item.attempts + 1 >= self.settings.max_attempts {
                        warn!(
                            id = %item.id,
                            entity = %item.entity,
                            attempts = item.attempts + 1,
                            error = %message,
                            "Attempt ceiling reached, abandoning queue item"
                        );
                        queue.abandon(&item.id, &message).await?;
                        report.abandoned += 1;
                        self.sink.on_abandoned(&item, &message);
                    } else {
                        debug!(
                            id = %item.id,
                            attempts = item.attempts + 1,
                            error = %message,
                            "Delivery failed, keeping item for next cycle"
                        );
                        queue.mark_failed(&item.id, &message).await?;
                        report.retried += 1;
                        self.sink.on_retry_scheduled(&item, &message);
                    }
                }
            }
        }

        report.remaining = queue.count_pending().await?;
        self.sink.on_cycle_complete(&report);

        info!(
            delivered = report.delivered,
            retried = report.retried,
            abandoned = report.abandoned,
            remaining = report.remaining,
            "Drain cycle complete"
        );

        Ok(report)
    }

    /// Deletes abandoned entries past the configured retention window.
    pub async fn purge_abandoned(&self) -> SyncResult<u64> {
        let purged = self
            .db
            .queue()
            .purge_abandoned(self.settings.abandoned_retention_days)
            .await?;

        if purged > 0 {
            info!(purged, "Purged abandoned queue entries");
        }

        Ok(purged)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
