//! # Connectivity Signal
//!
//! The online/offline signal as an explicitly injected dependency.
//!
//! ## Signal Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Connectivity Plumbing                              │
//! │                                                                         │
//! │  Host application (OS network events, heartbeat probe, user toggle)    │
//! │       │                                                                 │
//! │       │ set_online(true / false)                                        │
//! │       ▼                                                                 │
//! │  ┌────────────────┐     is_online()      ┌──────────────────────────┐  │
//! │  │ NetworkStatus  │ ◄────────────────────│ OfflineGateway           │  │
//! │  │ (watch channel)│                      │ (route or queue?)        │  │
//! │  └───────┬────────┘                      └──────────────────────────┘  │
//! │          │                                                              │
//! │          │ subscribe() → watch::Receiver<bool>                         │
//! │          ▼                                                              │
//! │  ┌────────────────┐                                                     │
//! │  │ DrainProcessor │  woken on the offline→online transition            │
//! │  └────────────────┘                                                     │
//! │                                                                         │
//! │  Single-process discipline: one writer flips the flag; readers only    │
//! │  observe. Multi-process stores would need external coordination.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::watch;
use tracing::debug;

// =============================================================================
// Connectivity Probe
// =============================================================================

/// Read-side view of the connectivity signal.
///
/// The gateway consults this before every operation. Implementations must
/// be cheap: the probe sits on the hot path of every request.
pub trait ConnectivityProbe: Send + Sync {
    /// Returns true if the network is currently believed reachable.
    fn is_online(&self) -> bool;
}

// =============================================================================
// Network Status
// =============================================================================

/// Shareable connectivity signal backed by a watch channel.
///
/// The host application owns the write side and flips it from whatever
/// source of truth it has (OS callbacks, a heartbeat, a manual toggle).
/// The drain processor subscribes so an offline→online transition wakes it
/// immediately instead of waiting out the poll interval.
#[derive(Debug)]
pub struct NetworkStatus {
    tx: watch::Sender<bool>,
}

impl NetworkStatus {
    /// Creates a signal with the given initial state.
    pub fn new(initially_online: bool) -> Self {
        let (tx, _rx) = watch::channel(initially_online);
        NetworkStatus { tx }
    }

    /// Flips the connectivity flag and wakes subscribers on change.
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if changed {
            debug!(online, "Connectivity changed");
        }
    }

    /// Subscribes to connectivity transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for NetworkStatus {
    /// Starts online; most sessions begin connected.
    fn default() -> Self {
        NetworkStatus::new(true)
    }
}

impl ConnectivityProbe for NetworkStatus {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert!(NetworkStatus::new(true).is_online());
        assert!(!NetworkStatus::new(false).is_online());
        assert!(NetworkStatus::default().is_online());
    }

    #[tokio::test]
    async fn test_subscribers_wake_on_transition() {
        let status = NetworkStatus::new(false);
        let mut rx = status.subscribe();

        status.set_online(true);

        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(status.is_online());
    }

    #[tokio::test]
    async fn test_redundant_set_does_not_wake() {
        let status = NetworkStatus::new(true);
        let mut rx = status.subscribe();

        // Same value again: no wakeup should be queued
        status.set_online(true);

        assert!(!rx.has_changed().unwrap());
    }
}
