use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::SyncError;

/// Connectivity state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityState {
    Online,
    Offline,
}

impl core::fmt::Display for ConnectivityState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConnectivityState::Online => f.write_str("online"),
            ConnectivityState::Offline => f.write_str("offline"),
        }
    }
}

/// Shares host-reported connectivity transitions with anyone who subscribes.
///
/// The till never probes the network itself: the host shell reports when the
/// connection comes and goes, and the watcher fans that out. Subscribers are
/// only woken on actual transitions, not on repeated reports of the same
/// state.
#[derive(Debug, Clone)]
pub struct ConnectivityWatcher {
    tx: Arc<watch::Sender<ConnectivityState>>,
}

impl ConnectivityWatcher {
    pub fn new(initial: ConnectivityState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Start in the online state, the usual assumption at boot.
    pub fn online() -> Self {
        Self::new(ConnectivityState::Online)
    }

    pub fn state(&self) -> ConnectivityState {
        *self.tx.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.state() == ConnectivityState::Online
    }

    pub fn is_offline(&self) -> bool {
        self.state() == ConnectivityState::Offline
    }

    /// Mark the client as online.
    pub fn set_online(&self) {
        self.transition(ConnectivityState::Online);
    }

    /// Mark the client as offline.
    pub fn set_offline(&self) {
        self.transition(ConnectivityState::Offline);
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
        self.tx.subscribe()
    }

    /// Ensure the client is online; return error if offline.
    pub fn require_online(&self) -> Result<(), SyncError> {
        if self.is_offline() {
            Err(SyncError::Offline)
        } else {
            Ok(())
        }
    }

    fn transition(&self, next: ConnectivityState) {
        let changed = self.tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            tracing::info!(state = %next, "connectivity changed");
        }
    }
}

impl Default for ConnectivityWatcher {
    fn default() -> Self {
        Self::online()
    }
}
