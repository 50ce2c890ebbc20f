use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use tillbook_store::Collection;

use crate::SyncError;

/// Where pushed records go.
///
/// The production backend for this system has not been chosen, so this trait
/// deliberately stays small: one record out, success or failure back. A real
/// implementation would add authentication, batching and idempotency keys
/// behind the same seam.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    /// Push one record to the remote side.
    async fn push(&self, collection: Collection, record: &JsonValue) -> Result<(), SyncError>;
}

/// A record the simulated transport accepted, kept for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct PushedRecord {
    pub collection: Collection,
    pub record: JsonValue,
}

/// Stand-in transport: waits a configurable delay, then succeeds.
///
/// Failures can be injected (the next `n` pushes fail) and the whole remote
/// can be flagged unreachable, which is enough to exercise every drain path.
pub struct SimulatedTransport {
    latency: Duration,
    reachable: AtomicBool,
    failures_remaining: AtomicU32,
    pushed: Mutex<Vec<PushedRecord>>,
}

impl SimulatedTransport {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            reachable: AtomicBool::new(true),
            failures_remaining: AtomicU32::new(0),
            pushed: Mutex::new(Vec::new()),
        }
    }

    /// No artificial delay; the usual choice in tests.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Flag the remote reachable or unreachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Make the next `n` pushes fail before succeeding again.
    pub fn inject_failures(&self, n: u32) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Everything successfully pushed so far, in order.
    pub fn pushed(&self) -> Vec<PushedRecord> {
        self.pushed.lock().map(|log| log.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SyncTransport for SimulatedTransport {
    async fn push(&self, collection: Collection, record: &JsonValue) -> Result<(), SyncError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if !self.reachable.load(Ordering::SeqCst) {
            return Err(SyncError::transport("remote unreachable"));
        }

        let injected = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(SyncError::transport("injected push failure"));
        }

        let mut log = self
            .pushed
            .lock()
            .map_err(|_| SyncError::transport("push log lock poisoned"))?;
        log.push(PushedRecord {
            collection,
            record: record.clone(),
        });
        Ok(())
    }
}
