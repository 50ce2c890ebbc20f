use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use tillbook_store::RecordStore;

use crate::{ConnectivityState, DrainReport, SyncEngine, SyncError};

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_CAP: Duration = Duration::from_secs(300);
const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Broadcast to subscribers after each drain attempt.
#[derive(Debug, Clone, Serialize)]
pub enum SyncEvent {
    /// A drain pass ran; the report says what it moved.
    Completed(DrainReport),
    /// A drain pass could not run at all.
    Failed { error: String },
}

/// Background task that keeps the sync queue drained.
///
/// Drains immediately when connectivity comes back, and on a fixed interval
/// while online. After a pass with failed pushes it backs off exponentially
/// (capped at five minutes) instead of hammering the transport; the first
/// clean pass resets the backoff. An offline-to-online transition always
/// drains at once, backoff or not.
pub struct SyncWorker<S> {
    engine: SyncEngine<S>,
    interval: Duration,
    shutdown: Arc<Notify>,
    events: broadcast::Sender<SyncEvent>,
}

/// Handle to control a running worker.
pub struct SyncWorkerHandle {
    shutdown: Arc<Notify>,
    events: broadcast::Sender<SyncEvent>,
    task: JoinHandle<()>,
}

impl SyncWorkerHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Request graceful shutdown without waiting.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    /// Request graceful shutdown and wait for the task to finish.
    pub async fn stop(self) {
        self.shutdown.notify_one();
        let _ = self.task.await;
    }
}

impl<S> SyncWorker<S>
where
    S: RecordStore + Clone + 'static,
{
    pub fn new(engine: SyncEngine<S>, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine,
            interval,
            shutdown: Arc::new(Notify::new()),
            events,
        }
    }

    /// Subscribe before starting to not miss the first events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Spawn the background task.
    pub fn start(self) -> SyncWorkerHandle {
        let SyncWorker {
            engine,
            interval,
            shutdown,
            events,
        } = self;
        let handle_shutdown = shutdown.clone();
        let handle_events = events.clone();

        let task = tokio::spawn(async move {
            tracing::info!("background sync worker started");

            let mut connectivity = engine.watcher().subscribe();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            let mut consecutive_failures = 0u32;
            let mut backoff_until: Option<Instant> = None;

            loop {
                tokio::select! {
                    _ = shutdown.notified() => {
                        tracing::info!("background sync worker received shutdown signal");
                        break;
                    }
                    changed = connectivity.changed() => {
                        if changed.is_err() {
                            // Watcher dropped; nothing left to react to.
                            break;
                        }
                        if *connectivity.borrow_and_update() == ConnectivityState::Online {
                            tracing::debug!("connectivity restored, draining sync queue");
                            attempt_drain(
                                &engine,
                                &events,
                                &mut consecutive_failures,
                                &mut backoff_until,
                            )
                            .await;
                        }
                    }
                    _ = ticker.tick() => {
                        if engine.watcher().is_offline() {
                            tracing::debug!("skipping scheduled sync, offline");
                            continue;
                        }
                        if backoff_until.is_some_and(|until| Instant::now() < until) {
                            tracing::debug!("skipping scheduled sync, backing off after failures");
                            continue;
                        }
                        attempt_drain(
                            &engine,
                            &events,
                            &mut consecutive_failures,
                            &mut backoff_until,
                        )
                        .await;
                    }
                }
            }

            tracing::info!("background sync worker stopped");
        });

        SyncWorkerHandle {
            shutdown: handle_shutdown,
            events: handle_events,
            task,
        }
    }
}

async fn attempt_drain<S>(
    engine: &SyncEngine<S>,
    events: &broadcast::Sender<SyncEvent>,
    consecutive_failures: &mut u32,
    backoff_until: &mut Option<Instant>,
) where
    S: RecordStore + Clone,
{
    match engine.drain().await {
        Ok(report) => {
            if report.is_clean() {
                *consecutive_failures = 0;
                *backoff_until = None;
                if report.pushed > 0 || report.entries_settled > 0 {
                    tracing::info!(
                        pushed = report.pushed,
                        entries_settled = report.entries_settled,
                        "sync drain completed"
                    );
                } else {
                    tracing::debug!("sync drain completed, nothing pending");
                }
            } else {
                *consecutive_failures += 1;
                *backoff_until = Some(Instant::now() + backoff_delay(*consecutive_failures));
                tracing::warn!(
                    pushed = report.pushed,
                    failed = report.failed,
                    failures = *consecutive_failures,
                    "sync drain completed with failed pushes"
                );
            }
            let _ = events.send(SyncEvent::Completed(report));
        }
        Err(SyncError::Offline) => {
            // Lost connectivity between the trigger and the drain; the next
            // online transition will retry.
            tracing::debug!("sync drain skipped, offline");
        }
        Err(err) => {
            *consecutive_failures += 1;
            *backoff_until = Some(Instant::now() + backoff_delay(*consecutive_failures));
            tracing::warn!(
                failures = *consecutive_failures,
                error = %err,
                "sync drain failed"
            );
            let _ = events.send(SyncEvent::Failed {
                error: err.to_string(),
            });
        }
    }
}

fn backoff_delay(consecutive_failures: u32) -> Duration {
    let doubled = BACKOFF_BASE * (1u32 << consecutive_failures.saturating_sub(1).min(8));
    doubled.min(BACKOFF_CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tillbook_store::{Collection, InMemoryStore};
    use tokio::time::timeout;

    use crate::{ConnectivityWatcher, SimulatedTransport, SyncTransport};

    const WAIT: Duration = Duration::from_secs(5);

    struct Fixture {
        store: Arc<InMemoryStore>,
        watcher: ConnectivityWatcher,
        engine: SyncEngine<Arc<InMemoryStore>>,
    }

    async fn fixture(initial: ConnectivityState) -> Fixture {
        let store = InMemoryStore::arc();
        store.init().await.unwrap();
        let watcher = ConnectivityWatcher::new(initial);
        let transport = Arc::new(SimulatedTransport::instant()) as Arc<dyn SyncTransport>;
        let engine = SyncEngine::new(store.clone(), watcher.clone(), transport);
        Fixture {
            store,
            watcher,
            engine,
        }
    }

    async fn seed_unsynced_sale(store: &Arc<InMemoryStore>) {
        store
            .put(
                Collection::Sales,
                "s1",
                json!({"id": "s1", "total": 500, "synced": false}),
            )
            .await
            .unwrap();
    }

    async fn next_push(rx: &mut broadcast::Receiver<SyncEvent>) -> DrainReport {
        loop {
            match rx.recv().await.unwrap() {
                SyncEvent::Completed(report) if report.pushed > 0 => return report,
                _ => {}
            }
        }
    }

    #[tokio::test]
    async fn reconnect_triggers_an_immediate_drain() {
        let fx = fixture(ConnectivityState::Offline).await;
        seed_unsynced_sale(&fx.store).await;

        // Long interval so only the transition can explain the drain.
        let worker = SyncWorker::new(fx.engine.clone(), Duration::from_secs(3600));
        let mut events = worker.subscribe();
        let handle = worker.start();

        fx.watcher.set_online();

        let report = timeout(WAIT, next_push(&mut events)).await.unwrap();
        assert_eq!(report.pushed, 1);

        let stored = fx.store.get(Collection::Sales, "s1").await.unwrap().unwrap();
        assert_eq!(stored["synced"], true);

        handle.stop().await;
    }

    #[tokio::test]
    async fn interval_drains_while_online() {
        let fx = fixture(ConnectivityState::Online).await;
        seed_unsynced_sale(&fx.store).await;

        let worker = SyncWorker::new(fx.engine.clone(), Duration::from_millis(20));
        let mut events = worker.subscribe();
        let handle = worker.start();

        let report = timeout(WAIT, next_push(&mut events)).await.unwrap();
        assert_eq!(report.pushed, 1);

        handle.stop().await;
    }

    #[tokio::test]
    async fn shutdown_is_graceful() {
        let fx = fixture(ConnectivityState::Online).await;
        let worker = SyncWorker::new(fx.engine.clone(), Duration::from_millis(20));
        let handle = worker.start();

        timeout(WAIT, handle.stop()).await.unwrap();
    }

    #[tokio::test]
    async fn while_offline_nothing_is_pushed() {
        let fx = fixture(ConnectivityState::Offline).await;
        seed_unsynced_sale(&fx.store).await;

        let worker = SyncWorker::new(fx.engine.clone(), Duration::from_millis(10));
        let handle = worker.start();

        tokio::time::sleep(Duration::from_millis(80)).await;
        let stored = fx.store.get(Collection::Sales, "s1").await.unwrap().unwrap();
        assert_eq!(stored["synced"], false);

        handle.stop().await;
    }

    #[test]
    fn backoff_grows_and_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(4), Duration::from_secs(8));
        assert_eq!(backoff_delay(20), BACKOFF_CAP);
    }
}
