use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value as JsonValue;

use tillbook_store::{Collection, RecordStore};

use crate::{ConnectivityWatcher, SyncError, SyncQueue, SyncTransport};

/// How long settled queue entries are kept before pruning.
const DEFAULT_PRUNE_AGE_DAYS: i64 = 7;

/// What one drain pass accomplished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DrainReport {
    /// Records (and orphaned snapshots) successfully pushed.
    pub pushed: usize,
    /// Pushes the transport rejected; their records stay pending.
    pub failed: usize,
    /// Queue entries flipped to `Synced`.
    pub entries_settled: usize,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Drives one pass of the sync routine: push every unsynced record, flip its
/// flag, settle the matching queue entries, prune old settled ones.
#[derive(Clone)]
pub struct SyncEngine<S> {
    store: S,
    queue: SyncQueue<S>,
    watcher: ConnectivityWatcher,
    transport: Arc<dyn SyncTransport>,
    prune_age: Duration,
}

impl<S> SyncEngine<S>
where
    S: RecordStore + Clone,
{
    pub fn new(store: S, watcher: ConnectivityWatcher, transport: Arc<dyn SyncTransport>) -> Self {
        let queue = SyncQueue::new(store.clone());
        Self {
            store,
            queue,
            watcher,
            transport,
            prune_age: Duration::days(DEFAULT_PRUNE_AGE_DAYS),
        }
    }

    pub fn with_prune_age(mut self, age: Duration) -> Self {
        self.prune_age = age;
        self
    }

    pub fn queue(&self) -> &SyncQueue<S> {
        &self.queue
    }

    pub fn watcher(&self) -> &ConnectivityWatcher {
        &self.watcher
    }

    /// One full drain pass.
    ///
    /// Fails fast with [`SyncError::Offline`] when the watcher reports
    /// offline, before touching the store. Transport rejections are not
    /// errors: the affected records stay pending and are counted in the
    /// report instead.
    pub async fn drain(&self) -> Result<DrainReport, SyncError> {
        self.watcher.require_online()?;

        let mut report = DrainReport::default();

        for collection in Collection::BUSINESS {
            self.drain_collection(collection, &mut report).await?;
        }
        self.settle_entries(&mut report).await?;

        let pruned = self.queue.prune_synced(self.prune_age).await?;
        if pruned > 0 {
            tracing::debug!(pruned, "pruned settled sync queue entries");
        }

        Ok(report)
    }

    /// Push every unsynced record in one collection and flip its flag.
    async fn drain_collection(
        &self,
        collection: Collection,
        report: &mut DrainReport,
    ) -> Result<(), SyncError> {
        for mut record in self.store.get_all(collection).await? {
            // A record without the flag has nothing to push.
            let synced = record
                .get("synced")
                .and_then(JsonValue::as_bool)
                .unwrap_or(true);
            if synced {
                continue;
            }

            let Some(id) = record.get("id").and_then(JsonValue::as_str).map(str::to_owned)
            else {
                tracing::warn!(collection = %collection, "unsynced record has no string id, skipping");
                continue;
            };

            match self.transport.push(collection, &record).await {
                Ok(()) => {
                    if let Some(body) = record.as_object_mut() {
                        body.insert("synced".to_string(), JsonValue::Bool(true));
                    }
                    self.store.put(collection, &id, record).await?;
                    report.pushed += 1;
                }
                Err(err) => {
                    tracing::warn!(collection = %collection, id = %id, error = %err, "push failed, record stays pending");
                    report.failed += 1;
                }
            }
        }
        Ok(())
    }

    /// Settle queue entries whose work is done.
    ///
    /// An entry settles when its record is now synced. An entry whose record
    /// is gone (deleted locally before any sync) pushes its enqueue-time
    /// snapshot instead, so the action still reaches the remote once.
    async fn settle_entries(&self, report: &mut DrainReport) -> Result<(), SyncError> {
        let now = Utc::now();
        for entry in self.queue.pending().await? {
            match self.store.get(entry.collection, &entry.record_id).await? {
                Some(record) => {
                    let synced = record
                        .get("synced")
                        .and_then(JsonValue::as_bool)
                        .unwrap_or(false);
                    if synced {
                        self.queue.mark_synced(entry.id, now).await?;
                        report.entries_settled += 1;
                    }
                    // Otherwise the record's push failed this pass; the
                    // entry stays outstanding for the next trigger.
                }
                None => match self.transport.push(entry.collection, &entry.data).await {
                    Ok(()) => {
                        self.queue.mark_synced(entry.id, now).await?;
                        report.pushed += 1;
                        report.entries_settled += 1;
                    }
                    Err(err) => {
                        tracing::warn!(entry = %entry.id, action = %entry.action, error = %err, "snapshot push failed");
                        self.queue.mark_failed(entry.id, err.to_string()).await?;
                        report.failed += 1;
                    }
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use tillbook_records::{Expense, ExpenseCategory, PaymentMethod, Sale, SaleLine};
    use tillbook_store::{InMemoryStore, RecordStoreExt};

    use crate::SimulatedTransport;

    struct Fixture {
        store: Arc<InMemoryStore>,
        transport: Arc<SimulatedTransport>,
        engine: SyncEngine<Arc<InMemoryStore>>,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::arc();
        store.init().await.unwrap();
        let transport = Arc::new(SimulatedTransport::instant());
        let engine = SyncEngine::new(
            store.clone(),
            ConnectivityWatcher::online(),
            transport.clone() as Arc<dyn SyncTransport>,
        );
        Fixture {
            store,
            transport,
            engine,
        }
    }

    fn test_sale() -> Sale {
        Sale::record(
            vec![SaleLine {
                item_id: None,
                description: "soap bar".to_string(),
                quantity: 2,
                unit_price: 150,
            }],
            PaymentMethod::Cash,
            None,
            None,
            Utc::now(),
        )
        .unwrap()
    }

    async fn seed_sale(fx: &Fixture) -> Sale {
        let sale = test_sale();
        fx.store.add_record(Collection::Sales, &sale).await.unwrap();
        fx.engine
            .queue()
            .enqueue(
                "sales.record",
                Collection::Sales,
                sale.id.to_string(),
                serde_json::to_value(&sale).unwrap(),
            )
            .await
            .unwrap();
        sale
    }

    #[tokio::test]
    async fn drain_flips_synced_flags_and_settles_entries() {
        let fx = fixture().await;
        let sale = seed_sale(&fx).await;

        let expense =
            Expense::log(ExpenseCategory::Transport, "fuel", 3_000, None, Utc::now()).unwrap();
        fx.store
            .add_record(Collection::Expenses, &expense)
            .await
            .unwrap();
        fx.engine
            .queue()
            .enqueue(
                "expenses.log",
                Collection::Expenses,
                expense.id.to_string(),
                serde_json::to_value(&expense).unwrap(),
            )
            .await
            .unwrap();

        let report = fx.engine.drain().await.unwrap();
        assert_eq!(report.pushed, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.entries_settled, 2);
        assert!(report.is_clean());

        let stored: Sale = fx
            .store
            .get_record(Collection::Sales, &sale.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert!(stored.synced);
        assert_eq!(fx.engine.queue().pending_count().await.unwrap(), 0);
        assert_eq!(fx.transport.pushed().len(), 2);
    }

    #[tokio::test]
    async fn drain_while_offline_fails_without_touching_anything() {
        let fx = fixture().await;
        seed_sale(&fx).await;
        fx.engine.watcher().set_offline();

        let err = fx.engine.drain().await.unwrap_err();
        assert!(matches!(err, SyncError::Offline));
        assert!(fx.transport.pushed().is_empty());
        assert_eq!(fx.engine.queue().pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_pushes_leave_records_and_entries_pending() {
        let fx = fixture().await;
        let sale = seed_sale(&fx).await;
        fx.transport.inject_failures(1);

        let report = fx.engine.drain().await.unwrap();
        assert_eq!(report.pushed, 0);
        assert_eq!(report.failed, 1);
        assert_eq!(report.entries_settled, 0);

        let stored: Sale = fx
            .store
            .get_record(Collection::Sales, &sale.id.to_string())
            .await
            .unwrap()
            .unwrap();
        assert!(!stored.synced);
        assert_eq!(fx.engine.queue().pending_count().await.unwrap(), 1);

        // Next drain succeeds and clears the backlog.
        let report = fx.engine.drain().await.unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(report.entries_settled, 1);
        assert_eq!(fx.engine.queue().pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deleted_record_pushes_its_snapshot_and_settles() {
        let fx = fixture().await;

        fx.engine
            .queue()
            .enqueue(
                "expenses.delete",
                Collection::Expenses,
                "gone",
                json!({"id": "gone", "deleted": true}),
            )
            .await
            .unwrap();

        let report = fx.engine.drain().await.unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(report.entries_settled, 1);
        assert_eq!(fx.engine.queue().pending_count().await.unwrap(), 0);

        let pushed = fx.transport.pushed();
        assert_eq!(pushed.len(), 1);
        assert_eq!(pushed[0].record["deleted"], true);
    }

    #[tokio::test]
    async fn second_drain_pushes_nothing_new() {
        let fx = fixture().await;
        seed_sale(&fx).await;

        fx.engine.drain().await.unwrap();
        let report = fx.engine.drain().await.unwrap();
        assert_eq!(report.pushed, 0);
        assert_eq!(report.entries_settled, 0);
    }

    #[tokio::test]
    async fn records_without_synced_field_are_ignored() {
        let fx = fixture().await;
        fx.store
            .put(
                Collection::Customers,
                "c-raw",
                json!({"id": "c-raw", "name": "walk-in"}),
            )
            .await
            .unwrap();

        let report = fx.engine.drain().await.unwrap();
        assert_eq!(report.pushed, 0);
        assert!(fx.transport.pushed().is_empty());
    }
}
