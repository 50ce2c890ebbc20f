use chrono::{DateTime, Duration, Utc};
use serde_json::Value as JsonValue;

use tillbook_core::RecordId;
use tillbook_store::{Collection, RecordStore, RecordStoreExt, StoreError};

use crate::{QueueStatus, SyncError, SyncQueueEntry};

/// Durable queue of local mutations, persisted in [`Collection::SyncQueue`]
/// of the same store the records themselves live in.
///
/// The queue is append-plus-settle: entries are added on every mutation,
/// flipped to `Synced` by the drain, and pruned once they have been settled
/// for a retention window. Nothing is dead-lettered; a failed entry stays
/// outstanding until a drain succeeds.
#[derive(Debug, Clone)]
pub struct SyncQueue<S> {
    store: S,
}

impl<S> SyncQueue<S>
where
    S: RecordStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Append a new entry for a local mutation.
    pub async fn enqueue(
        &self,
        action: impl Into<String>,
        collection: Collection,
        record_id: impl Into<String>,
        data: JsonValue,
    ) -> Result<SyncQueueEntry, SyncError> {
        let entry = SyncQueueEntry::new(action, collection, record_id, data, Utc::now());
        self.store
            .add(
                Collection::SyncQueue,
                &entry.id.to_string(),
                serde_json::to_value(&entry).map_err(StoreError::from)?,
            )
            .await?;
        tracing::debug!(action = %entry.action, collection = %entry.collection, record_id = %entry.record_id, "queued mutation for sync");
        Ok(entry)
    }

    /// Total number of entries, settled or not.
    pub async fn len(&self) -> Result<usize, SyncError> {
        Ok(self.store.get_all(Collection::SyncQueue).await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, SyncError> {
        Ok(self.len().await? == 0)
    }

    /// Entries still awaiting a successful push (`Pending` or `Failed`),
    /// oldest first.
    pub async fn pending(&self) -> Result<Vec<SyncQueueEntry>, SyncError> {
        let mut entries: Vec<SyncQueueEntry> = self
            .store
            .get_all_records(Collection::SyncQueue)
            .await?
            .into_iter()
            .filter(SyncQueueEntry::is_outstanding)
            .collect();
        entries.sort_by_key(|entry| entry.queued_at);
        Ok(entries)
    }

    /// Number of outstanding entries: the UI badge count.
    pub async fn pending_count(&self) -> Result<usize, SyncError> {
        Ok(self.pending().await?.len())
    }

    pub async fn get(&self, id: RecordId) -> Result<Option<SyncQueueEntry>, SyncError> {
        Ok(self
            .store
            .get_record(Collection::SyncQueue, &id.to_string())
            .await?)
    }

    /// Mark an entry as in flight.
    pub async fn mark_syncing(&self, id: RecordId) -> Result<(), SyncError> {
        self.update(id, |entry| entry.mark_syncing()).await
    }

    /// Mark an entry as successfully pushed.
    pub async fn mark_synced(&self, id: RecordId, at: DateTime<Utc>) -> Result<(), SyncError> {
        self.update(id, |entry| entry.mark_synced(at)).await
    }

    /// Mark an entry as failed with an error message.
    pub async fn mark_failed(
        &self,
        id: RecordId,
        error: impl Into<String>,
    ) -> Result<(), SyncError> {
        let error = error.into();
        self.update(id, |entry| entry.mark_failed(error)).await
    }

    /// Move a failed entry back to pending.
    pub async fn retry_failed(&self, id: RecordId) -> Result<(), SyncError> {
        self.update(id, |entry| entry.retry()).await
    }

    /// Delete settled entries whose `synced_at` is older than `older_than`.
    /// Returns how many were removed.
    pub async fn prune_synced(&self, older_than: Duration) -> Result<usize, SyncError> {
        let cutoff = Utc::now() - older_than;
        let entries: Vec<SyncQueueEntry> =
            self.store.get_all_records(Collection::SyncQueue).await?;

        let mut pruned = 0;
        for entry in entries {
            let expired = entry.status == QueueStatus::Synced
                && entry.synced_at.is_some_and(|at| at < cutoff);
            if expired {
                self.store
                    .delete(Collection::SyncQueue, &entry.id.to_string())
                    .await?;
                pruned += 1;
            }
        }
        Ok(pruned)
    }

    /// Load, mutate and write back one entry. A missing id is a quiet no-op;
    /// the entry may have been pruned under us.
    async fn update(
        &self,
        id: RecordId,
        apply: impl FnOnce(&mut SyncQueueEntry),
    ) -> Result<(), SyncError> {
        let Some(mut entry) = self.get(id).await? else {
            tracing::debug!(id = %id, "sync queue entry vanished before update");
            return Ok(());
        };
        apply(&mut entry);
        self.store
            .put(
                Collection::SyncQueue,
                &entry.id.to_string(),
                serde_json::to_value(&entry).map_err(StoreError::from)?,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tillbook_store::InMemoryStore;

    async fn test_queue() -> SyncQueue<InMemoryStore> {
        let store = InMemoryStore::new();
        store.init().await.unwrap();
        SyncQueue::new(store)
    }

    #[tokio::test]
    async fn each_mutation_grows_the_queue_by_one() {
        let queue = test_queue().await;
        assert!(queue.is_empty().await.unwrap());

        queue
            .enqueue("sales.record", Collection::Sales, "s1", json!({"id": "s1"}))
            .await
            .unwrap();
        queue
            .enqueue("expenses.log", Collection::Expenses, "e1", json!({"id": "e1"}))
            .await
            .unwrap();

        assert_eq!(queue.len().await.unwrap(), 2);
        assert_eq!(queue.pending_count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn settled_entries_leave_the_pending_count() {
        let queue = test_queue().await;
        let a = queue
            .enqueue("sales.record", Collection::Sales, "s1", json!({}))
            .await
            .unwrap();
        queue
            .enqueue("sales.record", Collection::Sales, "s2", json!({}))
            .await
            .unwrap();

        queue.mark_synced(a.id, Utc::now()).await.unwrap();

        assert_eq!(queue.pending_count().await.unwrap(), 1);
        // The log itself keeps both entries.
        assert_eq!(queue.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_entries_still_count_as_pending() {
        let queue = test_queue().await;
        let entry = queue
            .enqueue("debts.payment", Collection::Debts, "d1", json!({}))
            .await
            .unwrap();

        queue.mark_failed(entry.id, "remote unreachable").await.unwrap();
        assert_eq!(queue.pending_count().await.unwrap(), 1);

        let stored = queue.get(entry.id).await.unwrap().unwrap();
        assert_eq!(stored.status, QueueStatus::Failed);
        assert_eq!(stored.error.as_deref(), Some("remote unreachable"));
    }

    #[tokio::test]
    async fn pending_is_ordered_oldest_first() {
        let queue = test_queue().await;
        let first = queue
            .enqueue("sales.record", Collection::Sales, "s1", json!({}))
            .await
            .unwrap();
        let second = queue
            .enqueue("sales.record", Collection::Sales, "s2", json!({}))
            .await
            .unwrap();

        let pending = queue.pending().await.unwrap();
        assert_eq!(pending[0].id, first.id);
        assert_eq!(pending[1].id, second.id);
    }

    #[tokio::test]
    async fn prune_removes_only_old_settled_entries() {
        let queue = test_queue().await;
        let old = queue
            .enqueue("sales.record", Collection::Sales, "s1", json!({}))
            .await
            .unwrap();
        let recent = queue
            .enqueue("sales.record", Collection::Sales, "s2", json!({}))
            .await
            .unwrap();
        let open = queue
            .enqueue("sales.record", Collection::Sales, "s3", json!({}))
            .await
            .unwrap();

        queue
            .mark_synced(old.id, Utc::now() - Duration::days(10))
            .await
            .unwrap();
        queue.mark_synced(recent.id, Utc::now()).await.unwrap();

        let pruned = queue.prune_synced(Duration::days(7)).await.unwrap();
        assert_eq!(pruned, 1);

        assert!(queue.get(old.id).await.unwrap().is_none());
        assert!(queue.get(recent.id).await.unwrap().is_some());
        assert!(queue.get(open.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_of_a_vanished_entry_is_a_no_op() {
        let queue = test_queue().await;
        queue.mark_synced(RecordId::new(), Utc::now()).await.unwrap();
        assert!(queue.is_empty().await.unwrap());
    }
}
