use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use tillbook_core::RecordId;
use tillbook_store::Collection;

/// Status of a queued sync entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatus {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Syncing => "syncing",
            QueueStatus::Synced => "synced",
            QueueStatus::Failed => "failed",
        }
    }

    /// Pending and Failed entries both await a (re)try.
    pub fn is_outstanding(&self) -> bool {
        matches!(self, QueueStatus::Pending | QueueStatus::Failed)
    }
}

impl core::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One queued mutation awaiting a push to the (future) backend.
///
/// `data` is a snapshot of the record at enqueue time; if the record is
/// deleted before a sync happens, the snapshot is what gets pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncQueueEntry {
    pub id: RecordId,
    /// Dotted action name, e.g. `sales.record` or `inventory.adjust`.
    pub action: String,
    pub collection: Collection,
    /// Storage key of the record this entry refers to.
    pub record_id: String,
    pub data: JsonValue,
    pub queued_at: DateTime<Utc>,
    pub status: QueueStatus,
    pub synced_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl SyncQueueEntry {
    pub fn new(
        action: impl Into<String>,
        collection: Collection,
        record_id: impl Into<String>,
        data: JsonValue,
        queued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RecordId::new(),
            action: action.into(),
            collection,
            record_id: record_id.into(),
            data,
            queued_at,
            status: QueueStatus::Pending,
            synced_at: None,
            error: None,
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.status.is_outstanding()
    }

    pub fn mark_syncing(&mut self) {
        self.status = QueueStatus::Syncing;
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.status = QueueStatus::Synced;
        self.synced_at = Some(at);
        self.error = None;
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = QueueStatus::Failed;
        self.error = Some(error.into());
    }

    /// Move a failed entry back to pending and clear the error.
    pub fn retry(&mut self) {
        if self.status == QueueStatus::Failed {
            self.status = QueueStatus::Pending;
            self.error = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_entry() -> SyncQueueEntry {
        SyncQueueEntry::new(
            "sales.record",
            Collection::Sales,
            "s1",
            json!({"id": "s1", "synced": false}),
            Utc::now(),
        )
    }

    #[test]
    fn new_entry_is_pending() {
        let entry = test_entry();
        assert_eq!(entry.status, QueueStatus::Pending);
        assert!(entry.is_outstanding());
        assert!(entry.synced_at.is_none());
    }

    #[test]
    fn synced_entry_is_settled() {
        let mut entry = test_entry();
        entry.mark_failed("remote unreachable");
        assert!(entry.is_outstanding());
        assert_eq!(entry.error.as_deref(), Some("remote unreachable"));

        entry.mark_synced(Utc::now());
        assert!(!entry.is_outstanding());
        assert!(entry.synced_at.is_some());
        assert!(entry.error.is_none());
    }

    #[test]
    fn retry_only_applies_to_failed_entries() {
        let mut entry = test_entry();
        entry.mark_synced(Utc::now());
        entry.retry();
        assert_eq!(entry.status, QueueStatus::Synced);

        let mut failed = test_entry();
        failed.mark_failed("boom");
        failed.retry();
        assert_eq!(failed.status, QueueStatus::Pending);
        assert!(failed.error.is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        let entry = test_entry();
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["status"].as_str(), Some("pending"));
        assert_eq!(value["collection"].as_str(), Some("sales"));
    }
}
