use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use tillbook_core::Record;

use crate::{Collection, StoreError};

/// Keyed JSON document store, one namespace per [`Collection`].
///
/// ## Contract
///
/// - `init()` prepares the backend and is idempotent; every other operation
///   assumes it has been called once.
/// - Keys are strings (record ids in their display form). Values are whole
///   JSON documents; the store never looks inside them.
/// - `add` is create-only and fails with [`StoreError::AlreadyExists`] on a
///   duplicate key. `put` is insert-or-replace.
/// - `get` on a missing key is `Ok(None)`, not an error. `delete` on a
///   missing key succeeds. `get_all` returns records in no particular order.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Prepare the backend (create collections/schema). Idempotent.
    async fn init(&self) -> Result<(), StoreError>;

    /// Insert a new record under `id`. Fails if the key already exists.
    async fn add(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError>;

    /// Insert or replace the record under `id`.
    async fn put(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError>;

    /// Fetch one record by key.
    async fn get(&self, collection: Collection, id: &str)
    -> Result<Option<JsonValue>, StoreError>;

    /// Fetch every record in the collection, in no particular order.
    async fn get_all(&self, collection: Collection) -> Result<Vec<JsonValue>, StoreError>;

    /// Remove one record. Removing a missing key is not an error.
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError>;

    /// Remove every record in the collection.
    async fn clear(&self, collection: Collection) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    async fn init(&self) -> Result<(), StoreError> {
        (**self).init().await
    }

    async fn add(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        (**self).add(collection, id, value).await
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        (**self).put(collection, id, value).await
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<JsonValue>, StoreError> {
        (**self).get(collection, id).await
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<JsonValue>, StoreError> {
        (**self).get_all(collection).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        (**self).delete(collection, id).await
    }

    async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
        (**self).clear(collection).await
    }
}

/// Typed convenience layer over the raw JSON interface.
///
/// Domain types implement [`Record`]; these helpers serialize them and use
/// the record's own id as the storage key.
#[async_trait]
pub trait RecordStoreExt: RecordStore {
    async fn add_record<R>(&self, collection: Collection, record: &R) -> Result<(), StoreError>
    where
        R: Record + Serialize + Sync,
    {
        let id = record.record_id().to_string();
        let value = serde_json::to_value(record)?;
        self.add(collection, &id, value).await
    }

    async fn put_record<R>(&self, collection: Collection, record: &R) -> Result<(), StoreError>
    where
        R: Record + Serialize + Sync,
    {
        let id = record.record_id().to_string();
        let value = serde_json::to_value(record)?;
        self.put(collection, &id, value).await
    }

    async fn get_record<T>(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        match self.get(collection, id).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn get_all_records<T>(&self, collection: Collection) -> Result<Vec<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        self.get_all(collection)
            .await?
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(StoreError::from))
            .collect()
    }
}

impl<S> RecordStoreExt for S where S: RecordStore + ?Sized {}
