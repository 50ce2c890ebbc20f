use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::{Collection, StoreError};

use super::r#trait::RecordStore;

/// In-memory record store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<Collection, HashMap<String, JsonValue>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::storage("lock poisoned"))?;
        for collection in Collection::ALL {
            collections.entry(collection).or_default();
        }
        Ok(())
    }

    async fn add(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::storage("lock poisoned"))?;
        let records = collections.entry(collection).or_default();
        if records.contains_key(id) {
            return Err(StoreError::already_exists(collection, id));
        }
        records.insert(id.to_string(), value);
        Ok(())
    }

    async fn put(
        &self,
        collection: Collection,
        id: &str,
        value: JsonValue,
    ) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::storage("lock poisoned"))?;
        collections
            .entry(collection)
            .or_default()
            .insert(id.to_string(), value);
        Ok(())
    }

    async fn get(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<JsonValue>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::storage("lock poisoned"))?;
        Ok(collections
            .get(&collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn get_all(&self, collection: Collection) -> Result<Vec<JsonValue>, StoreError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| StoreError::storage("lock poisoned"))?;
        Ok(collections
            .get(&collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::storage("lock poisoned"))?;
        if let Some(records) = collections.get_mut(&collection) {
            records.remove(id);
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> Result<(), StoreError> {
        let mut collections = self
            .collections
            .write()
            .map_err(|_| StoreError::storage("lock poisoned"))?;
        if let Some(records) = collections.get_mut(&collection) {
            records.clear();
        }
        Ok(())
    }
}
