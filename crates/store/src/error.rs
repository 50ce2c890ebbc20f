use thiserror::Error;

use crate::Collection;

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Record store operation error.
///
/// These are **storage errors**, as opposed to domain errors (validation,
/// invariants) which are rejected before anything reaches the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `add` refused to overwrite an existing record. Use `put` to replace.
    #[error("record '{id}' already exists in '{collection}'")]
    AlreadyExists { collection: Collection, id: String },

    /// A record body could not be (de)serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend itself failed (I/O, SQL, poisoned lock).
    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn already_exists(collection: Collection, id: impl Into<String>) -> Self {
        Self::AlreadyExists {
            collection,
            id: id.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
