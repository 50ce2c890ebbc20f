use thiserror::Error;

use tillbook_store::StoreError;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync operation error.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The client is offline; draining requires a network connection.
    #[error("client is offline; sync requires network connection")]
    Offline,

    /// The transport refused or failed a push.
    #[error("transport error: {0}")]
    Transport(String),

    /// The underlying record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SyncError {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}
