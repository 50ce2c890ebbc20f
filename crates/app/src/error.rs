use thiserror::Error;

use tillbook_core::DomainError;
use tillbook_store::StoreError;
use tillbook_sync::SyncError;

pub type AppResult<T> = Result<T, AppError>;

/// Anything an app operation can fail with.
///
/// The UI treats these as transient notifications; none of them poison the
/// local state.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Failures wiring the app together (data directory, database pool).
    #[error(transparent)]
    Setup(#[from] anyhow::Error),
}
