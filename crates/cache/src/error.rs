use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The network fetch failed and no cached copy could stand in.
    #[error("failed to fetch {path}: {reason}")]
    Network { path: String, reason: String },
}

impl CacheError {
    pub fn network(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
