use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{Asset, AssetFetcher, CachePolicy, CacheResult};

const DEFAULT_MAX_AGE_HOURS: i64 = 24;

#[derive(Debug, Clone)]
struct CachedAsset {
    asset: Asset,
    cached_at: DateTime<Utc>,
}

/// Local asset store answering requests by [`CachePolicy`].
///
/// Cloning is cheap and every clone shares the same entries, so one cache
/// can serve request handling and background revalidation at once. Staleness
/// never blocks a response by itself; it decides whether stale-while-
/// revalidate kicks off a refresh and what `purge_stale` drops.
#[derive(Clone)]
pub struct AssetCache {
    fetcher: Arc<dyn AssetFetcher>,
    entries: Arc<RwLock<HashMap<String, CachedAsset>>>,
    max_age: chrono::Duration,
}

impl AssetCache {
    pub fn new(fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            fetcher,
            entries: Arc::new(RwLock::new(HashMap::new())),
            max_age: chrono::Duration::hours(DEFAULT_MAX_AGE_HOURS),
        }
    }

    /// Age after which a cached entry counts as stale.
    pub fn with_max_age(mut self, max_age: chrono::Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Install-time warm-up: fetch and store the whole app shell.
    ///
    /// Fails on the first path the origin cannot serve, leaving whatever was
    /// already fetched in place; the caller retries the install later.
    pub async fn precache(&self, paths: &[&str]) -> CacheResult<()> {
        for path in paths {
            self.fetch_and_store(path).await?;
        }
        tracing::info!(count = paths.len(), "precached app shell");
        Ok(())
    }

    /// Answer one request under the policy its path classifies into.
    pub async fn fetch(&self, path: &str) -> CacheResult<Asset> {
        let policy = CachePolicy::for_path(path);
        tracing::trace!(%path, %policy, "asset request");
        match policy {
            CachePolicy::CacheFirst => self.cache_first(path).await,
            CachePolicy::StaleWhileRevalidate => self.stale_while_revalidate(path).await,
            CachePolicy::NetworkFirst => self.network_first(path).await,
        }
    }

    /// Activation-time cleanup: drop every entry older than `max_age`.
    pub async fn purge_stale(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_stale(entry));
        let purged = before - entries.len();
        if purged > 0 {
            tracing::info!(purged, "dropped stale cached assets");
        }
        purged
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn cache_first(&self, path: &str) -> CacheResult<Asset> {
        if let Some(entry) = self.lookup(path).await {
            return Ok(entry.asset);
        }
        self.fetch_and_store(path).await
    }

    async fn stale_while_revalidate(&self, path: &str) -> CacheResult<Asset> {
        match self.lookup(path).await {
            Some(entry) => {
                if self.is_stale(&entry) {
                    self.spawn_revalidation(path.to_string());
                }
                Ok(entry.asset)
            }
            None => self.fetch_and_store(path).await,
        }
    }

    async fn network_first(&self, path: &str) -> CacheResult<Asset> {
        match self.fetch_and_store(path).await {
            Ok(asset) => Ok(asset),
            Err(err) => match self.lookup(path).await {
                Some(entry) => {
                    tracing::debug!(%path, "network failed, serving cached fallback");
                    Ok(entry.asset)
                }
                None => Err(err),
            },
        }
    }

    /// Refresh a stale entry without blocking the response that hit it.
    fn spawn_revalidation(&self, path: String) {
        let cache = self.clone();
        tokio::spawn(async move {
            match cache.fetch_and_store(&path).await {
                Ok(_) => tracing::debug!(%path, "revalidated stale asset"),
                Err(err) => {
                    // The stale copy stays; the next stale hit retries.
                    tracing::debug!(%path, error = %err, "revalidation failed");
                }
            }
        });
    }

    async fn fetch_and_store(&self, path: &str) -> CacheResult<Asset> {
        let asset = self.fetcher.fetch(path).await?;
        let mut entries = self.entries.write().await;
        entries.insert(
            path.to_string(),
            CachedAsset {
                asset: asset.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(asset)
    }

    async fn lookup(&self, path: &str) -> Option<CachedAsset> {
        self.entries.read().await.get(path).cloned()
    }

    fn is_stale(&self, entry: &CachedAsset) -> bool {
        Utc::now().signed_duration_since(entry.cached_at) > self.max_age
    }
}
