use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::{CacheError, CacheResult};

/// A fetched asset body with its media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Asset {
    pub fn new(content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

/// Where assets come from when the cache cannot answer.
///
/// The client has no real origin server yet, so the only shipped
/// implementation replays scripted responses. An HTTP implementation would
/// slot in behind the same seam.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch one path from the network.
    async fn fetch(&self, path: &str) -> CacheResult<Asset>;
}

/// Stand-in fetcher serving a scripted route table.
///
/// Routes can be swapped at runtime to emulate a deployment, and the whole
/// origin can be flagged unreachable, which is enough to exercise every
/// policy path. The fetch counter tells tests how often the network was hit.
pub struct ScriptedFetcher {
    latency: Duration,
    routes: Mutex<HashMap<String, Asset>>,
    reachable: AtomicBool,
    fetches: AtomicU64,
}

impl ScriptedFetcher {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            routes: Mutex::new(HashMap::new()),
            reachable: AtomicBool::new(true),
            fetches: AtomicU64::new(0),
        }
    }

    /// No artificial delay; the usual choice in tests.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Script what the origin returns for `path`, replacing any prior body.
    pub fn serve(&self, path: impl Into<String>, asset: Asset) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(path.into(), asset);
        }
    }

    /// Flag the origin reachable or unreachable.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// How many fetches reached the origin, including failed ones.
    pub fn fetch_count(&self) -> u64 {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedFetcher {
    fn default() -> Self {
        Self::instant()
    }
}

#[async_trait]
impl AssetFetcher for ScriptedFetcher {
    async fn fetch(&self, path: &str) -> CacheResult<Asset> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if !self.reachable.load(Ordering::SeqCst) {
            return Err(CacheError::network(path, "origin unreachable"));
        }

        let routes = self
            .routes
            .lock()
            .map_err(|_| CacheError::network(path, "route table lock poisoned"))?;
        match routes.get(path) {
            Some(asset) => Ok(asset.clone()),
            None => Err(CacheError::network(path, "404 not found")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_routes_are_served() {
        let fetcher = ScriptedFetcher::instant();
        fetcher.serve("/app.js", Asset::new("text/javascript", "console.log(1)"));

        let asset = fetcher.fetch("/app.js").await.unwrap();
        assert_eq!(asset.content_type, "text/javascript");
        assert_eq!(asset.body, b"console.log(1)");
        assert_eq!(fetcher.fetch_count(), 1);
    }

    #[tokio::test]
    async fn unknown_paths_are_misses() {
        let fetcher = ScriptedFetcher::instant();
        let err = fetcher.fetch("/nope.css").await.unwrap_err();
        assert!(matches!(err, CacheError::Network { .. }));
    }

    #[tokio::test]
    async fn unreachable_origin_rejects_known_routes() {
        let fetcher = ScriptedFetcher::instant();
        fetcher.serve("/app.js", Asset::new("text/javascript", "x"));
        fetcher.set_reachable(false);

        assert!(fetcher.fetch("/app.js").await.is_err());
        // Failed attempts still count as network traffic.
        assert_eq!(fetcher.fetch_count(), 1);
    }
}
