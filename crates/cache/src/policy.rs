use std::fmt;

/// How a request path should be answered.
///
/// Classification mirrors what an offline-first shell needs: hashed
/// immutable assets never change under the same path, documents should
/// stay fresh but never block, and API responses are only a fallback of
/// last resort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve the cached copy when present, hit the network only on a miss.
    /// Scripts, styles, images and fonts.
    CacheFirst,
    /// Serve the cached copy immediately and refresh it in the background
    /// when it has gone stale. Documents and navigations.
    StaleWhileRevalidate,
    /// Always try the network, fall back to the cache when it fails.
    /// API-shaped paths.
    NetworkFirst,
}

const CACHE_FIRST_EXTENSIONS: &[&str] = &[
    "js", "mjs", "css", "png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf",
];

impl CachePolicy {
    /// Classify a request path by prefix and extension.
    pub fn for_path(path: &str) -> Self {
        let path = path.split_once('?').map_or(path, |(base, _)| base);
        if path == "/api" || path.starts_with("/api/") {
            return Self::NetworkFirst;
        }
        match path.rsplit_once('.') {
            Some((_, ext)) if CACHE_FIRST_EXTENSIONS.contains(&ext) => Self::CacheFirst,
            _ => Self::StaleWhileRevalidate,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CacheFirst => "cache_first",
            Self::StaleWhileRevalidate => "stale_while_revalidate",
            Self::NetworkFirst => "network_first",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
