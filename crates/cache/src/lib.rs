//! `tillbook-cache` — policy-driven caching for app-shell assets.
//!
//! The shop client has to open instantly with no network, so its static
//! assets are kept in a local cache and served by policy: immutable assets
//! cache-first, documents stale-while-revalidate, API-shaped paths
//! network-first with a cached fallback. Entries age out against a
//! configurable `max_age`.

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod policy;

pub use cache::AssetCache;
pub use error::{CacheError, CacheResult};
pub use fetcher::{Asset, AssetFetcher, ScriptedFetcher};
pub use policy::CachePolicy;
