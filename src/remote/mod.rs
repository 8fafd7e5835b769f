//! Remote configuration module
//!
//! Fetches the per-hostname override bundle from the config service and keeps
//! it in an edge cache for the configured TTL.

mod cache;
mod fetcher;

pub use cache::{CacheError, CacheKey, CachedResponse, EdgeCache, MemoryEdgeCache};
pub use fetcher::{
    build_http_client, RemoteConfig, RemoteConfigError, RemoteConfigFetcher, API_KEY_HEADER,
};
