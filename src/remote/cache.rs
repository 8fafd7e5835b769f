//! Edge cache abstraction
//!
//! The edge cache is a shared key/value response store outside the request's
//! control. It is read-mostly and eventually consistent; writes are
//! best-effort and a failed write never fails a request.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors raised by cache writes
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache is full ({0} entries)")]
    Full(usize),

    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}

/// Request-shaped cache key: a synthetic URL plus an auth fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub url: String,
    pub auth: String,
}

/// A cached response body with its `max-age`
#[derive(Debug, Clone)]
pub struct CachedResponse {
    /// HTTP status of the cached response
    pub status: u16,

    /// Response body
    pub body: String,

    /// Freshness lifetime in seconds (`Cache-Control: max-age`)
    pub max_age: u64,

    /// When the entry was written
    pub stored_at: DateTime<Utc>,
}

impl CachedResponse {
    /// Creates an entry stamped with the current time
    pub fn new(status: u16, body: impl Into<String>, max_age: u64) -> Self {
        Self {
            status,
            body: body.into(),
            max_age,
            stored_at: Utc::now(),
        }
    }

    /// Returns the `Cache-Control` value this entry was stored with
    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.max_age)
    }

    /// Returns how long ago the entry was written
    pub fn age(&self) -> Duration {
        Utc::now() - self.stored_at
    }

    /// Checks whether the entry has outlived its `max-age`
    ///
    /// An entry stamped in the future (clock skew) counts as fresh.
    pub fn is_stale(&self) -> bool {
        u64::try_from(self.age().num_seconds()).is_ok_and(|secs| secs >= self.max_age)
    }
}

/// A shared response cache
#[async_trait]
pub trait EdgeCache: Send + Sync {
    /// Returns a fresh entry for `key`, if any
    async fn lookup(&self, key: &CacheKey) -> Option<CachedResponse>;

    /// Stores an entry; callers treat failures as non-fatal
    async fn put(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError>;
}

/// In-process [`EdgeCache`] backed by a `HashMap`
///
/// Stale entries behave as misses and are evicted when looked up or when the
/// cache needs room for a new entry.
#[derive(Debug)]
pub struct MemoryEdgeCache {
    entries: RwLock<HashMap<CacheKey, CachedResponse>>,
    max_entries: usize,
}

impl Default for MemoryEdgeCache {
    fn default() -> Self {
        Self::with_capacity(10_000)
    }
}

impl MemoryEdgeCache {
    /// Creates a cache holding at most `max_entries` entries
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Number of stored entries, fresh or stale
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Returns the entry if fresh, removing it otherwise
///
/// Runs under the write lock: a writer may have refreshed the entry since
/// the read lock saw it stale.
fn evict_if_stale(
    entries: &mut HashMap<CacheKey, CachedResponse>,
    key: &CacheKey,
) -> Option<CachedResponse> {
    match entries.get(key) {
        Some(entry) if !entry.is_stale() => Some(entry.clone()),
        Some(_) => {
            entries.remove(key);
            None
        }
        None => None,
    }
}

#[async_trait]
impl EdgeCache for MemoryEdgeCache {
    async fn lookup(&self, key: &CacheKey) -> Option<CachedResponse> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_stale() => return Some(entry.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        evict_if_stale(&mut *self.entries.write().await, key)
    }

    async fn put(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| !entry.is_stale());
            if entries.len() >= self.max_entries {
                return Err(CacheError::Full(self.max_entries));
            }
        }

        entries.insert(key, response);
        Ok(())
    }
}
