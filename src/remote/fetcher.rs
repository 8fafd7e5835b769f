//! Remote config bundle fetcher
//!
//! # Request Flow
//!
//! 1. Look up the hostname's bundle in the edge cache
//! 2. On a miss, `GET <endpoint>/v1/sdk-config/<hostname>` with the API key
//! 3. Classify the answer:
//!
//! | Answer | Result | Cached |
//! |--------|--------|--------|
//! | HTTP 2xx | `Found(bundle)` | yes, for the TTL |
//! | HTTP 404 | `NotFound` | yes, as a `null` sentinel |
//! | other status | `Unavailable` | no |
//! | network / decode error | `Unavailable` | no |
//!
//! Transient failures are never cached so the next request retries them.

use crate::config::{ConfigOverrides, RemoteSettings};
use crate::remote::cache::{CacheKey, CachedResponse, EdgeCache};
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Header carrying the API key on config requests
pub const API_KEY_HEADER: &str = "x-api-key";

/// Host of the synthetic URLs used as cache keys
const CACHE_KEY_HOST: &str = "botmon-config.cache";

/// Cached body meaning "checked, no config for this hostname"
const NOT_FOUND_SENTINEL: &str = "null";

/// Errors while fetching a remote bundle
///
/// These never escape [`RemoteConfigFetcher::fetch`]; they become
/// [`RemoteConfig::Unavailable`].
#[derive(Debug, Error)]
pub enum RemoteConfigError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0} from config endpoint")]
    Status(u16),

    #[error("Invalid config bundle: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid config endpoint: {0}")]
    Endpoint(String),
}

/// Outcome of looking up a hostname's bundle
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteConfig {
    /// A bundle exists for the hostname
    Found(ConfigOverrides),
    /// The service answered authoritatively that there is no bundle
    NotFound,
    /// The lookup failed; the caller falls back to defaults
    Unavailable(String),
}

impl RemoteConfig {
    /// Returns the bundle, treating both "none" and "failed" as absent
    pub fn into_bundle(self) -> Option<ConfigOverrides> {
        match self {
            Self::Found(bundle) => Some(bundle),
            Self::NotFound | Self::Unavailable(_) => None,
        }
    }

    pub fn bundle(&self) -> Option<&ConfigOverrides> {
        match self {
            Self::Found(bundle) => Some(bundle),
            Self::NotFound | Self::Unavailable(_) => None,
        }
    }
}

/// Builds the HTTP client used for outbound calls
///
/// Timeouts live here, at the network level; the pipeline itself has none.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(format!("botmon-edge/{}", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches and edge-caches one config bundle per hostname
pub struct RemoteConfigFetcher {
    client: Client,
    endpoint: Url,
    api_key: String,
    ttl_seconds: u64,
    cache: Arc<dyn EdgeCache>,
}

impl std::fmt::Debug for RemoteConfigFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // api_key omitted
        f.debug_struct("RemoteConfigFetcher")
            .field("endpoint", &self.endpoint.as_str())
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl RemoteConfigFetcher {
    /// Creates a fetcher from the `[remote]` settings
    ///
    /// # Returns
    ///
    /// * `Ok(RemoteConfigFetcher)` - Ready to fetch
    /// * `Err(RemoteConfigError)` - Bad endpoint, or the HTTP client failed to build
    pub fn new(
        settings: &RemoteSettings,
        cache: Arc<dyn EdgeCache>,
    ) -> Result<Self, RemoteConfigError> {
        let endpoint = Url::parse(&settings.endpoint)
            .map_err(|e| RemoteConfigError::Endpoint(format!("{}: {}", settings.endpoint, e)))?;
        let client = build_http_client(Duration::from_secs(settings.timeout_seconds))?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone().unwrap_or_default(),
            ttl_seconds: settings.cache_ttl_seconds,
            cache,
        })
    }

    /// Returns the config endpoint URL for a hostname
    pub fn config_url(&self, hostname: &str) -> Result<Url, RemoteConfigError> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RemoteConfigError::Endpoint(format!("{} cannot be a base URL", self.endpoint))
            })?
            .pop_if_empty()
            .extend(["v1", "sdk-config", hostname]);
        Ok(url)
    }

    /// Returns the cache key for a hostname
    ///
    /// The key carries a SHA-256 fingerprint of the API key rather than the key
    /// itself, so bundles fetched with different keys never mix.
    pub fn cache_key(&self, hostname: &str) -> CacheKey {
        let encoded: String = url::form_urlencoded::byte_serialize(hostname.as_bytes()).collect();
        let mut hasher = Sha256::new();
        hasher.update(self.api_key.as_bytes());

        CacheKey {
            url: format!("https://{}/v1/sdk-config/{}", CACHE_KEY_HOST, encoded),
            auth: hex::encode(hasher.finalize()),
        }
    }

    /// Looks up the bundle for `hostname`, from cache or network
    ///
    /// Never fails: problems are reported as [`RemoteConfig::Unavailable`].
    pub async fn fetch(&self, hostname: &str) -> RemoteConfig {
        let key = self.cache_key(hostname);

        if let Some(cached) = self.cache.lookup(&key).await {
            match serde_json::from_str::<Option<ConfigOverrides>>(&cached.body) {
                Ok(Some(bundle)) => {
                    tracing::debug!(hostname, "Remote config served from cache");
                    return RemoteConfig::Found(bundle);
                }
                Ok(None) => {
                    tracing::debug!(hostname, "Cached: no remote config for hostname");
                    return RemoteConfig::NotFound;
                }
                Err(e) => {
                    tracing::debug!(hostname, error = %e, "Ignoring undecodable cache entry");
                }
            }
        }

        match self.fetch_from_network(hostname).await {
            Ok(Some((body, bundle))) => {
                self.store(key, body).await;
                RemoteConfig::Found(bundle)
            }
            Ok(None) => {
                self.store(key, NOT_FOUND_SENTINEL.to_string()).await;
                RemoteConfig::NotFound
            }
            Err(e) => {
                tracing::warn!(hostname, error = %e, "Remote config unavailable, using defaults");
                RemoteConfig::Unavailable(e.to_string())
            }
        }
    }

    /// Performs the network request
    ///
    /// `Ok(None)` means the service answered 404.
    async fn fetch_from_network(
        &self,
        hostname: &str,
    ) -> Result<Option<(String, ConfigOverrides)>, RemoteConfigError> {
        let url = self.config_url(hostname)?;

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(RemoteConfigError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let bundle: ConfigOverrides = serde_json::from_str(&body)?;
        Ok(Some((body, bundle)))
    }

    /// Best-effort cache write
    async fn store(&self, key: CacheKey, body: String) {
        let entry = CachedResponse::new(200, body, self.ttl_seconds);
        if let Err(e) = self.cache.put(key, entry).await {
            tracing::debug!(error = %e, "Failed to cache remote config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::cache::MemoryEdgeCache;

    fn fetcher(endpoint: &str, api_key: &str) -> RemoteConfigFetcher {
        let settings = RemoteSettings {
            endpoint: endpoint.to_string(),
            api_key: Some(api_key.to_string()),
            cache_ttl_seconds: 60,
            timeout_seconds: 5,
        };
        RemoteConfigFetcher::new(&settings, Arc::new(MemoryEdgeCache::default())).unwrap()
    }

    #[test]
    fn test_config_url() {
        let f = fetcher("https://api.botmon.example", "k");
        assert_eq!(
            f.config_url("shop.example.com").unwrap().as_str(),
            "https://api.botmon.example/v1/sdk-config/shop.example.com"
        );
    }

    #[test]
    fn test_config_url_keeps_base_path() {
        let f = fetcher("https://api.botmon.example/edge/", "k");
        assert_eq!(
            f.config_url("a.com").unwrap().as_str(),
            "https://api.botmon.example/edge/v1/sdk-config/a.com"
        );
    }

    #[test]
    fn test_config_url_encodes_hostname() {
        let f = fetcher("https://api.botmon.example", "k");
        let url = f.config_url("bad host/x").unwrap();
        assert!(url.as_str().ends_with("/v1/sdk-config/bad%20host%2Fx"));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let settings = RemoteSettings {
            endpoint: "not a url".to_string(),
            api_key: Some("k".to_string()),
            cache_ttl_seconds: 60,
            timeout_seconds: 5,
        };
        let result = RemoteConfigFetcher::new(&settings, Arc::new(MemoryEdgeCache::default()));
        assert!(matches!(result, Err(RemoteConfigError::Endpoint(_))));
    }

    #[test]
    fn test_cache_key_depends_on_host_and_api_key() {
        let a = fetcher("https://api.botmon.example", "key-a");
        let b = fetcher("https://api.botmon.example", "key-b");

        assert_eq!(a.cache_key("x.com"), a.cache_key("x.com"));
        assert_ne!(a.cache_key("x.com"), a.cache_key("y.com"));
        assert_ne!(a.cache_key("x.com"), b.cache_key("x.com"));
        assert!(!a.cache_key("x.com").auth.contains("key-a"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let f = fetcher("https://api.botmon.example", "secret-key");
        assert!(!format!("{:?}", f).contains("secret-key"));
    }

    #[test]
    fn test_into_bundle() {
        assert!(RemoteConfig::Found(ConfigOverrides::default())
            .into_bundle()
            .is_some());
        assert!(RemoteConfig::NotFound.into_bundle().is_none());
        assert!(RemoteConfig::Unavailable("down".to_string())
            .into_bundle()
            .is_none());
    }
}
