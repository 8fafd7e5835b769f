//! Remote config fetching against a mock config service

use async_trait::async_trait;
use botmon_edge::config::{Mode, RemoteSettings};
use botmon_edge::remote::{
    CacheError, CacheKey, CachedResponse, EdgeCache, MemoryEdgeCache, RemoteConfig,
    RemoteConfigFetcher,
};
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUNDLE: &str = r#"{
    "robotsTxt": {"enabled": true, "mode": "merge", "content": "User-agent: GPTBot\nDisallow: /"},
    "geo": {"enabled": true, "rules": [{"urlPattern": "/docs/**", "pageType": "docs"}]}
}"#;

fn settings(endpoint: &str) -> RemoteSettings {
    RemoteSettings {
        endpoint: endpoint.to_string(),
        api_key: Some("test-key".to_string()),
        cache_ttl_seconds: 60,
        timeout_seconds: 2,
    }
}

fn fetcher(endpoint: &str, cache: Arc<dyn EdgeCache>) -> RemoteConfigFetcher {
    RemoteConfigFetcher::new(&settings(endpoint), cache).expect("fetcher builds")
}

/// A cache that never hits and fails every write
struct BrokenCache;

#[async_trait]
impl EdgeCache for BrokenCache {
    async fn lookup(&self, _key: &CacheKey) -> Option<CachedResponse> {
        None
    }

    async fn put(&self, _key: CacheKey, _response: CachedResponse) -> Result<(), CacheError> {
        Err(CacheError::Unavailable("read-only".to_string()))
    }
}

#[tokio::test]
async fn test_found_bundle_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sdk-config/shop.example.com"))
        .and(header("x-api-key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BUNDLE))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryEdgeCache::default());
    let fetcher = fetcher(&server.uri(), cache.clone());

    let first = fetcher.fetch("shop.example.com").await;
    let bundle = first.bundle().expect("bundle found");
    let robots = bundle.robots_txt.as_ref().expect("robots section");
    assert_eq!(robots.mode, Some(Mode::Merge));

    // Served from cache; the mock's expect(1) verifies no second request
    let second = fetcher.fetch("shop.example.com").await;
    assert_eq!(first, second);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_not_found_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sdk-config/none.example.com"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), Arc::new(MemoryEdgeCache::default()));

    assert_eq!(fetcher.fetch("none.example.com").await, RemoteConfig::NotFound);
    assert_eq!(fetcher.fetch("none.example.com").await, RemoteConfig::NotFound);
}

#[tokio::test]
async fn test_server_error_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sdk-config/flaky.example.com"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryEdgeCache::default());
    let fetcher = fetcher(&server.uri(), cache.clone());

    assert!(matches!(
        fetcher.fetch("flaky.example.com").await,
        RemoteConfig::Unavailable(_)
    ));
    assert!(matches!(
        fetcher.fetch("flaky.example.com").await,
        RemoteConfig::Unavailable(_)
    ));
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_malformed_bundle_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), Arc::new(MemoryEdgeCache::default()));
    assert!(matches!(
        fetcher.fetch("a.example.com").await,
        RemoteConfig::Unavailable(_)
    ));
}

#[tokio::test]
async fn test_network_error_is_unavailable() {
    // Nothing listens on port 1
    let fetcher = fetcher("http://127.0.0.1:1", Arc::new(MemoryEdgeCache::default()));
    assert!(matches!(
        fetcher.fetch("a.example.com").await,
        RemoteConfig::Unavailable(_)
    ));
}

#[tokio::test]
async fn test_cache_write_failure_still_returns_bundle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sdk-config/shop.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(BUNDLE))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = fetcher(&server.uri(), Arc::new(BrokenCache));

    assert!(fetcher.fetch("shop.example.com").await.bundle().is_some());
    assert!(fetcher.fetch("shop.example.com").await.bundle().is_some());
}
