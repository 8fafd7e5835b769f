//! End-to-end request processing through the middleware

use botmon_edge::config::{
    ConfigOverrides, GeoOverride, ManagedFileOverride, Mode, RemoteSettings, WellKnownFileOverride,
    WellKnownOverride,
};
use botmon_edge::geo::{GEO_HEADER, PAGE_TYPE_HEADER};
use botmon_edge::managed::{MANAGED_HEADER, MODE_HEADER};
use botmon_edge::pipeline::{EdgeMiddleware, OriginError, Stage};
use botmon_edge::remote::{MemoryEdgeCache, RemoteConfigFetcher};
use botmon_edge::{EdgeRequest, EdgeResponse};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Request, Response, StatusCode};
use robotstxt::DefaultMatcher;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORIGIN_ROBOTS: &str = "User-agent: *\nAllow: /";

const ORIGIN_SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://shop.example.com/</loc></url>
  <url><loc>https://shop.example.com/products/widget</loc></url>
</urlset>"#;

const PRODUCT_HTML: &str = r#"<html><head>
<title>Widget Pro</title>
<meta name="description" content="The Widget Pro is a durable widget for everyday tinkering.">
</head><body>
<h1>Widget Pro</h1>
<p>Price: $49.99</p>
<h2>Details</h2>
</body></html>"#;

const DOCS_HTML: &str = r#"<html><head><title>Getting started</title></head><body>
<h1>Getting started</h1>
<p>Install the package and point it at your origin server to begin serving requests.</p>
</body></html>"#;

/// A small origin site
async fn site(request: EdgeRequest) -> Result<EdgeResponse, OriginError> {
    let (content_type, body): (&str, &'static str) = match request.uri().path() {
        "/robots.txt" => ("text/plain", ORIGIN_ROBOTS),
        "/sitemap.xml" => ("application/xml", ORIGIN_SITEMAP),
        "/products/widget" => ("text/html; charset=utf-8", PRODUCT_HTML),
        "/docs/intro" => ("text/html; charset=utf-8", DOCS_HTML),
        _ => {
            return Ok(Response::builder()
                .status(404)
                .body(Bytes::from_static(b"not found"))
                .expect("valid response"))
        }
    };
    Ok(Response::builder()
        .status(200)
        .header(CONTENT_TYPE, content_type)
        .body(Bytes::from_static(body.as_bytes()))
        .expect("valid response"))
}

fn request(path: &str, user_agent: &str) -> EdgeRequest {
    Request::builder()
        .method("GET")
        .uri(path)
        .header(HOST, "shop.example.com")
        .header(USER_AGENT, user_agent)
        .body(Bytes::new())
        .expect("valid request")
}

fn body(response: &EdgeResponse) -> &str {
    std::str::from_utf8(response.body()).expect("utf-8 body")
}

fn robots(mode: Mode, content: &str) -> ConfigOverrides {
    ConfigOverrides {
        robots_txt: Some(ManagedFileOverride {
            enabled: Some(true),
            mode: Some(mode),
            content: Some(content.to_string()),
        }),
        ..ConfigOverrides::default()
    }
}

fn geo_enabled() -> ConfigOverrides {
    ConfigOverrides {
        geo: Some(GeoOverride {
            enabled: Some(true),
            ..GeoOverride::default()
        }),
        ..ConfigOverrides::default()
    }
}

#[tokio::test]
async fn test_robots_replace() {
    let middleware = EdgeMiddleware::new(robots(Mode::Replace, "User-agent: *\nDisallow: /"));
    let outcome = middleware
        .process(request("/robots.txt", "curl/8.0"), &site)
        .await;

    assert_eq!(outcome.stages_applied, vec![Stage::RobotsTxt]);
    assert_eq!(outcome.response.status(), StatusCode::OK);
    assert_eq!(body(&outcome.response), "User-agent: *\nDisallow: /");
    assert_eq!(outcome.response.headers()[&MODE_HEADER], "replace");
    assert_eq!(outcome.response.headers()[&MANAGED_HEADER], "robots-txt");
}

#[tokio::test]
async fn test_robots_merge_managed_rules_win() {
    let middleware = EdgeMiddleware::new(robots(Mode::Merge, "User-agent: *\nDisallow: /private"));
    let response = middleware
        .handle(request("/robots.txt", "curl/8.0"), &site)
        .await;
    let merged = body(&response);

    assert!(merged.contains("Disallow: /private"));
    assert!(!merged.lines().any(|line| line.trim() == "Allow: /"));

    let mut matcher = DefaultMatcher::default();
    assert!(!matcher.one_agent_allowed_by_robots(
        merged,
        "SomeBot",
        "https://shop.example.com/private/page"
    ));
    let mut matcher = DefaultMatcher::default();
    assert!(matcher.one_agent_allowed_by_robots(
        merged,
        "SomeBot",
        "https://shop.example.com/public/page"
    ));
}

#[tokio::test]
async fn test_robots_append_keeps_origin_first() {
    let middleware = EdgeMiddleware::new(robots(Mode::Append, "User-agent: GPTBot\nDisallow: /"));
    let response = middleware
        .handle(request("/robots.txt", "curl/8.0"), &site)
        .await;
    let appended = body(&response);

    assert!(appended.starts_with(ORIGIN_ROBOTS));
    assert!(appended.ends_with("User-agent: GPTBot\nDisallow: /"));
    assert_eq!(response.headers()[&MODE_HEADER], "append");
}

#[tokio::test]
async fn test_sitemap_merge_deduplicates() {
    let overrides = ConfigOverrides {
        sitemap: Some(ManagedFileOverride {
            enabled: Some(true),
            mode: Some(Mode::Merge),
            content: Some(
                r#"<urlset>
                  <url><loc>https://shop.example.com/products/widget</loc></url>
                  <url><loc>https://shop.example.com/blog/launch</loc></url>
                </urlset>"#
                    .to_string(),
            ),
        }),
        ..ConfigOverrides::default()
    };
    let middleware = EdgeMiddleware::new(overrides);
    let outcome = middleware
        .process(request("/sitemap.xml", "curl/8.0"), &site)
        .await;
    let merged = body(&outcome.response);

    assert_eq!(outcome.stages_applied, vec![Stage::Sitemap]);
    assert_eq!(merged.matches("<loc>").count(), 3);
    assert_eq!(merged.matches("/products/widget</loc>").count(), 1);
    assert!(merged.contains("https://shop.example.com/blog/launch"));
}

#[tokio::test]
async fn test_well_known_served_and_disabled() {
    let overrides = ConfigOverrides {
        well_known: Some(WellKnownOverride {
            enabled: Some(true),
            files: Some(vec![
                WellKnownFileOverride {
                    filename: "ai-plugin.json".to_string(),
                    mode: Some(Mode::Replace),
                    content: Some(r#"{"name":"shop"}"#.to_string()),
                },
                WellKnownFileOverride {
                    filename: "security.txt".to_string(),
                    mode: Some(Mode::Disabled),
                    content: Some("Contact: ops@example.com".to_string()),
                },
            ]),
        }),
        ..ConfigOverrides::default()
    };
    let middleware = EdgeMiddleware::new(overrides);

    let plugin = middleware
        .handle(request("/.well-known/ai-plugin.json", "curl/8.0"), &site)
        .await;
    assert_eq!(plugin.status(), StatusCode::OK);
    assert_eq!(plugin.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(body(&plugin), r#"{"name":"shop"}"#);

    let security = middleware
        .handle(request("/.well-known/security.txt", "curl/8.0"), &site)
        .await;
    assert_eq!(security.status(), StatusCode::NOT_FOUND);

    // Unconfigured names fall through to the origin
    let other = middleware
        .handle(request("/.well-known/other.txt", "curl/8.0"), &site)
        .await;
    assert_eq!(body(&other), "not found");
}

#[tokio::test]
async fn test_agent_gets_optimized_product_page() {
    let middleware = EdgeMiddleware::new(geo_enabled());
    let outcome = middleware
        .process(request("/products/widget", "Mozilla/5.0 (compatible; GPTBot/1.0)"), &site)
        .await;
    let html = body(&outcome.response);

    assert_eq!(outcome.stages_applied, vec![Stage::ContentOptimization]);
    assert!(html.contains(r#"<script type="application/ld+json">"#));
    assert!(html.contains(r#""@type":"Product""#));
    assert!(html.contains(r#"<meta name="botmon:summary""#));
    assert!(html.contains("data-botmon-section"));
    assert_eq!(outcome.response.headers()[&GEO_HEADER], "true");
    assert_eq!(outcome.response.headers()[&PAGE_TYPE_HEADER], "product");
}

#[tokio::test]
async fn test_browser_gets_origin_page() {
    let middleware = EdgeMiddleware::new(geo_enabled());
    let outcome = middleware
        .process(
            request(
                "/products/widget",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0) AppleWebKit/605.1.15 Safari/605.1.15",
            ),
            &site,
        )
        .await;

    assert!(outcome.stages_applied.is_empty());
    assert_eq!(body(&outcome.response), PRODUCT_HTML);
    assert!(outcome.response.headers().get(&GEO_HEADER).is_none());
    assert!(outcome.response.headers().get(&PAGE_TYPE_HEADER).is_none());
}

#[tokio::test]
async fn test_remote_unreachable_falls_back_to_local() {
    let settings = RemoteSettings {
        endpoint: "http://127.0.0.1:1".to_string(),
        api_key: Some("k".to_string()),
        cache_ttl_seconds: 60,
        timeout_seconds: 1,
    };
    let fetcher = RemoteConfigFetcher::new(&settings, Arc::new(MemoryEdgeCache::default()))
        .expect("fetcher builds");

    let defaults = EdgeMiddleware::new(ConfigOverrides::default()).with_fetcher(fetcher);
    let outcome = defaults
        .process(request("/robots.txt", "GPTBot/1.0"), &site)
        .await;
    assert!(outcome.stages_applied.is_empty());
    assert_eq!(body(&outcome.response), ORIGIN_ROBOTS);
}

#[tokio::test]
async fn test_remote_bundle_overrides_local() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sdk-config/shop.example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "robotsTxt": {"mode": "replace", "content": "User-agent: *\nDisallow: /remote"},
                "geo": {"enabled": true, "rules": [{"urlPattern": "/docs/**", "pageType": "docs"}]}
            }"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let settings = RemoteSettings {
        endpoint: server.uri(),
        api_key: Some("k".to_string()),
        cache_ttl_seconds: 60,
        timeout_seconds: 2,
    };
    let fetcher = RemoteConfigFetcher::new(&settings, Arc::new(MemoryEdgeCache::default()))
        .expect("fetcher builds");
    let middleware = EdgeMiddleware::new(robots(Mode::Append, "User-agent: *\nDisallow: /local"))
        .with_fetcher(fetcher);

    // Local enables robots.txt; remote switches it to replace
    let robots = middleware
        .handle(request("/robots.txt", "curl/8.0"), &site)
        .await;
    assert_eq!(body(&robots), "User-agent: *\nDisallow: /remote");

    // Second request on the same hostname is served from the bundle cache
    let docs = middleware
        .handle(request("/docs/intro", "ClaudeBot/1.0"), &site)
        .await;
    assert_eq!(docs.headers()[&PAGE_TYPE_HEADER], "docs");
    assert!(body(&docs).contains(r#""@type":"TechArticle""#));
}

#[tokio::test]
async fn test_origin_failure_passes_502() {
    let middleware = EdgeMiddleware::new(geo_enabled());
    let failing = |_request: EdgeRequest| async {
        Err::<EdgeResponse, OriginError>(OriginError::Other("upstream reset".to_string()))
    };

    let response = middleware
        .handle(request("/products/widget", "GPTBot/1.0"), &failing)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(response.headers().get(&GEO_HEADER).is_none());
}
