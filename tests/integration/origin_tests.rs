//! Forwarding to an HTTP origin

use botmon_edge::config::{ConfigOverrides, GeoOverride};
use botmon_edge::geo::PAGE_TYPE_HEADER;
use botmon_edge::pipeline::{EdgeMiddleware, HttpOrigin, OriginHandler};
use botmon_edge::remote::build_http_client;
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Request, StatusCode};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn origin(server: &MockServer) -> HttpOrigin {
    let client = build_http_client(Duration::from_secs(5)).expect("client builds");
    HttpOrigin::new(client, Url::parse(&server.uri()).expect("mock uri"))
}

#[tokio::test]
async fn test_forwards_path_query_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "widgets"))
        .and(header("user-agent", "GPTBot/1.0"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .insert_header("x-origin", "yes")
                .set_body_string("results"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::builder()
        .uri("/search?q=widgets")
        .header(HOST, "shop.example.com")
        .header(USER_AGENT, "GPTBot/1.0")
        .body(Bytes::new())
        .expect("valid request");

    let response = origin(&server)
        .handle(request)
        .await
        .expect("origin answers");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-origin"], "yes");
    assert_eq!(response.body().as_ref(), b"results");
}

#[tokio::test]
async fn test_origin_status_is_preserved() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    let request = Request::builder()
        .uri("/missing")
        .body(Bytes::new())
        .expect("valid request");
    let response = origin(&server)
        .handle(request)
        .await
        .expect("origin answers");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.body().as_ref(), b"gone");
}

#[tokio::test]
async fn test_unreachable_origin_is_an_error() {
    let client = build_http_client(Duration::from_secs(1)).expect("client builds");
    let origin = HttpOrigin::new(client, Url::parse("http://127.0.0.1:1/").expect("url"));
    let request = Request::builder()
        .uri("/")
        .body(Bytes::new())
        .expect("valid request");
    assert!(origin.handle(request).await.is_err());
}

#[tokio::test]
async fn test_middleware_optimizes_http_origin_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/faq"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(
                    "<html><head><title>FAQ</title></head><body>\
                     <h2>How do refunds work?</h2><p>Refunds are issued within five days.</p>\
                     <h2>Can I change my plan?</h2><p>Yes, plans can change at any time.</p>\
                     </body></html>",
                ),
        )
        .mount(&server)
        .await;

    let middleware = EdgeMiddleware::new(ConfigOverrides {
        geo: Some(GeoOverride {
            enabled: Some(true),
            ..GeoOverride::default()
        }),
        ..ConfigOverrides::default()
    });
    let request = Request::builder()
        .uri("/faq")
        .header(HOST, "shop.example.com")
        .header(USER_AGENT, "PerplexityBot/1.0")
        .body(Bytes::new())
        .expect("valid request");

    let response = middleware.handle(request, &origin(&server)).await;
    assert_eq!(response.headers()[&PAGE_TYPE_HEADER], "faq");
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .expect("ascii")
        .starts_with("text/html"));
    let body = std::str::from_utf8(response.body()).expect("utf-8");
    assert!(body.contains(r#""@type":"FAQPage""#));
    assert!(body.contains("How do refunds work?"));
}
