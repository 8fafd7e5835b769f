//! Analytics delivery against a mock collector

use botmon_edge::analytics::{
    AnalyticsClient, AnalyticsError, AnalyticsEvent, ErrorHook, HeaderBotScoreProvider,
};
use botmon_edge::config::{AnalyticsSettings, ConfigOverrides};
use botmon_edge::pipeline::{ContextBuilder, EdgeMiddleware, OriginError};
use botmon_edge::{EdgeRequest, EdgeResponse};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{HeaderName, Request, Response};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, max_retries: u32) -> AnalyticsSettings {
    AnalyticsSettings {
        endpoint: format!("{}/v1/events", server.uri()),
        api_key: Some("collector-key".to_string()),
        max_retries,
        retry_base_delay_ms: 1,
    }
}

fn request() -> EdgeRequest {
    Request::builder()
        .method("GET")
        .uri("/pricing")
        .header(HOST, "shop.example.com")
        .header(USER_AGENT, "Mozilla/5.0 (compatible; ClaudeBot/1.0)")
        .header("x-bot-score", "3")
        .body(Bytes::new())
        .expect("valid request")
}

fn event() -> AnalyticsEvent {
    let response = Response::builder()
        .status(200)
        .header(CONTENT_TYPE, "text/html")
        .body(Bytes::new())
        .expect("valid response");
    let ctx = ContextBuilder::default()
        .build(request(), response, Instant::now())
        .expect("context builds");
    AnalyticsEvent::from_context(&ctx, &[], None)
}

async fn page(_request: EdgeRequest) -> Result<EdgeResponse, OriginError> {
    Ok(Response::builder()
        .status(200)
        .header(CONTENT_TYPE, "text/plain")
        .body(Bytes::from_static(b"plain page"))
        .expect("valid response"))
}

/// Polls the mock until it has seen `count` requests
async fn wait_for_requests(server: &MockServer, count: usize) -> Vec<wiremock::Request> {
    for _ in 0..100 {
        let received = server.received_requests().await.unwrap_or_default();
        if received.len() >= count {
            return received;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("collector did not receive {} requests", count);
}

#[tokio::test]
async fn test_send_posts_event_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .and(header("x-api-key", "collector-key"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalyticsClient::new(&settings(&server, 0)).expect("client builds");
    client.send(&event()).await.expect("event delivered");

    let received = server.received_requests().await.unwrap_or_default();
    let body: Value = serde_json::from_slice(&received[0].body).expect("json body");
    assert_eq!(body["path"], "/pricing");
    assert_eq!(body["hostname"], "shop.example.com");
    assert_eq!(body["agentName"], "ClaudeBot");
    assert_eq!(body["agentOperator"], "Anthropic");
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = AnalyticsClient::new(&settings(&server, 3)).expect("client builds");
    client.send(&event()).await.expect("delivered on third attempt");

    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 3);
}

#[tokio::test]
async fn test_rate_limit_exhausts_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let client = AnalyticsClient::new(&settings(&server, 2)).expect("client builds");
    let result = client.send(&event()).await;

    assert!(matches!(
        result,
        Err(AnalyticsError::Exhausted { attempts: 3, .. })
    ));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnalyticsClient::new(&settings(&server, 3)).expect("client builds");
    assert!(matches!(
        client.send(&event()).await,
        Err(AnalyticsError::Rejected(400))
    ));
}

#[tokio::test]
async fn test_track_reports_failure_to_hook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let failures = Arc::new(Mutex::new(Vec::new()));
    let sink = failures.clone();
    let hook: ErrorHook = Arc::new(move |e: &AnalyticsError| {
        sink.lock().expect("lock").push(e.to_string());
    });

    let client = AnalyticsClient::new(&settings(&server, 0))
        .expect("client builds")
        .with_error_hook(hook);
    client.track(event()).await.expect("task completes");

    let failures = failures.lock().expect("lock");
    assert_eq!(failures.len(), 1);
    assert!(failures[0].contains("401"));
}

#[tokio::test]
async fn test_middleware_emits_event_after_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = AnalyticsClient::new(&settings(&server, 0)).expect("client builds");
    let provider = HeaderBotScoreProvider::new("edge-proxy", HeaderName::from_static("x-bot-score"));
    let middleware = EdgeMiddleware::new(ConfigOverrides::default())
        .with_analytics(client)
        .with_bot_score_provider(Arc::new(provider));

    let outcome = middleware.process(request(), &page).await;
    assert_eq!(outcome.response.body().as_ref(), b"plain page");

    let received = wait_for_requests(&server, 1).await;
    let body: Value = serde_json::from_slice(&received[0].body).expect("json body");
    assert_eq!(body["status"], 200);
    assert_eq!(body["isAiAgent"], true);
    assert_eq!(body["stagesApplied"], serde_json::json!([]));
    assert_eq!(body["botScore"]["score"], 3);
    assert_eq!(body["botScore"]["provider"], "edge-proxy");
}

#[tokio::test]
async fn test_unreachable_collector_does_not_affect_response() {
    let client = AnalyticsClient::new(&AnalyticsSettings {
        endpoint: "http://127.0.0.1:1/v1/events".to_string(),
        api_key: None,
        max_retries: 0,
        retry_base_delay_ms: 1,
    })
    .expect("client builds");
    let middleware = EdgeMiddleware::new(ConfigOverrides::default()).with_analytics(client);

    let response = middleware.handle(request(), &page).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), b"plain page");
}
