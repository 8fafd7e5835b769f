//! Analytics module
//!
//! Builds one event per request and hands it to the background transport.
//! Analytics is strictly a side channel: its outcome is never observed by the
//! requester.

mod bot_score;
mod client;

pub use bot_score::{BotScore, BotScoreProvider, HeaderBotScoreProvider};
pub use client::{AnalyticsClient, AnalyticsError, ErrorHook};

use crate::agents::AgentClassification;
use crate::config::PageType;
use crate::pipeline::{RequestContext, Stage};
use chrono::{DateTime, Utc};
use http::header::{CONTENT_TYPE, USER_AGENT};
use serde::Serialize;

/// What is reported about one request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    // Request identity
    pub method: String,
    pub url: String,
    pub hostname: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    // Response identity
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    // Timing
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,

    // Classification
    #[serde(flatten)]
    pub agent: AgentClassification,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageType>,
    pub stages_applied: Vec<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_score: Option<BotScore>,
}

impl AnalyticsEvent {
    /// Describes a finished request; `ctx.response` is the final response
    pub fn from_context(
        ctx: &RequestContext,
        stages_applied: &[Stage],
        bot_score: Option<BotScore>,
    ) -> Self {
        let header = |value: Option<&http::HeaderValue>| {
            value.and_then(|v| v.to_str().ok()).map(String::from)
        };

        Self {
            method: ctx.request.method().to_string(),
            url: ctx.url.to_string(),
            hostname: ctx.hostname.clone(),
            path: ctx.path().to_string(),
            user_agent: header(ctx.request.headers().get(USER_AGENT)),
            country: ctx.country.clone(),
            status: ctx.response.status().as_u16(),
            content_type: header(ctx.response.headers().get(CONTENT_TYPE)),
            timestamp: ctx.started_at,
            duration_ms: ctx.elapsed().as_millis() as u64,
            agent: ctx.agent.clone(),
            page_type: ctx.page_type(),
            stages_applied: stages_applied.to_vec(),
            bot_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ContextBuilder;
    use bytes::Bytes;
    use http::header::HOST;
    use http::{Request, Response};
    use std::time::Instant;

    #[test]
    fn test_event_from_context() {
        let request = Request::builder()
            .method("GET")
            .uri("/robots.txt")
            .header(HOST, "a.example.com")
            .header(USER_AGENT, "PerplexityBot/1.0")
            .header("cf-ipcountry", "NL")
            .body(Bytes::new())
            .unwrap();
        let response = Response::builder()
            .status(200)
            .header(CONTENT_TYPE, "text/plain")
            .body(Bytes::new())
            .unwrap();
        let ctx = ContextBuilder::default()
            .build(request, response, Instant::now())
            .unwrap();

        let event = AnalyticsEvent::from_context(&ctx, &[Stage::RobotsTxt], None);
        assert_eq!(event.method, "GET");
        assert_eq!(event.url, "https://a.example.com/robots.txt");
        assert_eq!(event.status, 200);
        assert_eq!(event.content_type.as_deref(), Some("text/plain"));
        assert_eq!(event.country.as_deref(), Some("NL"));

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["isAiAgent"], true);
        assert_eq!(json["agentName"], "PerplexityBot");
        assert_eq!(json["agentOperator"], "Perplexity");
        assert_eq!(json["stagesApplied"][0], "robots-txt");
        assert!(json.get("pageType").is_none());
        assert!(json.get("botScore").is_none());
    }
}
