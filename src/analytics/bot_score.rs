//! Bot-score adapters
//!
//! Upstream providers (CDNs, bot managers) annotate requests with a score.
//! Adapters lift that into a [`BotScore`]; the result is attached to
//! analytics and never influences the pipeline.

use crate::EdgeRequest;
use http::HeaderName;
use serde::Serialize;

/// A provider's verdict on a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BotScore {
    /// 0-100; lower means more likely automated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    pub provider: String,
}

/// Extracts a bot score from a request
pub trait BotScoreProvider: Send + Sync {
    /// Name reported in [`BotScore::provider`]
    fn provider(&self) -> &str;

    /// Returns `None` when the request carries no signal from this provider
    fn extract(&self, request: &EdgeRequest) -> Option<BotScore>;
}

/// Reads the score from request headers set by an upstream proxy
#[derive(Debug, Clone)]
pub struct HeaderBotScoreProvider {
    provider: String,
    score_header: HeaderName,
    verified_header: Option<HeaderName>,
    classification_header: Option<HeaderName>,
}

impl HeaderBotScoreProvider {
    pub fn new(provider: impl Into<String>, score_header: HeaderName) -> Self {
        Self {
            provider: provider.into(),
            score_header,
            verified_header: None,
            classification_header: None,
        }
    }

    /// Header holding `true`/`false` for verified bots
    pub fn with_verified_header(mut self, header: HeaderName) -> Self {
        self.verified_header = Some(header);
        self
    }

    /// Header holding a free-form classification label
    pub fn with_classification_header(mut self, header: HeaderName) -> Self {
        self.classification_header = Some(header);
        self
    }

    fn header<'a>(request: &'a EdgeRequest, name: &HeaderName) -> Option<&'a str> {
        request
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

impl BotScoreProvider for HeaderBotScoreProvider {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn extract(&self, request: &EdgeRequest) -> Option<BotScore> {
        let score = Self::header(request, &self.score_header)
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|s| *s <= 100);
        let verified = self
            .verified_header
            .as_ref()
            .and_then(|h| Self::header(request, h))
            .and_then(|v| match v.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            });
        let classification = self
            .classification_header
            .as_ref()
            .and_then(|h| Self::header(request, h))
            .map(String::from);

        if score.is_none() && verified.is_none() && classification.is_none() {
            return None;
        }

        Some(BotScore {
            score,
            verified,
            classification,
            provider: self.provider.clone(),
        })
    }
}
