//! AI agent detection
//!
//! Requests are classified by a case-insensitive substring match of the
//! `User-Agent` header against the static [`AGENT_REGISTRY`]. No lookup ever
//! leaves the process; the registry is updated by releasing a new version.

mod registry;

pub use registry::{AgentCategory, AgentSignature, AGENT_REGISTRY};

use crate::EdgeRequest;
use http::header::USER_AGENT;
use serde::Serialize;

/// Result of classifying a request's user agent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentClassification {
    pub is_ai_agent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_category: Option<AgentCategory>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub agent_tags: Vec<String>,
}

impl AgentClassification {
    /// Classification for anything not found in the registry
    pub fn not_an_agent() -> Self {
        Self::default()
    }

    fn from_signature(sig: &AgentSignature) -> Self {
        Self {
            is_ai_agent: true,
            agent_name: Some(sig.name.to_string()),
            agent_operator: Some(sig.operator.to_string()),
            agent_category: Some(sig.category),
            agent_tags: sig.tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Matches user-agent strings against an ordered signature list
#[derive(Debug, Clone, Copy)]
pub struct AgentDetector {
    registry: &'static [AgentSignature],
}

impl Default for AgentDetector {
    fn default() -> Self {
        Self {
            registry: AGENT_REGISTRY,
        }
    }
}

impl AgentDetector {
    /// Creates a detector over a custom registry
    pub fn with_registry(registry: &'static [AgentSignature]) -> Self {
        Self { registry }
    }

    /// Returns the first signature contained in `user_agent`
    pub fn find(&self, user_agent: &str) -> Option<&'static AgentSignature> {
        let ua = user_agent.to_lowercase();
        self.registry.iter().find(|sig| ua.contains(sig.pattern))
    }

    /// Classifies a user-agent string
    pub fn classify(&self, user_agent: &str) -> AgentClassification {
        match self.find(user_agent) {
            Some(sig) => AgentClassification::from_signature(sig),
            None => AgentClassification::not_an_agent(),
        }
    }

    /// Classifies a request by its `User-Agent` header
    pub fn classify_request(&self, request: &EdgeRequest) -> AgentClassification {
        request
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| self.classify(ua))
            .unwrap_or_else(AgentClassification::not_an_agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_detects_known_agent() {
        let detector = AgentDetector::default();
        let result = detector
            .classify("Mozilla/5.0 AppleWebKit/537.36 (KHTML, like Gecko; compatible; GPTBot/1.2; +https://openai.com/gptbot)");

        assert!(result.is_ai_agent);
        assert_eq!(result.agent_name.as_deref(), Some("GPTBot"));
        assert_eq!(result.agent_operator.as_deref(), Some("OpenAI"));
        assert_eq!(result.agent_category, Some(AgentCategory::Training));
        assert!(result.agent_tags.contains(&"openai".to_string()));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let detector = AgentDetector::default();
        assert!(detector.classify("CLAUDEBOT/1.0").is_ai_agent);
        assert!(detector.classify("perplexitybot").is_ai_agent);
    }

    #[test]
    fn test_browser_is_not_an_agent() {
        let detector = AgentDetector::default();
        let result = detector.classify(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 Safari/605.1.15",
        );
        assert_eq!(result, AgentClassification::not_an_agent());
    }

    #[test]
    fn test_first_match_wins() {
        static REGISTRY: &[AgentSignature] = &[
            AgentSignature {
                pattern: "alpha",
                name: "Alpha",
                operator: "Test",
                category: AgentCategory::Search,
                tags: &[],
            },
            AgentSignature {
                pattern: "beta",
                name: "Beta",
                operator: "Test",
                category: AgentCategory::Training,
                tags: &[],
            },
        ];
        let detector = AgentDetector::with_registry(REGISTRY);
        let result = detector.classify("beta alpha");
        assert_eq!(result.agent_name.as_deref(), Some("Alpha"));
    }

    #[test]
    fn test_classify_request_without_user_agent() {
        let request = http::Request::builder()
            .uri("/")
            .body(Bytes::new())
            .unwrap();
        let result = AgentDetector::default().classify_request(&request);
        assert!(!result.is_ai_agent);
    }

    #[test]
    fn test_classify_request_header() {
        let request = http::Request::builder()
            .uri("/")
            .header(USER_AGENT, "Mozilla/5.0 (compatible; ChatGPT-User/1.0)")
            .body(Bytes::new())
            .unwrap();
        let result = AgentDetector::default().classify_request(&request);
        assert_eq!(result.agent_name.as_deref(), Some("ChatGPT-User"));
        assert_eq!(result.agent_category, Some(AgentCategory::Assistant));
    }
}
