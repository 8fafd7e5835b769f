//! Per-request decision context

use crate::agents::{AgentClassification, AgentDetector};
use crate::config::PageType;
use crate::geo::ClassificationResult;
use crate::url::request_url;
use crate::{EdgeRequest, EdgeResponse, UrlError, UrlResult};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use url::Url;

/// Headers carrying the client's country, most specific provider first
pub const COUNTRY_HEADERS: &[&str] = &["cf-ipcountry", "x-vercel-ip-country", "x-country-code"];

/// Everything the pipeline stages decide on
///
/// Owned by one request. `response` starts as the origin response and is
/// replaced by whichever stage takes effect.
#[derive(Debug)]
pub struct RequestContext {
    pub request: EdgeRequest,
    pub response: EdgeResponse,
    pub url: Url,
    pub hostname: String,
    pub agent: AgentClassification,
    pub country: Option<String>,
    /// Set by content optimization
    pub classification: Option<ClassificationResult>,
    pub started_at: DateTime<Utc>,
    started: Instant,
}

impl RequestContext {
    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// The detected page type, once content optimization has run
    pub fn page_type(&self) -> Option<PageType> {
        self.classification.map(|c| c.page_type)
    }

    /// Time since the request arrived
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Assembles a [`RequestContext`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextBuilder {
    detector: AgentDetector,
}

impl ContextBuilder {
    pub fn new(detector: AgentDetector) -> Self {
        Self { detector }
    }

    /// Builds the context for a request and its origin response
    ///
    /// `started` is when the request arrived.
    ///
    /// # Returns
    ///
    /// * `Ok(RequestContext)` - Context ready for the pipeline
    /// * `Err(UrlError)` - The request URL or hostname could not be determined
    pub fn build(
        &self,
        request: EdgeRequest,
        response: EdgeResponse,
        started: Instant,
    ) -> UrlResult<RequestContext> {
        let url = request_url(&request)?;
        if url.host_str().is_none() {
            return Err(UrlError::MissingHost);
        }
        Ok(self.build_with_url(request, url, response, started))
    }

    /// Builds the context when the request URL is already known
    pub fn build_with_url(
        &self,
        request: EdgeRequest,
        url: Url,
        response: EdgeResponse,
        started: Instant,
    ) -> RequestContext {
        let hostname = url.host_str().unwrap_or_default().to_lowercase();
        let agent = self.detector.classify_request(&request);
        let country = country_code(&request);
        let elapsed = chrono::Duration::from_std(started.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());

        RequestContext {
            request,
            response,
            url,
            hostname,
            agent,
            country,
            classification: None,
            started_at: Utc::now() - elapsed,
            started,
        }
    }
}

/// Reads the client's country from the first populated country header
pub fn country_code(request: &EdgeRequest) -> Option<String> {
    COUNTRY_HEADERS.iter().find_map(|name| {
        request
            .headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_ascii_uppercase())
    })
}
