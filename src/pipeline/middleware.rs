//! Edge middleware entry point
//!
//! # Request Flow
//!
//! 1. Recover the request URL and hostname; without them the request is
//!    proxied to the origin untouched
//! 2. Call the origin and fetch the hostname's remote bundle concurrently
//! 3. Resolve the effective config (defaults, local, remote)
//! 4. Build the [`RequestContext`] and run the pipeline
//! 5. Hand the analytics event to the background transport
//!
//! An origin failure is answered with `502 Bad Gateway`; managed files can
//! still be served over that placeholder in replace mode.

use crate::analytics::{AnalyticsClient, AnalyticsEvent, BotScoreProvider};
use crate::config::{ConfigOverrides, ConfigResolver, EdgeConfig, ResolvedConfig};
use crate::pipeline::context::ContextBuilder;
use crate::pipeline::orchestrator::{run_pipeline, PipelineOutcome};
use crate::pipeline::origin::{bad_gateway, clone_request, OriginHandler};
use crate::remote::{EdgeCache, RemoteConfig, RemoteConfigFetcher};
use crate::url::request_url;
use crate::{EdgeError, EdgeRequest, EdgeResponse};
use std::sync::Arc;
use std::time::Instant;

/// Wraps an origin handler with managed files and content optimization
///
/// Build once per process and share; it holds no per-request state.
pub struct EdgeMiddleware {
    resolver: ConfigResolver,
    fetcher: Option<RemoteConfigFetcher>,
    context_builder: ContextBuilder,
    analytics: Option<AnalyticsClient>,
    bot_score: Option<Arc<dyn BotScoreProvider>>,
}

impl std::fmt::Debug for EdgeMiddleware {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeMiddleware")
            .field("resolver", &self.resolver)
            .field("fetcher", &self.fetcher)
            .field("analytics", &self.analytics)
            .field("bot_score", &self.bot_score.as_ref().map(|p| p.provider()))
            .finish()
    }
}

impl EdgeMiddleware {
    /// Creates a middleware with local overrides only
    pub fn new(local: ConfigOverrides) -> Self {
        Self {
            resolver: ConfigResolver::new(local),
            fetcher: None,
            context_builder: ContextBuilder::default(),
            analytics: None,
            bot_score: None,
        }
    }

    /// Creates a middleware from a loaded config file
    ///
    /// Remote lookups and analytics are enabled when their sections are
    /// present. `cache` backs the remote bundle cache.
    ///
    /// # Returns
    ///
    /// * `Ok(EdgeMiddleware)` - Ready to process requests
    /// * `Err(EdgeError)` - An endpoint is invalid or an HTTP client failed to build
    pub fn from_config(config: &EdgeConfig, cache: Arc<dyn EdgeCache>) -> Result<Self, EdgeError> {
        let mut middleware = Self::new(config.overrides.clone());

        if let Some(remote) = &config.remote {
            middleware.fetcher = Some(RemoteConfigFetcher::new(remote, cache)?);
        }
        if let Some(analytics) = &config.analytics {
            middleware.analytics = Some(AnalyticsClient::new(analytics)?);
        }

        Ok(middleware)
    }

    pub fn with_fetcher(mut self, fetcher: RemoteConfigFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn with_analytics(mut self, client: AnalyticsClient) -> Self {
        self.analytics = Some(client);
        self
    }

    /// Attaches a bot score to every analytics event
    pub fn with_bot_score_provider(mut self, provider: Arc<dyn BotScoreProvider>) -> Self {
        self.bot_score = Some(provider);
        self
    }

    pub fn with_context_builder(mut self, builder: ContextBuilder) -> Self {
        self.context_builder = builder;
        self
    }

    /// Resolves the effective config for a hostname
    pub async fn resolve_config(&self, hostname: &str) -> ResolvedConfig {
        let remote = self.fetch_remote(hostname).await;
        self.resolver
            .resolve(remote.as_ref().and_then(RemoteConfig::bundle))
    }

    async fn fetch_remote(&self, hostname: &str) -> Option<RemoteConfig> {
        match &self.fetcher {
            Some(fetcher) => Some(fetcher.fetch(hostname).await),
            None => None,
        }
    }

    /// Processes one request, returning the response and the applied stages
    pub async fn process(
        &self,
        request: EdgeRequest,
        origin: &dyn OriginHandler,
    ) -> PipelineOutcome {
        let started = Instant::now();

        let url = match request_url(&request) {
            Ok(url) if url.host_str().is_some() => url,
            Ok(_) | Err(_) => {
                tracing::debug!(uri = %request.uri(), "No request host, passing through");
                return PipelineOutcome {
                    response: call_origin(origin, request).await,
                    stages_applied: Vec::new(),
                };
            }
        };
        let hostname = url.host_str().unwrap_or_default().to_lowercase();

        let (response, remote) = tokio::join!(
            call_origin(origin, clone_request(&request)),
            self.fetch_remote(&hostname)
        );
        let config = self
            .resolver
            .resolve(remote.as_ref().and_then(RemoteConfig::bundle));

        let mut ctx = self
            .context_builder
            .build_with_url(request, url, response, started);
        let stages_applied = run_pipeline(&config, &mut ctx);

        tracing::debug!(
            hostname = %ctx.hostname,
            path = ctx.path(),
            status = ctx.response.status().as_u16(),
            agent = ctx.agent.agent_name.as_deref().unwrap_or("-"),
            stages = stages_applied.len(),
            "Request processed"
        );

        if let Some(analytics) = &self.analytics {
            let bot_score = self
                .bot_score
                .as_ref()
                .and_then(|provider| provider.extract(&ctx.request));
            analytics.track(AnalyticsEvent::from_context(&ctx, &stages_applied, bot_score));
        }

        PipelineOutcome {
            response: ctx.response,
            stages_applied,
        }
    }

    /// Processes one request, returning only the response
    pub async fn handle(&self, request: EdgeRequest, origin: &dyn OriginHandler) -> EdgeResponse {
        self.process(request, origin).await.response
    }
}

async fn call_origin(origin: &dyn OriginHandler, request: EdgeRequest) -> EdgeResponse {
    match origin.handle(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Origin failed, answering 502");
            bad_gateway()
        }
    }
}
