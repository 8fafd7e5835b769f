//! Analytics transport
//!
//! Events are POSTed as JSON. Delivery is retried with exponential backoff
//! on network errors, 429 and 5xx answers; any other 4xx is final. Nothing
//! here can fail a request: `track` runs in the background and reports
//! failures to the error hook, or to the log when no hook is set.

use crate::analytics::AnalyticsEvent;
use crate::config::AnalyticsSettings;
use crate::remote::{build_http_client, API_KEY_HEADER};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

/// Upper bound for a single backoff delay
const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Request timeout for event delivery
const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from event delivery
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Collector rejected event with status {0}")]
    Rejected(u16),

    #[error("Delivery failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    #[error("Invalid analytics endpoint: {0}")]
    Endpoint(String),
}

/// Caller-supplied sink for delivery failures
pub type ErrorHook = Arc<dyn Fn(&AnalyticsError) + Send + Sync>;

/// Sends analytics events to the collector
///
/// Construct one per process and share it; clones share the HTTP client.
#[derive(Clone)]
pub struct AnalyticsClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
    max_retries: u32,
    retry_base_delay: Duration,
    on_error: Option<ErrorHook>,
}

impl std::fmt::Debug for AnalyticsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyticsClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl AnalyticsClient {
    /// Creates a client from the `[analytics]` settings
    pub fn new(settings: &AnalyticsSettings) -> Result<Self, AnalyticsError> {
        let endpoint = Url::parse(&settings.endpoint)
            .map_err(|e| AnalyticsError::Endpoint(format!("{}: {}", settings.endpoint, e)))?;

        Ok(Self {
            client: build_http_client(SEND_TIMEOUT)?,
            endpoint,
            api_key: settings.api_key.clone(),
            max_retries: settings.max_retries,
            retry_base_delay: Duration::from_millis(settings.retry_base_delay_ms),
            on_error: None,
        })
    }

    /// Routes delivery failures to `hook` instead of the log
    pub fn with_error_hook(mut self, hook: ErrorHook) -> Self {
        self.on_error = Some(hook);
        self
    }

    /// Delay before retry number `attempt` (0-based)
    ///
    /// Doubles per attempt, plus 10-20% random jitter, capped at 30 s.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let base = self.retry_base_delay.as_millis() as u64;
        let delay = base.saturating_mul(2u64.saturating_pow(attempt));

        let jitter = delay / 10 + (rand::random::<u64>() % (delay / 10 + 1));
        Duration::from_millis(delay.saturating_add(jitter).min(MAX_RETRY_DELAY_MS))
    }

    /// Delivers one event, retrying transient failures
    pub async fn send(&self, event: &AnalyticsEvent) -> Result<(), AnalyticsError> {
        let attempts = self.max_retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.retry_delay(attempt - 1);
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying analytics delivery"
                );
                tokio::time::sleep(delay).await;
            }

            let mut request = self.client.post(self.endpoint.clone()).json(event);
            if let Some(key) = &self.api_key {
                request = request.header(API_KEY_HEADER, key);
            }

            match request.send().await {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) if is_retryable(response.status()) => {
                    last_error = format!("status {}", response.status().as_u16());
                }
                Ok(response) => {
                    return Err(AnalyticsError::Rejected(response.status().as_u16()));
                }
                Err(e) => {
                    last_error = e.to_string();
                }
            }
        }

        Err(AnalyticsError::Exhausted {
            attempts,
            last_error,
        })
    }

    /// Delivers an event in the background
    ///
    /// The returned handle never yields an error; failures go to the hook.
    pub fn track(&self, event: AnalyticsEvent) -> JoinHandle<()> {
        let client = self.clone();
        tokio::spawn(async move {
            if let Err(e) = client.send(&event).await {
                match &client.on_error {
                    Some(hook) => (**hook)(&e),
                    None => tracing::warn!(error = %e, "Analytics delivery failed"),
                }
            }
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
