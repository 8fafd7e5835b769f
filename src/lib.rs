//! Botmon Edge: managed files and content optimization at the edge
//!
//! This crate sits between an incoming request and an origin handler. It serves
//! centrally managed `robots.txt`, sitemap and `.well-known/*` content, and for
//! requests from AI content-ingestion agents it rewrites HTML and text responses
//! to carry summaries, JSON-LD structured data and enriched headings.
//!
//! Every decision is driven by a [`config::ResolvedConfig`] built from code-level
//! defaults, a local TOML file and a remote override bundle fetched per hostname.
//!
//! The system is fail-open: no error raised inside the pipeline ever reaches the
//! requester. The worst case is always the unmodified origin response.

pub mod agents;
pub mod analytics;
pub mod config;
pub mod geo;
pub mod managed;
pub mod pipeline;
pub mod remote;
pub mod robots;
pub mod url;

use bytes::Bytes;
use thiserror::Error;

/// Request type flowing through the middleware
pub type EdgeRequest = http::Request<Bytes>;

/// Response type flowing through the middleware; bodies are always buffered
pub type EdgeResponse = http::Response<Bytes>;

/// Main error type for Botmon Edge operations
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] http::Error),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Origin error: {0}")]
    Origin(#[from] pipeline::OriginError),

    #[error("Remote config error: {0}")]
    Remote(#[from] remote::RemoteConfigError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] analytics::AnalyticsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid URL pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Missing host in request")]
    MissingHost,

    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },
}

/// Result type alias for Botmon Edge operations
pub type Result<T> = std::result::Result<T, EdgeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use agents::{AgentClassification, AgentDetector};
pub use config::{ConfigOverrides, EdgeConfig, Mode, PageRule, PageType, ResolvedConfig};
pub use pipeline::{EdgeMiddleware, OriginHandler, PipelineOutcome, RequestContext};
pub use remote::{EdgeCache, MemoryEdgeCache, RemoteConfig, RemoteConfigFetcher};
