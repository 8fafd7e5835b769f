//! Origin handler contract
//!
//! The origin is whatever produces the "real" response for a request. It
//! returns a fully buffered body, so a response can be read by several stages
//! without being re-fetched.

use crate::{EdgeRequest, EdgeResponse};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use reqwest::Client;
use std::future::Future;
use thiserror::Error;
use url::Url;

/// Headers that are not forwarded to an HTTP origin
const SKIPPED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "accept-encoding",
    "keep-alive",
    "upgrade",
];

/// Headers that are not copied back from an HTTP origin
const SKIPPED_RESPONSE_HEADERS: &[&str] = &["connection", "transfer-encoding", "keep-alive"];

/// Errors raised by an origin handler
#[derive(Debug, Error)]
pub enum OriginError {
    #[error("Origin request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid origin request: {0}")]
    InvalidRequest(String),

    #[error("Invalid origin response: {0}")]
    InvalidResponse(String),

    #[error("Origin error: {0}")]
    Other(String),
}

/// Produces the origin response for a request
#[async_trait]
pub trait OriginHandler: Send + Sync {
    async fn handle(&self, request: EdgeRequest) -> Result<EdgeResponse, OriginError>;
}

#[async_trait]
impl<F, Fut> OriginHandler for F
where
    F: Fn(EdgeRequest) -> Fut + Send + Sync,
    Fut: Future<Output = Result<EdgeResponse, OriginError>> + Send + 'static,
{
    async fn handle(&self, request: EdgeRequest) -> Result<EdgeResponse, OriginError> {
        (self)(request).await
    }
}

/// Copies a request so it can be handed to the origin while the original
/// stays with the request context
///
/// Extensions are not copied.
pub fn clone_request(request: &EdgeRequest) -> EdgeRequest {
    let mut copy = Request::new(request.body().clone());
    *copy.method_mut() = request.method().clone();
    *copy.uri_mut() = request.uri().clone();
    *copy.version_mut() = request.version();
    *copy.headers_mut() = request.headers().clone();
    copy
}

/// The placeholder served when the origin could not be reached
pub fn bad_gateway() -> EdgeResponse {
    let mut response = Response::new(Bytes::from_static(b"Bad Gateway"));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}

/// Forwards requests to an upstream HTTP server
///
/// The request path and query are resolved against `base`; the body is
/// buffered in full.
#[derive(Debug, Clone)]
pub struct HttpOrigin {
    client: Client,
    base: Url,
}

impl HttpOrigin {
    pub fn new(client: Client, base: Url) -> Self {
        Self { client, base }
    }

    /// Returns the upstream URL for a request
    pub fn upstream_url(&self, request: &EdgeRequest) -> Result<Url, OriginError> {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        self.base
            .join(path_and_query)
            .map_err(|e| OriginError::InvalidRequest(e.to_string()))
    }
}

#[async_trait]
impl OriginHandler for HttpOrigin {
    async fn handle(&self, request: EdgeRequest) -> Result<EdgeResponse, OriginError> {
        let url = self.upstream_url(&request)?;
        let method = reqwest::Method::from_bytes(request.method().as_str().as_bytes())
            .map_err(|e| OriginError::InvalidRequest(e.to_string()))?;

        let mut builder = self.client.request(method, url.clone());
        for (name, value) in request.headers() {
            if SKIPPED_REQUEST_HEADERS.contains(&name.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), value.as_bytes());
        }
        if !request.body().is_empty() {
            builder = builder.body(request.body().to_vec());
        }

        let upstream = builder.send().await?;
        tracing::debug!(url = %url, status = upstream.status().as_u16(), "Origin responded");

        let status = StatusCode::from_u16(upstream.status().as_u16())
            .map_err(|e| OriginError::InvalidResponse(e.to_string()))?;
        let mut response = Response::builder().status(status);
        for (name, value) in upstream.headers() {
            if SKIPPED_RESPONSE_HEADERS.contains(&name.as_str()) {
                continue;
            }
            let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_str().as_bytes()),
                HeaderValue::from_bytes(value.as_bytes()),
            ) else {
                continue;
            };
            response = response.header(name, value);
        }

        let body = upstream.bytes().await?;
        response
            .body(body)
            .map_err(|e| OriginError::InvalidResponse(e.to_string()))
    }
}
