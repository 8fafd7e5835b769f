//! URL handling module for Botmon Edge
//!
//! This module provides glob matching for URL-pattern rules, and helpers that
//! recover the absolute URL and hostname of an incoming request.

mod matcher;

pub use matcher::{glob_matches, GlobPattern};

use crate::{EdgeRequest, UrlError, UrlResult};
use ::url::Url;
use http::header::HOST;

/// Reconstructs the absolute URL of a request
///
/// Requests in absolute form are parsed directly. Origin-form requests (path
/// only) are resolved against the `Host` header.
///
/// # Returns
///
/// * `Ok(Url)` - The absolute request URL
/// * `Err(UrlError)` - No host could be determined or the URL is malformed
pub fn request_url(request: &EdgeRequest) -> UrlResult<Url> {
    let uri = request.uri();

    if uri.scheme().is_some() && uri.authority().is_some() {
        return Url::parse(&uri.to_string()).map_err(|e| UrlError::Parse(e.to_string()));
    }

    let host = request
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or(UrlError::MissingHost)?;

    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");

    Url::parse(&format!("https://{}{}", host, path_and_query))
        .map_err(|e| UrlError::Parse(e.to_string()))
}

/// Returns the lowercase hostname of a request, without port
pub fn request_hostname(request: &EdgeRequest) -> UrlResult<String> {
    let url = request_url(request)?;
    url.host_str()
        .map(|h| h.to_lowercase())
        .ok_or(UrlError::MissingHost)
}
