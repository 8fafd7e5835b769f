//! Managed-file handlers
//!
//! Each handler turns a managed-file section of the resolved config (plus the
//! buffered origin response, for append/merge) into the response to serve.
//! A handler returning `Ok(None)` means "not handled": the origin response
//! continues down the pipeline.

pub mod robots;
pub mod sitemap;
pub mod well_known;

use crate::config::Mode;
use crate::pipeline::StageError;
use crate::EdgeResponse;
use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderName, HeaderValue, Response, StatusCode};

pub use robots::{handle_robots_txt, ROBOTS_TXT_PATH};
pub use sitemap::{extract_locations, handle_sitemap, merge_sitemap_xml, SITEMAP_PATH};
pub use well_known::{content_type_for, handle_well_known, well_known_filename, WELL_KNOWN_PREFIX};

/// Which managed file served a response
pub const MANAGED_HEADER: HeaderName = HeaderName::from_static("x-botmon-managed");
/// The mode that produced a managed response
pub const MODE_HEADER: HeaderName = HeaderName::from_static("x-botmon-mode");

/// The managed-file kinds, named as they appear in headers and stage lists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagedFile {
    RobotsTxt,
    Sitemap,
    WellKnown,
}

impl ManagedFile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RobotsTxt => "robots-txt",
            Self::Sitemap => "sitemap",
            Self::WellKnown => "well-known",
        }
    }
}

/// True for paths a managed-file stage can answer, whether or not it is enabled
pub fn is_managed_path(path: &str) -> bool {
    path == ROBOTS_TXT_PATH || path == SITEMAP_PATH || path.starts_with(WELL_KNOWN_PREFIX)
}

/// Builds a managed response carrying the management headers
pub(crate) fn managed_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
    file: ManagedFile,
    mode: Mode,
) -> Result<EdgeResponse, StageError> {
    Ok(Response::builder()
        .status(status)
        .header(CONTENT_TYPE, HeaderValue::from_static(content_type))
        .header(MANAGED_HEADER, HeaderValue::from_static(file.as_str()))
        .header(MODE_HEADER, HeaderValue::from_static(mode.as_str()))
        .body(body.into())?)
}

/// Returns the origin body as text when it is usable merge input
///
/// Anything other than a 200 whose content type starts with one of
/// `accepted` is treated as empty input. So is a body that is not UTF-8.
pub(crate) fn origin_text(origin: &EdgeResponse, accepted: &[&str]) -> String {
    if origin.status() != StatusCode::OK {
        return String::new();
    }

    let content_type = origin
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    if !accepted.iter().any(|prefix| content_type.starts_with(prefix)) {
        return String::new();
    }

    match std::str::from_utf8(origin.body()) {
        Ok(text) => text.to_string(),
        Err(_) => String::new(),
    }
}
