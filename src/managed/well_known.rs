//! Managed `.well-known/*` files
//!
//! Only filenames listed in the config are intercepted. Filenames are exact,
//! case-sensitive keys: `/.well-known/Security.txt` does not match a
//! configured `security.txt`.

use crate::config::{Mode, WellKnownConfig};
use crate::managed::{managed_response, ManagedFile};
use crate::pipeline::StageError;
use crate::EdgeResponse;
use http::StatusCode;

pub const WELL_KNOWN_PREFIX: &str = "/.well-known/";

/// Returns the filename for a `/.well-known/<name>` path
///
/// Nested paths such as `/.well-known/a/b` have no filename.
pub fn well_known_filename(path: &str) -> Option<&str> {
    let name = path.strip_prefix(WELL_KNOWN_PREFIX)?;
    if name.is_empty() || name.contains('/') {
        None
    } else {
        Some(name)
    }
}

/// Infers a content type from the filename suffix; text is the fallback
pub fn content_type_for(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".json") {
        "application/json"
    } else if lower.ends_with(".xml") {
        "application/xml; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    }
}

/// Produces the response for a managed `.well-known` file
///
/// Returns `Ok(None)` for filenames that are not configured. A configured
/// file that is disabled, or has no content, is answered with a 404. There is
/// nothing to merge a well-known file with, so `append` and `merge` serve the
/// configured content like `replace`.
pub fn handle_well_known(
    config: &WellKnownConfig,
    filename: &str,
) -> Result<Option<EdgeResponse>, StageError> {
    let Some(file) = config.file(filename) else {
        return Ok(None);
    };

    let content = match (file.mode, file.content.as_ref()) {
        (Mode::Disabled, _) | (_, None) => None,
        (_, Some(content)) => Some(content.clone()),
    };

    let response = match content {
        Some(content) => managed_response(
            StatusCode::OK,
            content_type_for(filename),
            content,
            ManagedFile::WellKnown,
            file.mode,
        )?,
        None => {
            tracing::debug!(filename, "Managed well-known file has no content, answering 404");
            managed_response(
                StatusCode::NOT_FOUND,
                "text/plain; charset=utf-8",
                "Not Found",
                ManagedFile::WellKnown,
                file.mode,
            )?
        }
    };

    Ok(Some(response))
}
