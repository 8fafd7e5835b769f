//! Managed `robots.txt`

use crate::config::{ManagedFileConfig, Mode};
use crate::managed::{managed_response, origin_text, ManagedFile};
use crate::pipeline::StageError;
use crate::robots::{append_robots_txt, merge_robots_txt};
use crate::EdgeResponse;
use http::StatusCode;

pub const ROBOTS_TXT_PATH: &str = "/robots.txt";

const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Produces the managed `robots.txt` response
///
/// | Mode | Output |
/// |------|--------|
/// | `replace` | configured content verbatim |
/// | `append` | origin, separator comment, managed content |
/// | `merge` | block-level merge, managed agents win |
/// | `disabled` | not handled |
pub fn handle_robots_txt(
    config: &ManagedFileConfig,
    origin: &EdgeResponse,
) -> Result<Option<EdgeResponse>, StageError> {
    let managed = config.content.as_deref().unwrap_or("");

    let body = match config.mode {
        Mode::Disabled => return Ok(None),
        Mode::Replace => config
            .content
            .clone()
            .ok_or(StageError::MissingContent(ManagedFile::RobotsTxt.as_str()))?,
        Mode::Append => append_robots_txt(&origin_text(origin, &["text/plain"]), managed),
        Mode::Merge => merge_robots_txt(&origin_text(origin, &["text/plain"]), managed),
    };

    managed_response(StatusCode::OK, CONTENT_TYPE, body, ManagedFile::RobotsTxt, config.mode)
        .map(Some)
}
