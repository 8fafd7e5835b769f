//! Managed `sitemap.xml`
//!
//! Append and merge are the same operation here: concatenating two XML
//! documents would not be a valid sitemap, so both modes take the union of
//! `<loc>` entries and emit a fresh `<urlset>`.

use crate::config::{ManagedFileConfig, Mode};
use crate::managed::{managed_response, origin_text, ManagedFile};
use crate::pipeline::StageError;
use crate::EdgeResponse;
use http::StatusCode;
use quick_xml::events::Event;
use quick_xml::Reader;

pub const SITEMAP_PATH: &str = "/sitemap.xml";

const CONTENT_TYPE: &str = "application/xml; charset=utf-8";
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Produces the managed sitemap response
pub fn handle_sitemap(
    config: &ManagedFileConfig,
    origin: &EdgeResponse,
) -> Result<Option<EdgeResponse>, StageError> {
    let body = match config.mode {
        Mode::Disabled => return Ok(None),
        Mode::Replace => config
            .content
            .clone()
            .ok_or(StageError::MissingContent(ManagedFile::Sitemap.as_str()))?,
        Mode::Append | Mode::Merge => {
            let origin_xml = origin_text(origin, &["application/xml", "text/xml"]);
            merge_sitemap_xml(&origin_xml, config.content.as_deref().unwrap_or(""))
        }
    };

    managed_response(StatusCode::OK, CONTENT_TYPE, body, ManagedFile::Sitemap, config.mode)
        .map(Some)
}

/// Merges two sitemaps into one `<urlset>`
///
/// Locations are deduplicated by exact string equality; origin locations
/// come first, then managed-only ones, each in document order.
pub fn merge_sitemap_xml(origin: &str, managed: &str) -> String {
    let mut locations = extract_locations(origin);
    for loc in extract_locations(managed) {
        if !locations.contains(&loc) {
            locations.push(loc);
        }
    }
    // Duplicates inside the origin document itself
    let mut seen = std::collections::HashSet::new();
    locations.retain(|loc| seen.insert(loc.clone()));

    render_urlset(&locations)
}

/// Reads every `<loc>` value from a `<urlset>` or `<sitemapindex>` document
///
/// Malformed XML stops the read; locations seen before the error are kept.
pub fn extract_locations(xml: &str) -> Vec<String> {
    let mut reader = Reader::from_str(xml);
    let mut locations = Vec::new();
    let mut current: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"loc" => {
                current = Some(String::new());
            }
            Ok(Event::Text(e)) => {
                if let Some(loc) = current.as_mut() {
                    match e.unescape() {
                        Ok(text) => loc.push_str(&text),
                        Err(err) => {
                            tracing::debug!(error = %err, "Bad entity in sitemap <loc>");
                            loc.push_str(&String::from_utf8_lossy(&e));
                        }
                    }
                }
            }
            Ok(Event::CData(e)) => {
                if let Some(loc) = current.as_mut() {
                    loc.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"loc" => {
                if let Some(loc) = current.take() {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locations.push(loc.to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    error = %e,
                    position = reader.buffer_position(),
                    "Malformed sitemap XML, keeping locations read so far"
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    locations
}

fn render_urlset(locations: &[String]) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NS));
    for loc in locations {
        out.push_str(&format!("  <url><loc>{}</loc></url>\n", escape_xml(loc)));
    }
    out.push_str("</urlset>\n");
    out
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
