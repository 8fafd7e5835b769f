//! Content-optimization stage
//!
//! Rewrites HTML and plain-text/markdown responses for AI agents. HTML gets
//! JSON-LD and a summary meta tag injected before `</head>` plus enriched
//! headings; text gets a `---` frontmatter block. Every other content type,
//! and any response with a content encoding applied, passes through.

use crate::config::{GeoConfig, PageRule};
use crate::geo::classify::{classify_page, ClassificationResult};
use crate::geo::extract::{self, PageSignals};
use crate::geo::headings::enrich_headings;
use crate::geo::schema::{synthesize, SchemaInput};
use crate::geo::summary::extract_summary;
use crate::pipeline::StageError;
use crate::EdgeResponse;
use bytes::Bytes;
use http::header::{CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, Response};
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Set to `true` when the stage modified the response
pub const GEO_HEADER: HeaderName = HeaderName::from_static("x-botmon-geo");
/// The detected page type of an optimized response
pub const PAGE_TYPE_HEADER: HeaderName = HeaderName::from_static("x-botmon-pagetype");
/// `name` of the injected summary meta tag
pub const SUMMARY_META_NAME: &str = "botmon:summary";

static HEAD_CLOSE_RE: OnceLock<Regex> = OnceLock::new();

/// What the stage did to a response
#[derive(Debug, Default)]
pub struct OptimizeOutcome {
    /// The rewritten response; `None` when nothing changed
    pub response: Option<EdgeResponse>,
    /// `None` when the content type is not optimizable or the rule disables it
    pub classification: Option<ClassificationResult>,
}

impl OptimizeOutcome {
    pub fn modified(&self) -> bool {
        self.response.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    Html,
    Text,
    Other,
}

fn content_kind(response: &EdgeResponse) -> ContentKind {
    let encoded = response
        .headers()
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| !v.trim().eq_ignore_ascii_case("identity"));
    if encoded {
        return ContentKind::Other;
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if content_type.starts_with("text/html") || content_type.starts_with("application/xhtml+xml") {
        ContentKind::Html
    } else if content_type.starts_with("text/plain") || content_type.starts_with("text/markdown") {
        ContentKind::Text
    } else {
        ContentKind::Other
    }
}

/// Runs content optimization over an origin response
///
/// The input response is only read; a rewritten copy is returned when the
/// body changed. Only `2xx` responses are considered.
pub fn optimize_response(
    response: &EdgeResponse,
    url: &Url,
    geo: &GeoConfig,
) -> Result<OptimizeOutcome, StageError> {
    if !response.status().is_success() {
        return Ok(OptimizeOutcome::default());
    }

    let kind = content_kind(response);
    if kind == ContentKind::Other {
        return Ok(OptimizeOutcome::default());
    }

    let path = url.path();
    let rule = geo.find_rule(path);
    if rule.is_some_and(PageRule::is_disabled) {
        tracing::debug!(path, "Content optimization disabled by rule");
        return Ok(OptimizeOutcome::default());
    }

    let body = std::str::from_utf8(response.body())?;
    let classification = classify_page(path, body, rule);

    let rewritten = match kind {
        ContentKind::Html => rewrite_html(body, url, geo, rule, &classification),
        ContentKind::Text => rewrite_text(body, url, geo, rule, &classification)?,
        ContentKind::Other => None,
    };

    let Some(new_body) = rewritten.filter(|b| b.as_str() != body) else {
        return Ok(OptimizeOutcome {
            response: None,
            classification: Some(classification),
        });
    };

    let mut rewritten = with_body(response, new_body)?;
    rewritten
        .headers_mut()
        .insert(GEO_HEADER, HeaderValue::from_static("true"));
    rewritten.headers_mut().insert(
        PAGE_TYPE_HEADER,
        HeaderValue::from_static(classification.page_type.as_str()),
    );

    Ok(OptimizeOutcome {
        response: Some(rewritten),
        classification: Some(classification),
    })
}

fn rewrite_html(
    html: &str,
    url: &Url,
    geo: &GeoConfig,
    rule: Option<&PageRule>,
    classification: &ClassificationResult,
) -> Option<String> {
    let signals = PageSignals::from_html(html);
    let mut injection = String::new();

    if geo.inject_json_ld {
        let input = SchemaInput {
            html,
            url: url.as_str(),
            signals: &signals,
        };
        for schema in synthesize(classification.page_type, &input, rule) {
            injection.push_str(r#"<script type="application/ld+json">"#);
            injection.push_str(&schema.to_string().replace("</", r"<\/"));
            injection.push_str("</script>\n");
        }
    }

    if geo.inject_summary {
        if let Some(summary) = extract_summary(&signals, rule) {
            injection.push_str(&format!(
                "<meta name=\"{}\" content=\"{}\">\n",
                SUMMARY_META_NAME,
                escape_attribute(&summary)
            ));
        }
    }

    let mut out = html.to_string();
    if !injection.is_empty() {
        let head_close = HEAD_CLOSE_RE
            .get_or_init(|| Regex::new(r"(?i)</head\s*>").expect("static pattern compiles"));
        match head_close.find(html) {
            Some(m) => out.insert_str(m.start(), &injection),
            None => tracing::debug!(url = %url, "No </head> found, skipping head injection"),
        }
    }

    if geo.enrich_headings {
        out = enrich_headings(&out, classification.page_type);
    }

    Some(out)
}

fn rewrite_text(
    text: &str,
    url: &Url,
    geo: &GeoConfig,
    rule: Option<&PageRule>,
    classification: &ClassificationResult,
) -> Result<Option<String>, StageError> {
    if text.starts_with("---\n") || text.starts_with("---\r\n") {
        return Ok(None);
    }

    let mut signals = PageSignals::from_html(text);
    if signals.first_paragraph.is_none() {
        signals.first_paragraph = first_text_paragraph(text);
    }

    let mut fields = Vec::new();
    if geo.inject_summary {
        if let Some(summary) = extract_summary(&signals, rule) {
            fields.push(format!("summary: {}", serde_json::to_string(&summary)?));
        }
    }
    if geo.inject_json_ld {
        let input = SchemaInput {
            html: text,
            url: url.as_str(),
            signals: &signals,
        };
        let schema_type = synthesize(classification.page_type, &input, rule)
            .first()
            .and_then(|schema| schema.get("@type").cloned());
        match schema_type {
            Some(serde_json::Value::String(t)) => fields.push(format!("schema-type: {}", t)),
            Some(other) => fields.push(format!("schema-type: {}", other)),
            None => {}
        }
    }

    if fields.is_empty() {
        return Ok(None);
    }

    let mut out = String::from("---\n");
    out.push_str(&format!("page-type: {}\n", classification.page_type));
    for field in fields {
        out.push_str(&field);
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(text);
    Ok(Some(out))
}

/// First blank-line-separated block of plain text that is long enough to
/// describe the page; markdown headings are skipped
fn first_text_paragraph(text: &str) -> Option<String> {
    text.split("\n\n")
        .map(|block| {
            block
                .lines()
                .filter(|line| !line.trim_start().starts_with('#'))
                .map(str::trim)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .find(|block| block.chars().count() >= extract::MIN_PARAGRAPH_CHARS)
        .map(|block| extract::truncate_chars(&block, extract::MAX_PARAGRAPH_CHARS))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Rebuilds a response around a new body, keeping status, version and
/// headers; `Content-Length` is dropped since the body changed
pub fn with_body(original: &EdgeResponse, body: impl Into<Bytes>) -> Result<EdgeResponse, http::Error> {
    let mut builder = Response::builder()
        .status(original.status())
        .version(original.version());
    for (name, value) in original.headers() {
        if name != CONTENT_LENGTH {
            builder = builder.header(name, value);
        }
    }
    builder.body(body.into())
}
