//! Targeted text extraction from raw HTML
//!
//! These are pure functions over HTML text. No DOM is built: each signal is
//! pulled out with a dedicated pattern, which is fast and tolerant of broken
//! markup at the cost of precision on unusual documents.

use regex::Regex;
use std::ops::Range;
use std::sync::OnceLock;

static TITLE_RE: OnceLock<Regex> = OnceLock::new();
static META_RE: OnceLock<Regex> = OnceLock::new();
static ATTR_RE: OnceLock<Regex> = OnceLock::new();
static PARAGRAPH_RE: OnceLock<Regex> = OnceLock::new();
static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static ORDERED_LIST_RE: OnceLock<Regex> = OnceLock::new();
static LIST_ITEM_RE: OnceLock<Regex> = OnceLock::new();
static PRICE_RE: OnceLock<Regex> = OnceLock::new();
static CODE_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static STEP_KEYWORD_RE: OnceLock<Regex> = OnceLock::new();
static SCRIPT_RE: OnceLock<Regex> = OnceLock::new();
static STYLE_RE: OnceLock<Regex> = OnceLock::new();
static COMMENT_RE: OnceLock<Regex> = OnceLock::new();
static TAG_RE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

fn cached(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static pattern compiles"))
}

/// Minimum length for the first paragraph to count as descriptive
pub const MIN_PARAGRAPH_CHARS: usize = 50;
/// First paragraph is cut to this many characters
pub const MAX_PARAGRAPH_CHARS: usize = 300;
/// FAQ answers are cut to this many characters
pub const MAX_ANSWER_CHARS: usize = 500;
/// FAQ answers shorter than this are discarded
pub const MIN_ANSWER_CHARS: usize = 10;

/// A heading element found in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 1 through 6
    pub level: u8,
    /// Cleaned heading text
    pub text: String,
    /// Byte offset of the opening tag
    pub start: usize,
    /// Byte offset just past the closing tag
    pub end: usize,
}

/// A question heading and the text that follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaqPair {
    pub question: String,
    pub answer: String,
}

/// The metadata signals shared by schema synthesis and summary extraction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignals {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub og_type: Option<String>,
    pub published_time: Option<String>,
    pub first_paragraph: Option<String>,
}

impl PageSignals {
    /// Extracts every signal from an HTML document
    pub fn from_html(html: &str) -> Self {
        Self {
            title: extract_title(html),
            meta_description: extract_meta_description(html),
            og_title: extract_meta_content(html, "og:title"),
            og_description: extract_meta_content(html, "og:description"),
            og_image: extract_meta_content(html, "og:image"),
            og_type: extract_meta_content(html, "og:type"),
            published_time: extract_meta_content(html, "article:published_time"),
            first_paragraph: extract_first_paragraph(html),
        }
    }

    /// `og:title`, then `<title>`, then the empty string
    pub fn resolved_title(&self) -> String {
        self.og_title
            .clone()
            .or_else(|| self.title.clone())
            .unwrap_or_default()
    }

    /// Meta description, then `og:description`, then the first paragraph
    pub fn resolved_description(&self) -> Option<String> {
        self.meta_description
            .clone()
            .or_else(|| self.og_description.clone())
            .or_else(|| self.first_paragraph.clone())
    }
}

/// Extracts the `<title>` text
pub fn extract_title(html: &str) -> Option<String> {
    let re = cached(&TITLE_RE, r"(?is)<title\b[^>]*>(.*?)</title\s*>");
    let caps = re.captures(html)?;
    non_empty(clean_text(caps.get(1)?.as_str()))
}

/// Extracts the `<meta name="description">` content
pub fn extract_meta_description(html: &str) -> Option<String> {
    extract_meta_content(html, "description")
}

/// Extracts the content of the first `<meta>` whose `name` or `property`
/// equals `key` (case-insensitive), regardless of attribute order
pub fn extract_meta_content(html: &str, key: &str) -> Option<String> {
    let meta_re = cached(&META_RE, r"(?is)<meta\b[^>]*>");

    for tag in meta_re.find_iter(html) {
        let attrs = parse_attributes(tag.as_str());
        let matches_key = attrs.iter().any(|(name, value)| {
            (name == "name" || name == "property") && value.eq_ignore_ascii_case(key)
        });
        if !matches_key {
            continue;
        }
        if let Some((_, content)) = attrs.iter().find(|(name, _)| name == "content") {
            if let Some(content) = non_empty(decode_entities(content).trim().to_string()) {
                return Some(content);
            }
        }
    }

    None
}

/// Parses `name="value"` pairs out of a single tag; names are lowercased
fn parse_attributes(tag: &str) -> Vec<(String, String)> {
    let attr_re = cached(
        &ATTR_RE,
        r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#,
    );

    attr_re
        .captures_iter(tag)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            Some((name, value))
        })
        .collect()
}

/// Extracts the first paragraph of at least 50 characters, cut to 300
pub fn extract_first_paragraph(html: &str) -> Option<String> {
    let re = cached(&PARAGRAPH_RE, r"(?is)<p\b[^>]*>(.*?)</p\s*>");

    re.captures_iter(html)
        .filter_map(|caps| caps.get(1).map(|m| clean_text(m.as_str())))
        .find(|text| text.chars().count() >= MIN_PARAGRAPH_CHARS)
        .map(|text| truncate_chars(&text, MAX_PARAGRAPH_CHARS))
}

/// Extracts every `<h1>`..`<h6>` element in document order
///
/// Headings inside scripts, styles and comments are skipped.
pub fn extract_headings(html: &str) -> Vec<Heading> {
    let re = cached(&HEADING_RE, r"(?is)<h([1-6])\b[^>]*>(.*?)</h[1-6]\s*>");
    let opaque = opaque_ranges(html);

    re.captures_iter(html)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if in_ranges(&opaque, whole.start()) {
                return None;
            }
            let level = caps.get(1)?.as_str().parse().ok()?;
            Some(Heading {
                level,
                text: clean_text(caps.get(2)?.as_str()),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Extracts question/answer pairs
///
/// A question is a heading whose text ends in `?`; its answer is the text up
/// to the next heading, cut to 500 characters. Answers under 10 characters
/// are discarded.
pub fn extract_faq_pairs(html: &str) -> Vec<FaqPair> {
    let headings = extract_headings(html);
    let mut pairs = Vec::new();

    for (i, heading) in headings.iter().enumerate() {
        if !heading.text.ends_with('?') {
            continue;
        }

        let answer_end = headings.get(i + 1).map(|h| h.start).unwrap_or(html.len());
        let answer = clean_text(&html[heading.end..answer_end]);
        if answer.chars().count() < MIN_ANSWER_CHARS {
            continue;
        }

        pairs.push(FaqPair {
            question: heading.text.clone(),
            answer: truncate_chars(&answer, MAX_ANSWER_CHARS),
        });
    }

    pairs
}

/// Counts headings whose text ends in `?`
pub fn count_question_headings(html: &str) -> usize {
    extract_headings(html)
        .iter()
        .filter(|h| h.text.ends_with('?'))
        .count()
}

/// Extracts the item texts of the first ordered list
pub fn extract_ordered_list_steps(html: &str) -> Vec<String> {
    let list_re = cached(&ORDERED_LIST_RE, r"(?is)<ol\b[^>]*>(.*?)</ol\s*>");
    let item_re = cached(&LIST_ITEM_RE, r"(?is)<li\b[^>]*>(.*?)</li\s*>");

    let Some(list) = list_re.captures(html).and_then(|caps| caps.get(1)) else {
        return Vec::new();
    };

    item_re
        .captures_iter(list.as_str())
        .filter_map(|caps| caps.get(1).map(|m| clean_text(m.as_str())))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Whether the document contains an ordered list
pub fn has_ordered_list(html: &str) -> bool {
    cached(&ORDERED_LIST_RE, r"(?is)<ol\b[^>]*>(.*?)</ol\s*>").is_match(html)
}

/// Whether the visible text reads like step-by-step instructions
pub fn has_step_keywords(html: &str) -> bool {
    let re = cached(
        &STEP_KEYWORD_RE,
        r"(?i)\bstep\s*\d+\b|\bstep-by-step\b|\bfollow these steps\b|\binstructions\b",
    );
    re.is_match(&strip_tags(html))
}

/// Extracts `$`-prefixed price tokens such as `$49`, `$1,299.00`
pub fn extract_prices(html: &str) -> Vec<String> {
    let re = cached(&PRICE_RE, r"\$(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{2})?");
    let text = clean_text(html);
    re.find_iter(&text).map(|m| m.as_str().to_string()).collect()
}

/// Counts `<pre>` and `<code>` elements
pub fn count_code_blocks(html: &str) -> usize {
    cached(&CODE_BLOCK_RE, r"(?i)<(?:pre|code)\b").find_iter(html).count()
}

/// Removes markup and collapses whitespace
///
/// `<script>` and `<style>` blocks (and comments) are removed with their
/// content before the remaining tags are stripped.
pub fn strip_tags(html: &str) -> String {
    let [script_re, style_re, comment_re] = opaque_patterns();
    let tag_re = cached(&TAG_RE, r"(?s)<[^>]+>");
    let ws_re = cached(&WHITESPACE_RE, r"\s+");

    let text = script_re.replace_all(html, " ");
    let text = style_re.replace_all(&text, " ");
    let text = comment_re.replace_all(&text, " ");
    let text = tag_re.replace_all(&text, " ");
    ws_re.replace_all(&text, " ").trim().to_string()
}

fn opaque_patterns() -> [&'static Regex; 3] {
    [
        cached(&SCRIPT_RE, r"(?is)<script\b.*?</script\s*>"),
        cached(&STYLE_RE, r"(?is)<style\b.*?</style\s*>"),
        cached(&COMMENT_RE, r"(?s)<!--.*?-->"),
    ]
}

/// Byte ranges of `<script>`, `<style>` and comment blocks, sorted by start
///
/// Markup inside these ranges is not part of the rendered page.
pub(crate) fn opaque_ranges(html: &str) -> Vec<Range<usize>> {
    let mut ranges: Vec<Range<usize>> = opaque_patterns()
        .into_iter()
        .flat_map(|re| re.find_iter(html).map(|m| m.range()))
        .collect();
    ranges.sort_by_key(|r| r.start);
    ranges
}

pub(crate) fn in_ranges(ranges: &[Range<usize>], offset: usize) -> bool {
    ranges.iter().any(|r| r.contains(&offset))
}

/// Decodes the basic HTML entities
///
/// Handles `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, and the numeric forms
/// of `'` and `/`. `&amp;` goes last so `&amp;lt;` decodes to `&lt;`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&#X27;", "'")
        .replace("&#47;", "/")
        .replace("&#x2F;", "/")
        .replace("&#x2f;", "/")
        .replace("&amp;", "&")
}

/// Strips markup, then decodes entities
pub fn clean_text(html: &str) -> String {
    decode_entities(&strip_tags(html))
}

/// Cuts `text` to at most `max` characters
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
