//! Heading enrichment

use crate::config::PageType;
use crate::geo::extract::{in_ranges, opaque_ranges};
use regex::Regex;
use std::sync::OnceLock;

/// Attribute marking a heading's position; its presence means "already enriched"
pub const SECTION_ATTR: &str = "data-botmon-section";
pub const LEVEL_ATTR: &str = "data-botmon-level";
pub const PAGE_TYPE_ATTR: &str = "data-botmon-page-type";

static OPEN_HEADING_RE: OnceLock<Regex> = OnceLock::new();

/// Annotates every heading's opening tag with its section index, level and
/// the page type
///
/// Headings are numbered from 1 in document order. A heading that already
/// carries the section marker keeps its tag untouched but still takes its
/// number, so running this twice gives the same output as running it once.
/// Heading-like text inside scripts, styles and comments is neither
/// rewritten nor counted.
pub fn enrich_headings(html: &str, page_type: PageType) -> String {
    let re = OPEN_HEADING_RE.get_or_init(|| {
        Regex::new(r"(?i)<h([1-6])(\s[^>]*)?>").expect("static pattern compiles")
    });
    let opaque = opaque_ranges(html);

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    let mut section = 0usize;
    for caps in re.captures_iter(html) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        if in_ranges(&opaque, whole.start()) {
            continue;
        }

        section += 1;
        let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if attrs.to_ascii_lowercase().contains(SECTION_ATTR) {
            continue;
        }

        out.push_str(&html[last..whole.start()]);
        let tag = &whole.as_str()[1..3];
        out.push_str(&format!(
            r#"<{}{} {}="{}" {}="{}" {}="{}">"#,
            tag,
            attrs,
            SECTION_ATTR,
            section,
            LEVEL_ATTR,
            &caps[1],
            PAGE_TYPE_ATTR,
            page_type.as_str(),
        ));
        last = whole.end();
    }
    out.push_str(&html[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enriches_in_document_order() {
        let html = r#"<h1>Title</h1><p>x</p><h2 class="sub">Part</h2>"#;
        let out = enrich_headings(html, PageType::Docs);
        assert_eq!(
            out,
            concat!(
                r#"<h1 data-botmon-section="1" data-botmon-level="1" data-botmon-page-type="docs">Title</h1>"#,
                r#"<p>x</p>"#,
                r#"<h2 class="sub" data-botmon-section="2" data-botmon-level="2" data-botmon-page-type="docs">Part</h2>"#,
            )
        );
    }

    #[test]
    fn test_idempotent() {
        let html = "<h1>A</h1><h2>B</h2><H3 id=c>C</H3>";
        let once = enrich_headings(html, PageType::Article);
        let twice = enrich_headings(&once, PageType::Article);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_already_marked_heading_keeps_its_number_slot() {
        let html = r#"<h1 data-botmon-section="9">A</h1><h2>B</h2>"#;
        let out = enrich_headings(html, PageType::Generic);
        assert!(out.starts_with(r#"<h1 data-botmon-section="9">A</h1>"#));
        assert!(out.contains(r#"<h2 data-botmon-section="2""#));
    }

    #[test]
    fn test_ignores_non_heading_tags() {
        let html = "<header><hr><h7>x</h7></header>";
        assert_eq!(enrich_headings(html, PageType::Generic), html);
    }

    #[test]
    fn test_preserves_tag_case() {
        let out = enrich_headings("<H2>Up</H2>", PageType::Faq);
        assert!(out.starts_with(r#"<H2 data-botmon-section="1" data-botmon-level="2" data-botmon-page-type="faq">"#));
    }

    #[test]
    fn test_script_and_comment_headings_untouched() {
        let html = concat!(
            r#"<script>var tpl = "<h2>Title</h2>";</script>"#,
            "<!-- <h3>old</h3> -->",
            "<h1>Real</h1>",
        );
        let out = enrich_headings(html, PageType::Generic);
        assert!(out.starts_with(concat!(
            r#"<script>var tpl = "<h2>Title</h2>";</script>"#,
            "<!-- <h3>old</h3> -->",
        )));
        assert!(out.ends_with(
            r#"<h1 data-botmon-section="1" data-botmon-level="1" data-botmon-page-type="generic">Real</h1>"#
        ));
    }
}
