//! Page-type classification
//!
//! Tiers are tried in order and the first one that produces a type wins:
//!
//! 1. A matching rule with an explicit `pageType`
//! 2. The URL-pattern table
//! 3. `og:type` / `article:published_time` meta tags
//! 4. Content heuristics
//! 5. `generic`

use crate::config::{PageRule, PageType};
use crate::geo::extract;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// How sure the classifier is about a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Which tier produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClassificationSource {
    Rule,
    UrlPattern,
    MetaTag,
    ContentHeuristic,
    Default,
}

/// Result of classifying one response; never cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub page_type: PageType,
    pub confidence: Confidence,
    pub source: ClassificationSource,
}

impl ClassificationResult {
    fn new(page_type: PageType, confidence: Confidence, source: ClassificationSource) -> Self {
        Self {
            page_type,
            confidence,
            source,
        }
    }
}

/// Ordered URL table, evaluated against the lowercased path
const URL_PATTERNS: &[(&str, PageType)] = &[
    (r"/(?:products?|shop)(?:/|$)", PageType::Product),
    (r"/(?:pricing|plans)/?$", PageType::Pricing),
    (r"/(?:faqs?|frequently-asked-questions)(?:/|$)", PageType::Faq),
    (r"/(?:docs?|documentation|api-reference)(?:/|$)", PageType::Docs),
    (r"/(?:blog|news|articles?|posts?)(?:/|$)", PageType::Article),
    (r"/(?:how-to|guides?|tutorials?)(?:[/-]|$)", PageType::HowTo),
    (r"/vs/|-vs-|/compare(?:/|-|$)", PageType::Comparison),
];

static URL_TABLE: OnceLock<Vec<(Regex, PageType)>> = OnceLock::new();

fn url_table() -> &'static [(Regex, PageType)] {
    URL_TABLE.get_or_init(|| {
        URL_PATTERNS
            .iter()
            .map(|(pattern, page_type)| {
                (
                    Regex::new(pattern).expect("static pattern compiles"),
                    *page_type,
                )
            })
            .collect()
    })
}

/// Classifies a page from its path, HTML and the rule matching the path
pub fn classify_page(path: &str, html: &str, rule: Option<&PageRule>) -> ClassificationResult {
    from_rule(rule)
        .or_else(|| from_url(path))
        .or_else(|| from_meta(html))
        .or_else(|| from_content(html))
        .unwrap_or(ClassificationResult::new(
            PageType::Generic,
            Confidence::Low,
            ClassificationSource::Default,
        ))
}

fn from_rule(rule: Option<&PageRule>) -> Option<ClassificationResult> {
    let page_type = rule?.page_type?;
    Some(ClassificationResult::new(
        page_type,
        Confidence::High,
        ClassificationSource::Rule,
    ))
}

fn from_url(path: &str) -> Option<ClassificationResult> {
    let path = path.to_ascii_lowercase();
    url_table()
        .iter()
        .find(|(re, _)| re.is_match(&path))
        .map(|(_, page_type)| {
            ClassificationResult::new(*page_type, Confidence::Medium, ClassificationSource::UrlPattern)
        })
}

fn from_meta(html: &str) -> Option<ClassificationResult> {
    let og_type = extract::extract_meta_content(html, "og:type").map(|t| t.to_ascii_lowercase());

    let page_type = match og_type.as_deref() {
        Some(t) if t == "product" || t.starts_with("product.") => Some(PageType::Product),
        Some("article") => Some(PageType::Article),
        _ if extract::extract_meta_content(html, "article:published_time").is_some() => {
            Some(PageType::Article)
        }
        _ => None,
    }?;

    Some(ClassificationResult::new(
        page_type,
        Confidence::High,
        ClassificationSource::MetaTag,
    ))
}

fn from_content(html: &str) -> Option<ClassificationResult> {
    let heuristic = |page_type, confidence| {
        Some(ClassificationResult::new(
            page_type,
            confidence,
            ClassificationSource::ContentHeuristic,
        ))
    };

    if extract::count_question_headings(html) >= 3 {
        return heuristic(PageType::Faq, Confidence::Medium);
    }
    if extract::extract_prices(html).len() >= 2 {
        return heuristic(PageType::Pricing, Confidence::Low);
    }
    if extract::has_ordered_list(html) && extract::has_step_keywords(html) {
        return heuristic(PageType::HowTo, Confidence::Medium);
    }
    if extract::count_code_blocks(html) >= 3 {
        return heuristic(PageType::Docs, Confidence::Low);
    }

    None
}
