//! Summary extraction

use crate::config::PageRule;
use crate::geo::extract::PageSignals;

/// Meta and Open Graph descriptions shorter than this are skipped
pub const MIN_DESCRIPTION_CHARS: usize = 30;

/// Picks the page summary
///
/// In priority order: the rule's literal summary (any length), the meta
/// description, `og:description` (both at least 30 characters), then the
/// first paragraph of at least 50 characters.
pub fn extract_summary(signals: &PageSignals, rule: Option<&PageRule>) -> Option<String> {
    if let Some(summary) = rule.and_then(|r| r.summary.as_ref()) {
        return Some(summary.clone());
    }

    let long_enough = |text: &&String| text.chars().count() >= MIN_DESCRIPTION_CHARS;

    signals
        .meta_description
        .as_ref()
        .filter(long_enough)
        .or_else(|| signals.og_description.as_ref().filter(long_enough))
        .or(signals.first_paragraph.as_ref())
        .cloned()
}
