// src/checker/relevance.rs
// =============================================================================
// The relevance heuristic: does the page we landed on look like what the
// link text promised?
//
// The default check is deliberately crude: the link text must appear inside
// the page's <title>. It is a hint for a human reading the report, not a
// correctness guarantee.
//
// The check is pluggable through the RelevanceCheck trait, so callers can
// swap in their own predicate (a closure works too).
// =============================================================================

use super::html::PageDocument;

// A predicate deciding whether `document` matches the link text that led to it
pub trait RelevanceCheck: Send + Sync {
    fn is_relevant(&self, document: &PageDocument, link_text: Option<&str>) -> bool;
}

// Any matching closure is a relevance check
impl<F> RelevanceCheck for F
where
    F: Fn(&PageDocument, Option<&str>) -> bool + Send + Sync,
{
    fn is_relevant(&self, document: &PageDocument, link_text: Option<&str>) -> bool {
        self(document, link_text)
    }
}

// Title containment check
//
// With the default options this is a plain, case-sensitive substring test.
// One exception to plain containment: an empty (or whitespace-only) link
// text is never relevant, even though "" is a substring of every title.
// Seeds, image links and icon links carry no text and must not pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TitleMatch {
    /// Compare lowercased title and link text
    pub ignore_case: bool,
    /// Collapse runs of whitespace to a single space on both sides
    pub normalize_whitespace: bool,
}

impl TitleMatch {
    fn prepare(&self, text: &str) -> String {
        let text = if self.normalize_whitespace {
            text.split_whitespace().collect::<Vec<_>>().join(" ")
        } else {
            text.to_string()
        };

        if self.ignore_case {
            text.to_lowercase()
        } else {
            text
        }
    }
}

impl RelevanceCheck for TitleMatch {
    fn is_relevant(&self, document: &PageDocument, link_text: Option<&str>) -> bool {
        let (Some(title), Some(link_text)) = (document.title.as_deref(), link_text) else {
            return false;
        };

        let title = self.prepare(title);
        let link_text = self.prepare(link_text);

        // An empty title or empty link text proves nothing
        if title.trim().is_empty() || link_text.trim().is_empty() {
            return false;
        }

        title.contains(&link_text)
    }
}
