// src/checker/classify.rs
// =============================================================================
// The link classifier: the decision logic of the analyzer.
//
// For every fetched page it:
// 1. Produces a record for the page itself (broken? relevant?)
// 2. Looks at every outbound link found on the page and either
//    - rejects it (a terminal "not allowed" record, never fetched), or
//    - returns it as a request the crawl engine should fetch next
//
// The classifier never fetches anything and holds no mutable state. The
// allowed domains and the denylist are fixed when it is constructed.
// =============================================================================

use super::html::FetchedPage;
use super::record::{LinkContext, LinkRecord};
use super::relevance::{RelevanceCheck, TitleMatch};
use std::collections::HashSet;

// What the classifier decided about one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageOutcome {
    /// Record for the fetched page itself
    pub record: LinkRecord,
    /// Records for outbound links that must not be fetched
    pub rejected: Vec<LinkRecord>,
    /// Outbound links to fetch next, with the context to carry along
    pub requests: Vec<(String, LinkContext)>,
}

pub struct LinkClassifier<R = TitleMatch> {
    allowed_domains: Vec<String>,
    blocked_urls: HashSet<String>,
    relevance: R,
}

impl LinkClassifier<TitleMatch> {
    // Creates a classifier using the default title-containment heuristic
    pub fn new(allowed_domains: Vec<String>, blocked_urls: HashSet<String>) -> Self {
        Self {
            allowed_domains,
            blocked_urls,
            relevance: TitleMatch::default(),
        }
    }
}

impl<R: RelevanceCheck> LinkClassifier<R> {
    // Swaps the relevance heuristic, keeping the allow/deny policy
    pub fn with_relevance<C: RelevanceCheck>(self, relevance: C) -> LinkClassifier<C> {
        LinkClassifier {
            allowed_domains: self.allowed_domains,
            blocked_urls: self.blocked_urls,
            relevance,
        }
    }

    pub fn allowed_domains(&self) -> &[String] {
        &self.allowed_domains
    }

    // Classifies a page we actually fetched
    //
    // Reaching the page already implied permission, so is_allowed is always
    // true here. A 4xx/5xx status marks it broken and is logged as an error.
    pub fn classify_page(&self, page: &FetchedPage, context: &LinkContext) -> LinkRecord {
        let is_broken_link = is_broken_status(page.status);
        if is_broken_link {
            log::error!("Invalid URL: {} (HTTP {})", page.url, page.status);
        }

        let is_valid_page = self.page_is_relevant(page, context.link_text.as_deref());

        LinkRecord::new(page.url.clone(), context, true, is_broken_link, is_valid_page)
    }

    pub fn page_is_relevant(&self, page: &FetchedPage, link_text: Option<&str>) -> bool {
        self.relevance.is_relevant(&page.document, link_text)
    }

    // Returns Some(record) if the link must not be fetched, None if the
    // caller should go ahead and fetch it
    pub fn classify_outbound_link(
        &self,
        link_url: &str,
        parent: &str,
        link_text: &str,
    ) -> Option<LinkRecord> {
        classify_outbound_link(
            link_url,
            parent,
            link_text,
            &self.allowed_domains,
            &self.blocked_urls,
        )
    }

    // Handles one completed fetch: the record for the page, the rejected
    // outbound links and the requests to schedule next
    pub fn on_page_fetched(&self, page: &FetchedPage, context: &LinkContext) -> PageOutcome {
        log::info!(
            "Visiting URL: {} parent: {} link text: {}",
            page.url,
            context.parent.as_deref().unwrap_or("None"),
            context.link_text.as_deref().unwrap_or("None"),
        );

        let record = self.classify_page(page, context);

        let mut rejected = Vec::new();
        let mut requests = Vec::new();

        for link in &page.document.links {
            match self.classify_outbound_link(&link.url, &page.url, &link.text) {
                Some(item) => {
                    log::info!(
                        "Found not allowed link: {} parent: {} text: {}",
                        link.url,
                        page.url,
                        link.text
                    );
                    rejected.push(item);
                }
                None => {
                    log::info!("Found link: {} parent: {} text: {}", link.url, page.url, link.text);
                    requests.push((link.url.clone(), LinkContext::new(&page.url, &link.text)));
                }
            }
        }

        PageOutcome {
            record,
            rejected,
            requests,
        }
    }
}

// 4xx and 5xx mean the link is broken
pub fn is_broken_status(status: u16) -> bool {
    matches!(status / 100, 4 | 5)
}

// Allow/deny policy for an outbound link, evaluated in order:
// 1. Listed in `blocked_urls` -> disallowed, whatever its domain
// 2. Contains one of `allowed_domains` anywhere in the URL -> allowed
// 3. Anything else -> disallowed
//
// Step 2 is a substring test, not a host comparison: a URL carrying an
// allowed domain in its query string passes too.
pub fn classify_outbound_link(
    link_url: &str,
    parent: &str,
    link_text: &str,
    allowed_domains: &[String],
    blocked_urls: &HashSet<String>,
) -> Option<LinkRecord> {
    let is_allowed = !blocked_urls.contains(link_url)
        && allowed_domains
            .iter()
            .any(|domain| link_url.contains(domain.as_str()));

    if is_allowed {
        return None;
    }

    // Relevance can't be judged without fetching, so it defaults to true
    Some(LinkRecord::new(
        link_url,
        &LinkContext::new(parent, link_text),
        false,
        false,
        true,
    ))
}
