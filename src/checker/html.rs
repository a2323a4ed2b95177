// src/checker/html.rs
// =============================================================================
// This module turns raw HTML into the small PageDocument the classifier needs.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser)
//
// A page is parsed exactly once. From the DOM we keep only:
// - the text of the <title> element
// - the outbound links inside the scope selector, as (url, anchor text) pairs
//
// scraper::Html is not Send, so it never leaves this module. PageDocument is
// plain owned data and can be moved between tasks freely.
// =============================================================================

use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

// Extensions of links that never point at an HTML page
const IGNORED_EXTENSIONS: &[&str] = &[
    // images
    "png", "jpg", "jpeg", "gif", "bmp", "ico", "svg", "webp", "tif", "tiff",
    // audio / video
    "mp3", "wav", "ogg", "flac", "mp4", "avi", "mov", "mkv", "webm", "wmv",
    // archives and binaries
    "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "exe", "dmg", "iso", "bin",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods",
    // assets
    "css", "js", "woff", "woff2", "ttf", "eot",
];

// One outbound link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Absolute URL, fragment removed
    pub url: String,
    /// Anchor text, trimmed
    pub text: String,
}

// The parts of a parsed page the analyzer cares about
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDocument {
    /// Text of the first <title> element, if the page has one
    pub title: Option<String>,
    /// Deduplicated links inside the scope region, in document order
    pub links: Vec<ExtractedLink>,
}

// A completed fetch: the effective URL (after redirects), the HTTP status
// and the parsed document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub document: PageDocument,
}

// Extracts the title and the scoped links of a page
//
// The scope is an optional CSS selector. When set, only links that are
// descendants of a matching element are returned (no match = no links).
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    scope: Option<Selector>,
    anchors: Selector,
    title: Selector,
}

impl LinkExtractor {
    // Builds an extractor; fails if the scope is not a valid CSS selector
    pub fn new(scope: Option<&str>) -> Result<Self> {
        let scope = match scope {
            Some(css) => Some(parse_selector(css)?),
            None => None,
        };

        Ok(Self {
            scope,
            anchors: parse_selector("a[href], area[href]")?,
            title: parse_selector("title")?,
        })
    }

    // Parses `html` fetched from `page_url` into a PageDocument
    pub fn parse(&self, html: &str, page_url: &str) -> PageDocument {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(|element| element.text().collect::<String>());

        let links = match Url::parse(page_url) {
            Ok(base) => self.extract_links(&document, &base),
            Err(e) => {
                // Without a base we can't resolve relative links
                log::warn!("Invalid page URL {}: {}", page_url, e);
                Vec::new()
            }
        };

        PageDocument { title, links }
    }

    fn extract_links(&self, document: &Html, base: &Url) -> Vec<ExtractedLink> {
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        match &self.scope {
            Some(scope) => {
                for region in document.select(scope) {
                    for element in region.select(&self.anchors) {
                        collect_link(element, base, &mut seen, &mut links);
                    }
                }
            }
            None => {
                for element in document.select(&self.anchors) {
                    collect_link(element, base, &mut seen, &mut links);
                }
            }
        }

        links
    }
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid CSS selector '{}': {:?}", css, e))
}

// Adds the link behind `element` unless it is unusable or already seen
fn collect_link(
    element: ElementRef<'_>,
    base: &Url,
    seen: &mut HashSet<String>,
    links: &mut Vec<ExtractedLink>,
) {
    let Some(href) = element.value().attr("href") else {
        return;
    };
    let Some(url) = resolve_url(base, href) else {
        return;
    };

    if seen.insert(url.clone()) {
        let text = element.text().collect::<String>().trim().to_string();
        links.push(ExtractedLink { url, text });
    }
}

// Resolves a possibly-relative href to an absolute http(s) URL
//
// Examples with base = "https://example.com/page":
//   "/docs"              -> Some("https://example.com/docs")
//   "other#section"      -> Some("https://example.com/other")
//   "#top"               -> None (same page)
//   "mailto:a@b.c"       -> None (not http)
//   "/logo.png"          -> None (not a page)
fn resolve_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    // join() handles absolute hrefs too: they simply replace the base
    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if has_ignored_extension(&url) {
        return None;
    }

    url.set_fragment(None);
    Some(url.to_string())
}

fn has_ignored_extension(url: &Url) -> bool {
    let last_segment = url.path().rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((_, ext)) => IGNORED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
