// src/crawl/fetch.rs
// =============================================================================
// Fetching pages over HTTP.
//
// The crawl loop doesn't talk to reqwest directly. It asks a PageSource for
// pages, which keeps the loop testable with an in-memory source.
//
// HttpSource is the real implementation:
// - one shared reqwest Client (connection pooling, timeout, redirects)
// - every response is reported with its *effective* URL after redirects
// - 4xx/5xx responses are still pages: the classifier decides they're broken
// - only connection-level problems (DNS, timeout, TLS, ...) are errors
// =============================================================================

use crate::checker::{FetchedPage, LinkExtractor, PageDocument};
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

// Maximum number of redirects followed for a single request
const MAX_REDIRECTS: usize = 10;

// Something that can turn a URL into a fetched page
pub trait PageSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage>> + Send;
}

pub struct HttpSource {
    client: Client,
    extractor: LinkExtractor,
}

impl HttpSource {
    pub fn new(timeout: Duration, user_agent: &str, extractor: LinkExtractor) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, extractor })
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchedPage> {
        let response = self.client.get(url).send().await?;

        let status = response.status().as_u16();
        let effective_url = response.url().to_string();

        // Images, PDFs, JSON, ... have no title and no links to follow
        let is_markup = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(is_markup_content_type)
            .unwrap_or(true);

        let document = if is_markup {
            let body = response.text().await?;
            self.extractor.parse(&body, &effective_url)
        } else {
            PageDocument::default()
        };

        Ok(FetchedPage {
            url: effective_url,
            status,
            document,
        })
    }
}

impl PageSource for HttpSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage>> + Send {
        self.fetch_page(url)
    }
}

fn is_markup_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("html") || content_type.contains("xml")
}
