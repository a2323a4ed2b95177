// src/crawl/queue.rs
// =============================================================================
// This module implements the crawl loop with a breadth-first approach.
//
// How it works:
// 1. Start with the seed URLs at depth 0
// 2. Fetch every URL of the current level (a few at a time)
// 3. Hand each fetched page to the classifier
// 4. Emit the page record and the rejected-link records to the sink
// 5. Queue the allowed links at depth + 1, unless the depth limit is reached
// 6. Repeat until a level comes back with nothing new to fetch
//
// Politeness:
// - At most `concurrency` requests are in flight
// - Request starts are spaced by `delay` (see throttle.rs)
// - Every URL is fetched at most once
//
// Rust concepts:
// - Generics: the loop works with any PageSource, RelevanceCheck and RecordSink
// - Streams: stream::iter + buffered runs a bounded number of fetches at once
// - HashSet: to remember which URLs were already requested
// =============================================================================

use super::fetch::PageSource;
use super::throttle::Throttle;
use crate::checker::{FetchedPage, LinkClassifier, LinkContext, RecordSink, RelevanceCheck};
use anyhow::Result;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

// Knobs bounding one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Depth of the deepest pages fetched (seeds are depth 0)
    pub max_depth: usize,
    /// Maximum number of fetches in flight
    pub concurrency: usize,
    /// Minimum time between two request starts
    pub delay: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: 2,
            concurrency: 2,
            delay: Duration::from_millis(500),
        }
    }
}

// Counters reported at the end of a crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Pages fetched and classified
    pub visited: usize,
    /// Outbound links rejected by the allow/deny policy
    pub rejected: usize,
    /// Visited pages that answered 4xx/5xx
    pub broken: usize,
    /// Fetches that failed before any HTTP status came back
    pub failed: usize,
    /// Allowed links not followed because of the depth limit
    pub skipped_by_depth: usize,
}

// A URL waiting to be fetched
#[derive(Debug, Clone)]
struct CrawlRequest {
    url: String,
    depth: usize,
    context: LinkContext,
}

// Crawls from `seeds`, sending every record to `sink` as soon as it exists
pub async fn crawl_site<S, R, K>(
    source: &S,
    classifier: &LinkClassifier<R>,
    settings: &CrawlSettings,
    seeds: &[String],
    sink: &mut K,
) -> Result<CrawlStats>
where
    S: PageSource,
    R: RelevanceCheck,
    K: RecordSink,
{
    let throttle = Throttle::new(settings.delay);
    let concurrency = settings.concurrency.max(1);

    // Every URL ever requested (and every URL a redirect landed on)
    let mut seen: HashSet<String> = HashSet::new();
    let mut stats = CrawlStats::default();

    let mut frontier: Vec<CrawlRequest> = seeds
        .iter()
        .map(|url| CrawlRequest {
            url: url.clone(),
            depth: 0,
            context: LinkContext::seed(),
        })
        .collect();

    while !frontier.is_empty() {
        let batch: Vec<CrawlRequest> = frontier
            .drain(..)
            .filter(|request| seen.insert(request.url.clone()))
            .collect();

        let results = fetch_batch(source, &throttle, batch, concurrency).await;

        let mut next_level = Vec::new();

        for (request, result) in results {
            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    log::warn!("Failed to fetch {}: {:#}", request.url, e);
                    stats.failed += 1;
                    continue;
                }
            };

            // A redirect may land on a page that was (or will be) fetched
            // under its own URL
            if page.url != request.url && !seen.insert(page.url.clone()) {
                log::debug!(
                    "Skipping {}: redirected to already requested {}",
                    request.url,
                    page.url
                );
                continue;
            }

            let outcome = classifier.on_page_fetched(&page, &request.context);

            stats.visited += 1;
            if outcome.record.is_broken_link {
                stats.broken += 1;
            }
            sink.emit(outcome.record)?;

            stats.rejected += outcome.rejected.len();
            for record in outcome.rejected {
                sink.emit(record)?;
            }

            if request.depth < settings.max_depth {
                next_level.extend(outcome.requests.into_iter().map(|(url, context)| {
                    CrawlRequest {
                        url,
                        depth: request.depth + 1,
                        context,
                    }
                }));
            } else if !outcome.requests.is_empty() {
                log::debug!(
                    "Depth limit {} reached at {}: not following {} link(s)",
                    settings.max_depth,
                    page.url,
                    outcome.requests.len()
                );
                stats.skipped_by_depth += outcome.requests.len();
            }
        }

        frontier = next_level;
    }

    Ok(stats)
}

// Fetches one level of the crawl, at most `concurrency` at a time
//
// `buffered` (not `buffer_unordered`) keeps results in request order, so
// records come out in the same order on every run.
async fn fetch_batch<S: PageSource>(
    source: &S,
    throttle: &Throttle,
    batch: Vec<CrawlRequest>,
    concurrency: usize,
) -> Vec<(CrawlRequest, Result<FetchedPage>)> {
    stream::iter(batch)
        .map(|request| async move {
            throttle.wait().await;
            log::debug!("Fetching [depth {}]: {}", request.depth, request.url);
            let result = source.fetch(&request.url).await;
            (request, result)
        })
        .buffered(concurrency)
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{LinkExtractor, LinkRecord};
    use anyhow::anyhow;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;

    // Serves canned pages from memory and remembers what was fetched
    struct StaticSource {
        pages: HashMap<String, FetchedPage>,
        fetched: Mutex<Vec<String>>,
    }

    impl StaticSource {
        fn new() -> Self {
            Self {
                pages: HashMap::new(),
                fetched: Mutex::new(Vec::new()),
            }
        }

        fn page(self, url: &str, status: u16, html: &str) -> Self {
            self.redirect(url, url, status, html)
        }

        fn redirect(mut self, from: &str, to: &str, status: u16, html: &str) -> Self {
            let extractor = LinkExtractor::new(Some("main")).unwrap();
            let page = FetchedPage {
                url: to.to_string(),
                status,
                document: extractor.parse(html, to),
            };
            self.pages.insert(from.to_string(), page);
            self
        }

        fn fetched(&self) -> Vec<String> {
            self.fetched.lock().unwrap().clone()
        }
    }

    impl PageSource for StaticSource {
        fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedPage>> + Send {
            self.fetched.lock().unwrap().push(url.to_string());
            let result = self
                .pages
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("connection refused"));
            std::future::ready(result)
        }
    }

    fn classifier() -> LinkClassifier {
        LinkClassifier::new(
            vec!["example.com".to_string()],
            ["https://example.com/repo/commits".to_string()]
                .into_iter()
                .collect(),
        )
    }

    fn settings(max_depth: usize) -> CrawlSettings {
        CrawlSettings {
            max_depth,
            concurrency: 2,
            delay: Duration::ZERO,
        }
    }

    fn seeds(url: &str) -> Vec<String> {
        vec![url.to_string()]
    }

    fn repo_site() -> StaticSource {
        StaticSource::new()
            .page(
                "https://example.com/repo",
                200,
                r#"<title>My Repo</title><main>
                    <a href="/repo/commits">Commits</a>
                    <a href="/repo/issues">Issues</a>
                    <a href="https://evil.com/page">Evil</a>
                    <a href="/missing">Missing</a>
                </main>"#,
            )
            .page(
                "https://example.com/repo/issues",
                200,
                r#"<title>Issues · My Repo</title><main>
                    <a href="/repo">My Repo</a>
                    <a href="/repo/issues/1">First issue</a>
                </main>"#,
            )
            .page("https://example.com/missing", 404, "<title>Not Found</title>")
            .page(
                "https://example.com/repo/issues/1",
                200,
                "<title>First issue</title><main></main>",
            )
    }

    fn find<'a>(records: &'a [LinkRecord], url: &str) -> &'a LinkRecord {
        records
            .iter()
            .find(|r| r.url == url)
            .unwrap_or_else(|| panic!("no record for {url}"))
    }

    #[tokio::test]
    async fn test_crawl_classifies_pages_and_links() {
        let source = repo_site();
        let mut records: Vec<LinkRecord> = Vec::new();

        let stats = crawl_site(&source, &classifier(), &settings(1), &seeds("https://example.com/repo"), &mut records)
            .await
            .unwrap();

        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/repo",
                "https://example.com/repo/commits",
                "https://evil.com/page",
                "https://example.com/repo/issues",
                "https://example.com/missing",
            ]
        );

        let seed = find(&records, "https://example.com/repo");
        assert_eq!(seed.parent, None);
        assert!(seed.is_allowed && !seed.is_broken_link);

        let commits = find(&records, "https://example.com/repo/commits");
        assert!(!commits.is_allowed && commits.is_valid_page);

        let issues = find(&records, "https://example.com/repo/issues");
        assert_eq!(issues.parent.as_deref(), Some("https://example.com/repo"));
        assert_eq!(issues.link_text.as_deref(), Some("Issues"));
        assert!(issues.is_valid_page);

        let missing = find(&records, "https://example.com/missing");
        assert!(missing.is_broken_link);

        assert_eq!(
            stats,
            CrawlStats {
                visited: 3,
                rejected: 2,
                broken: 1,
                failed: 0,
                skipped_by_depth: 2,
            }
        );
    }

    #[tokio::test]
    async fn test_every_url_is_fetched_once() {
        let source = repo_site();
        let mut records: Vec<LinkRecord> = Vec::new();

        let stats = crawl_site(&source, &classifier(), &settings(5), &seeds("https://example.com/repo"), &mut records)
            .await
            .unwrap();

        let fetched = source.fetched();
        let unique: HashSet<&String> = fetched.iter().collect();
        assert_eq!(fetched.len(), unique.len());
        assert_eq!(fetched.len(), 4);
        assert_eq!(stats.visited, 4);
        assert_eq!(stats.skipped_by_depth, 0);
    }

    #[tokio::test]
    async fn test_depth_zero_only_fetches_seed() {
        let source = repo_site();
        let mut records: Vec<LinkRecord> = Vec::new();

        let stats = crawl_site(&source, &classifier(), &settings(0), &seeds("https://example.com/repo"), &mut records)
            .await
            .unwrap();

        assert_eq!(source.fetched(), vec!["https://example.com/repo".to_string()]);
        // Rejected links are still reported at the depth limit
        assert_eq!(records.len(), 3);
        assert_eq!(stats.rejected, 2);
        assert_eq!(stats.skipped_by_depth, 2);
    }

    #[tokio::test]
    async fn test_transport_failure_produces_no_record() {
        let source = StaticSource::new().page(
            "https://example.com/",
            200,
            r#"<title>Home</title><main><a href="/down">Down</a></main>"#,
        );
        let mut records: Vec<LinkRecord> = Vec::new();

        let stats = crawl_site(&source, &classifier(), &settings(2), &seeds("https://example.com/"), &mut records)
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(source.fetched().len(), 2);
    }

    #[tokio::test]
    async fn test_redirect_reports_effective_url_once() {
        let source = StaticSource::new()
            .page(
                "https://example.com/start",
                200,
                r#"<title>Start</title><main>
                    <a href="/old">Old</a>
                    <a href="/new">New</a>
                </main>"#,
            )
            .redirect("https://example.com/old", "https://example.com/new", 200, "<title>New</title>")
            .page("https://example.com/new", 200, "<title>New</title>");
        let mut records: Vec<LinkRecord> = Vec::new();

        let stats = crawl_site(&source, &classifier(), &settings(1), &seeds("https://example.com/start"), &mut records)
            .await
            .unwrap();

        let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/start", "https://example.com/new"]);
        assert_eq!(stats.visited, 2);
    }

    #[tokio::test]
    async fn test_redirect_target_is_not_fetched_again() {
        let source = StaticSource::new()
            .page(
                "https://example.com/start",
                200,
                r#"<title>Start</title><main><a href="/old">Old</a></main>"#,
            )
            .redirect(
                "https://example.com/old",
                "https://example.com/new",
                200,
                r#"<title>New</title><main><a href="/new">Self</a></main>"#,
            );
        let mut records: Vec<LinkRecord> = Vec::new();

        crawl_site(&source, &classifier(), &settings(3), &seeds("https://example.com/start"), &mut records)
            .await
            .unwrap();

        assert_eq!(
            source.fetched(),
            vec!["https://example.com/start".to_string(), "https://example.com/old".to_string()]
        );
        assert_eq!(records[1].url, "https://example.com/new");
    }

    #[tokio::test]
    async fn test_duplicate_seeds_are_fetched_once() {
        let source = repo_site();
        let mut records: Vec<LinkRecord> = Vec::new();
        let seeds = vec!["https://example.com/repo".to_string(), "https://example.com/repo".to_string()];

        let stats = crawl_site(&source, &classifier(), &settings(0), &seeds, &mut records)
            .await
            .unwrap();

        assert_eq!(stats.visited, 1);
    }
}
