// src/crawl/mod.rs
// =============================================================================
// This module drives the crawl.
//
// Features:
// - Breadth-first crawling from one or more seed URLs
// - Configurable depth limit
// - Bounded concurrency and a delay between request starts
// - Each URL is fetched once, redirects included
//
// The classifier decides what to follow; this module only fetches and
// schedules. Records flow out through a RecordSink as pages complete.
// =============================================================================

mod fetch;
mod queue;
mod throttle;

pub use fetch::HttpSource;
pub use queue::{crawl_site, CrawlSettings, CrawlStats};
