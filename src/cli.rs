// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Every crawl setting can come from a JSON config file (--config) or from a
// flag. Flags are Option<T> so we can tell "not given" apart from a value
// and let the config file fill in whatever the user didn't pass.
// =============================================================================

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "analyze-links",
    version = "0.1.0",
    about = "Crawl a site and classify every link as allowed, broken and relevant",
    long_about = "analyze-links starts from one or more seed URLs, follows in-page links up to a \
                  shallow depth and reports, for each link, whether it may be crawled, whether it \
                  is broken (HTTP 4xx/5xx) and whether the target page's title matches the link text."
)]
pub struct Cli {
    /// Seed URL(s) to start crawling from (e.g., https://github.com/user/repo)
    pub seeds: Vec<String>,

    /// JSON config file; flags given on the command line take precedence
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Domain a URL must contain to be crawled (repeatable)
    ///
    /// Defaults to the hosts of the seed URLs
    #[arg(long = "allowed-domain", value_name = "DOMAIN")]
    pub allowed_domains: Vec<String>,

    /// URL that must never be crawled, even inside an allowed domain (repeatable)
    #[arg(long = "block", value_name = "URL")]
    pub blocked_urls: Vec<String>,

    /// CSS selector restricting where links are extracted from
    ///
    /// Example: --scope 'main#js-repo-pjax-container'
    #[arg(long, value_name = "CSS")]
    pub scope: Option<String>,

    /// Maximum crawl depth (seeds are depth 0)
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Maximum number of requests in flight
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Delay between two request starts, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Per-request timeout, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Compare link text and page title case-insensitively
    #[arg(long)]
    pub ignore_case: bool,

    /// Collapse whitespace runs before comparing link text and page title
    #[arg(long)]
    pub normalize_whitespace: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table and summary
    Table,
    /// Pretty JSON array, printed when the crawl is done
    Json,
    /// One JSON object per line, streamed while crawling
    Jsonl,
}
