// src/config.rs
// =============================================================================
// Crawl configuration.
//
// Settings are read, in increasing order of precedence, from:
// 1. Built-in defaults (a gentle crawl: depth 2, 2 requests, 500 ms apart)
// 2. A JSON config file passed with --config
// 3. Command-line flags
//
// Once merged and validated, the config is turned into the pieces the rest
// of the program needs: a LinkClassifier, a LinkExtractor, CrawlSettings and
// the HTTP client settings. Nothing here changes after the crawl starts.
// =============================================================================

use crate::checker::{LinkClassifier, LinkExtractor, TitleMatch};
use crate::cli::Cli;
use crate::crawl::CrawlSettings;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// URLs the crawl starts from
    #[serde(default)]
    pub seeds: Vec<String>,

    /// Substrings a URL must contain to be crawled
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// URLs never crawled, even inside an allowed domain
    #[serde(default)]
    pub blocked_urls: Vec<String>,

    /// CSS selector restricting where links are extracted from
    #[serde(default)]
    pub scope: Option<String>,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Relevance check: compare case-insensitively
    #[serde(default)]
    pub ignore_case: bool,

    /// Relevance check: collapse whitespace before comparing
    #[serde(default)]
    pub normalize_whitespace: bool,
}

fn default_max_depth() -> usize {
    2
}

fn default_concurrency() -> usize {
    2
}

fn default_delay_ms() -> u64 {
    500
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            seeds: Vec::new(),
            allowed_domains: Vec::new(),
            blocked_urls: Vec::new(),
            scope: None,
            max_depth: default_max_depth(),
            concurrency: default_concurrency(),
            delay_ms: default_delay_ms(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            ignore_case: false,
            normalize_whitespace: false,
        }
    }
}

impl AnalyzerConfig {
    // Loads a config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    // Builds the effective config: config file (if any), then CLI flags
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    // Flags that were given replace the corresponding config value. List
    // flags replace the whole list rather than extending it.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if !cli.seeds.is_empty() {
            self.seeds = cli.seeds.clone();
        }
        if !cli.allowed_domains.is_empty() {
            self.allowed_domains = cli.allowed_domains.clone();
        }
        if !cli.blocked_urls.is_empty() {
            self.blocked_urls = cli.blocked_urls.clone();
        }
        if let Some(scope) = &cli.scope {
            self.scope = Some(scope.clone());
        }
        if let Some(max_depth) = cli.max_depth {
            self.max_depth = max_depth;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(delay_ms) = cli.delay_ms {
            self.delay_ms = delay_ms;
        }
        if let Some(timeout_secs) = cli.timeout_secs {
            self.timeout_secs = timeout_secs;
        }
        self.ignore_case |= cli.ignore_case;
        self.normalize_whitespace |= cli.normalize_whitespace;
    }

    // Checks the merged config, brings seeds into the same normalized form
    // the link extractor produces, and fills in the allowed domains from the
    // seed hosts when none were given
    pub fn validate(&mut self) -> Result<()> {
        if self.seeds.is_empty() {
            bail!("No seed URL given (pass one on the command line or set \"seeds\" in the config file)");
        }
        if self.concurrency == 0 {
            bail!("Concurrency must be at least 1");
        }

        let mut hosts = Vec::new();
        let mut seeds: Vec<String> = Vec::new();
        for seed in &self.seeds {
            let mut url = Url::parse(seed).with_context(|| format!("Invalid seed URL '{}'", seed))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                bail!("Seed URL '{}' is not http(s)", seed);
            }
            if let Some(host) = url.host_str() {
                if !hosts.iter().any(|h| h == host) {
                    hosts.push(host.to_string());
                }
            }
            url.set_fragment(None);
            let seed = url.to_string();
            if !seeds.contains(&seed) {
                seeds.push(seed);
            }
        }
        self.seeds = seeds;

        if self.allowed_domains.is_empty() {
            log::info!("No allowed domains configured, using seed hosts: {}", hosts.join(", "));
            self.allowed_domains = hosts;
        }

        Ok(())
    }

    pub fn classifier(&self) -> LinkClassifier {
        // Compared against extracted links, so both sides must be normalized
        let blocked: HashSet<String> = self.blocked_urls.iter().map(|u| normalize_url(u)).collect();
        let relevance = TitleMatch {
            ignore_case: self.ignore_case,
            normalize_whitespace: self.normalize_whitespace,
        };
        LinkClassifier::new(self.allowed_domains.clone(), blocked).with_relevance(relevance)
    }

    pub fn extractor(&self) -> Result<LinkExtractor> {
        LinkExtractor::new(self.scope.as_deref())
    }

    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            max_depth: self.max_depth,
            concurrency: self.concurrency,
            delay: Duration::from_millis(self.delay_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// Normalizes a URL the way the link extractor does ("https://github.com"
// becomes "https://github.com/", fragments are dropped). Strings that don't
// parse are kept as they are.
fn normalize_url(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.to_string(),
    }
}
