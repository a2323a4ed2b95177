// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (timestamped, leveled lines on stderr)
// 2. Parse command-line arguments and merge them with the config file
// 3. Build the classifier and the HTTP page source
// 4. Crawl, sending records to the chosen output
// 5. Exit with proper code (0 = no broken links, 1 = broken links, 2 = error)
// =============================================================================

mod checker; // src/checker/ - classification logic (no network)
mod cli; // src/cli.rs - command-line parsing
mod config; // src/config.rs - config file + flag merging
mod crawl; // src/crawl/ - fetching and scheduling
mod report; // src/report.rs - table / JSON output

use anyhow::Result;
use checker::{JsonLinesSink, LinkRecord};
use clap::Parser;
use cli::{Cli, OutputFormat};
use config::AnalyzerConfig;
use crawl::{crawl_site, HttpSource};

#[tokio::main]
async fn main() {
    init_logging();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// RUST_LOG overrides the default "info" level
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

// Returns:
//   Ok(0) = no broken links
//   Ok(1) = broken links found
//   Err   = bad configuration or output failure
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let config = AnalyzerConfig::load(&cli)?;

    let classifier = config.classifier();
    let source = HttpSource::new(config.timeout(), &config.user_agent, config.extractor()?)?;
    let settings = config.crawl_settings();

    log::info!(
        "Crawling {} (allowed domains: {}, max depth {}, {} concurrent, {} ms delay)",
        config.seeds.join(", "),
        classifier.allowed_domains().join(", "),
        settings.max_depth,
        settings.concurrency,
        settings.delay.as_millis()
    );

    let stats = match cli.format {
        OutputFormat::Jsonl => {
            let mut sink = JsonLinesSink::new(std::io::stdout());
            crawl_site(&source, &classifier, &settings, &config.seeds, &mut sink).await?
        }
        OutputFormat::Json | OutputFormat::Table => {
            let mut records: Vec<LinkRecord> = Vec::new();
            let stats =
                crawl_site(&source, &classifier, &settings, &config.seeds, &mut records).await?;
            if cli.format == OutputFormat::Json {
                report::print_json(&records)?;
            } else {
                report::print_table(&records, &stats);
            }
            stats
        }
    };

    log::info!(
        "Crawl finished: {} visited, {} not allowed, {} broken, {} failed",
        stats.visited,
        stats.rejected,
        stats.broken,
        stats.failed
    );

    if stats.broken > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}
