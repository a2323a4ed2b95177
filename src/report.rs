// src/report.rs
// =============================================================================
// Printing the crawl results.
//
// - table: a human-readable row per record, then a summary
// - json:  a pretty JSON array of all records
// (jsonl is streamed by the crawl itself through a JsonLinesSink)
//
// Only records and the table go to stdout. Logs go to stderr, so piping the
// JSON output into another tool stays clean.
// =============================================================================

use crate::checker::LinkRecord;
use crate::crawl::CrawlStats;
use anyhow::Result;

// Longest URL shown in the table before it gets cut
const URL_WIDTH: usize = 60;

pub fn print_json(records: &[LinkRecord]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(records)?;
    println!("{}", json_output);
    Ok(())
}

pub fn print_table(records: &[LinkRecord], stats: &CrawlStats) {
    println!(
        "{:<width$} {:<10} {:<8} {:<8}",
        "URL",
        "ALLOWED",
        "BROKEN",
        "RELEVANT",
        width = URL_WIDTH
    );
    println!("{}", "=".repeat(URL_WIDTH + 30));

    for record in records {
        println!(
            "{:<width$} {:<10} {:<8} {:<8}",
            truncate_url(&record.url),
            yes_no(record.is_allowed),
            yes_no(record.is_broken_link),
            yes_no(record.is_valid_page),
            width = URL_WIDTH
        );
    }

    println!();
    print_summary(stats);
}

fn print_summary(stats: &CrawlStats) {
    println!("📊 Summary:");
    println!("   📄 Visited: {}", stats.visited);
    println!("   🚫 Not allowed: {}", stats.rejected);
    println!("   ❌ Broken: {}", stats.broken);
    if stats.failed > 0 {
        println!("   ⚠️  Failed to fetch: {}", stats.failed);
    }
    if stats.skipped_by_depth > 0 {
        println!("   ⏹️  Not followed (depth limit): {}", stats.skipped_by_depth);
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

// Cuts long URLs to fit the column, on a char boundary
fn truncate_url(url: &str) -> String {
    if url.chars().count() <= URL_WIDTH {
        return url.to_string();
    }
    let cut: String = url.chars().take(URL_WIDTH - 3).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url_is_untouched() {
        assert_eq!(truncate_url("https://example.com/repo"), "https://example.com/repo");
    }

    #[test]
    fn test_long_url_is_cut() {
        let url = format!("https://example.com/{}", "a".repeat(100));
        let shown = truncate_url(&url);
        assert_eq!(shown.chars().count(), URL_WIDTH);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn test_multibyte_url_does_not_panic() {
        let url = format!("https://example.com/{}", "é".repeat(80));
        assert!(truncate_url(&url).ends_with("..."));
    }
}
