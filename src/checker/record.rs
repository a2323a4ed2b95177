// src/checker/record.rs
// =============================================================================
// This module defines the one data entity the analyzer produces: LinkRecord.
//
// A record is written exactly once:
// - once for every page we actually fetched (a "visited" URL)
// - once for every outbound link we refused to follow (a "rejected" URL)
//
// Records are handed to a RecordSink as soon as they are produced. The sink
// decides what happens next (collect into a Vec, stream as JSON lines, ...).
//
// Rust concepts:
// - Traits: RecordSink is an interface with several implementations
// - Generics: JsonLinesSink<W> works with any std::io::Write
// - serde derive: records serialize to JSON without hand-written code
// =============================================================================

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

// The context a fetch request carries: where the link was found and which
// anchor text pointed at it. Both are None for seed URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkContext {
    pub parent: Option<String>,
    pub link_text: Option<String>,
}

impl LinkContext {
    // Context for a link found on `parent` with the given anchor text
    pub fn new(parent: impl Into<String>, link_text: impl Into<String>) -> Self {
        Self {
            parent: Some(parent.into()),
            link_text: Some(link_text.into()),
        }
    }

    // Context for a seed URL (nothing linked to it)
    pub fn seed() -> Self {
        Self::default()
    }
}

// The classification of a single URL
//
// Optional fields serialize as `null` so every JSON object has the same keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// URL being reported on
    pub url: String,
    /// URL of the page that linked to it (None for a seed URL)
    pub parent: Option<String>,
    /// Anchor text used to reach this URL
    pub link_text: Option<String>,
    /// Whether this URL is permitted to be crawled
    pub is_allowed: bool,
    /// True if fetching it returned a 4xx or 5xx status
    pub is_broken_link: bool,
    /// True if the relevance heuristic passed
    pub is_valid_page: bool,
}

impl LinkRecord {
    // Builds a record from a URL and the context it was reached with
    pub fn new(
        url: impl Into<String>,
        context: &LinkContext,
        is_allowed: bool,
        is_broken_link: bool,
        is_valid_page: bool,
    ) -> Self {
        Self {
            url: url.into(),
            parent: context.parent.clone(),
            link_text: context.link_text.clone(),
            is_allowed,
            is_broken_link,
            is_valid_page,
        }
    }
}

// Receives every record the crawl produces, in the order they are produced
pub trait RecordSink {
    fn emit(&mut self, record: LinkRecord) -> Result<()>;
}

// Collecting into a Vec is the simplest sink (used by the table/json output)
impl RecordSink for Vec<LinkRecord> {
    fn emit(&mut self, record: LinkRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

// Streams one compact JSON object per line to any writer
//
// Each line is flushed right away so a consumer piping stdout sees records
// while the crawl is still running.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn emit(&mut self, record: LinkRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_record_has_no_parent() {
        let record = LinkRecord::new("https://example.com/repo", &LinkContext::seed(), true, false, false);
        assert_eq!(record.parent, None);
        assert_eq!(record.link_text, None);
    }

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut sink: Vec<LinkRecord> = Vec::new();
        let ctx = LinkContext::new("https://example.com", "Docs");
        sink.emit(LinkRecord::new("https://example.com/a", &ctx, true, false, true)).unwrap();
        sink.emit(LinkRecord::new("https://example.com/b", &ctx, false, false, true)).unwrap();
        let urls: Vec<_> = sink.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn test_json_lines_sink_writes_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.emit(LinkRecord::new("https://example.com/repo", &LinkContext::seed(), true, false, false))
            .unwrap();
        sink.emit(LinkRecord::new(
            "https://evil.com/page",
            &LinkContext::new("https://example.com/repo", "Evil"),
            false,
            false,
            true,
        ))
        .unwrap();

        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["parent"], serde_json::Value::Null);
        assert_eq!(first["is_allowed"], true);

        let second: LinkRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.link_text.as_deref(), Some("Evil"));
        assert!(!second.is_allowed);
    }
}
