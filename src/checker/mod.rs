// src/checker/mod.rs
// =============================================================================
// This module contains all link classification logic.
//
// Submodules:
// - html: Parses a page into its title and scoped outbound links
// - relevance: The "does this page match its link text" heuristic
// - classify: Allowed / broken / relevant decisions for pages and links
// - record: The LinkRecord output type and the sinks that receive it
//
// Nothing in here touches the network. The crawl module feeds fetched pages
// in and schedules whatever requests come back out.
// =============================================================================

mod classify;
mod html;
mod record;
mod relevance;

pub use classify::LinkClassifier;
pub use html::{FetchedPage, LinkExtractor, PageDocument};
pub use record::{JsonLinesSink, LinkContext, LinkRecord, RecordSink};
pub use relevance::{RelevanceCheck, TitleMatch};
