//! Data models for tracked articles.
//!
//! - [`Article`]: one news item, as persisted in the store and shown on the page
//! - [`RunSummary`]: counts reported at the end of a run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Publisher name used when the feed item carries none.
pub const UNKNOWN_SOURCE: &str = "Unknown";

/// A news article found by one of the configured keyword searches.
///
/// Articles are identified by `link`; two records with the same link are the
/// same article no matter what else differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// Headline as published by the feed.
    pub title: String,
    /// Canonical article URL. Dedup key.
    pub link: String,
    /// Plain-text summary, possibly empty.
    #[serde(default)]
    pub description: String,
    /// Publication time, stored as RFC 3339 UTC.
    #[serde(with = "crate::normalize::timestamp")]
    pub published: DateTime<Utc>,
    /// Publisher name.
    #[serde(default = "default_source")]
    pub source: String,
    /// Label of the keyword whose search produced this article.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

fn default_source() -> String {
    UNKNOWN_SOURCE.to_string()
}

impl Article {
    /// Publisher name for display, never empty.
    pub fn source_name(&self) -> &str {
        if self.source.trim().is_empty() {
            UNKNOWN_SOURCE
        } else {
            &self.source
        }
    }
}

/// What a run did, for the final log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Articles in the store before this run.
    pub existing: usize,
    /// Articles returned by the feed across all keywords.
    pub fetched: usize,
    /// Articles in the store after merge and prune.
    pub total: usize,
}
