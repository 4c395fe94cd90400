//! Runtime configuration.
//!
//! Everything a run needs (keywords, lookback window, badge palette, feed
//! endpoint, file paths) lives in [`Config`] and is passed explicitly to each
//! stage. The file format is YAML; any field left out takes the value from
//! [`Config::default`].
//!
//! ```yaml
//! title: GFV News Feed
//! lookback_days: 180
//! keywords:
//!   - label: Green Flag Ventures
//!     query: '"Green Flag Ventures"'
//!     colors: { background: "#d1fae5", foreground: "#065f46" }
//! paths:
//!   data_file: data/news_data.json
//!   output_html: index.html
//! ```

use crate::error::ConfigError;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use url::Url;

// Badge colours for keywords without a palette entry.
const FALLBACK_BACKGROUND: &str = "#f3f4f6";
const FALLBACK_FOREGROUND: &str = "#374151";

const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// Filter value of the page's "All" button.
pub const ALL_FILTER: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Page heading and `<title>`.
    pub title: String,
    /// Search terms, in display order.
    pub keywords: Vec<Keyword>,
    /// Articles older than this many days are pruned from the store.
    pub lookback_days: i64,
    /// Descriptions are cut to this many characters.
    pub description_max_chars: usize,
    pub feed: FeedConfig,
    pub paths: PathsConfig,
}

/// A configured search term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    /// Display label, also stored on every article this keyword fetched.
    pub label: String,
    /// Raw query sent to the search feed.
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colors: Option<BadgeColors>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeColors {
    pub background: String,
    pub foreground: String,
}

/// Upstream search feed settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub endpoint: String,
    /// `hl` parameter.
    pub language: String,
    /// `gl` parameter.
    pub region: String,
    /// `ceid` parameter.
    pub edition: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_file: PathBuf,
    pub output_html: PathBuf,
}

impl Keyword {
    pub fn new(label: &str, query: &str, background: &str, foreground: &str) -> Self {
        Self {
            label: label.to_string(),
            query: query.to_string(),
            colors: Some(BadgeColors {
                background: background.to_string(),
                foreground: foreground.to_string(),
            }),
        }
    }

    /// Background and foreground colour for this keyword's badge.
    pub fn badge_colors(&self) -> (&str, &str) {
        match &self.colors {
            Some(c) => (c.background.as_str(), c.foreground.as_str()),
            None => (FALLBACK_BACKGROUND, FALLBACK_FOREGROUND),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "GFV News Feed".to_string(),
            keywords: vec![
                Keyword::new("Green Flag Ventures", "\"Green Flag Ventures\"", "#d1fae5", "#065f46"),
                Keyword::new("GFV", "\"GFV\" ventures", "#dbeafe", "#1e3a8a"),
                Keyword::new("Justin Zeefee", "\"Justin Zeefee\"", "#fef3c7", "#92400e"),
                Keyword::new("Deborah Fairlamb", "\"Deborah Fairlamb\"", "#ede9fe", "#4c1d95"),
            ],
            lookback_days: 180,
            description_max_chars: 400,
            feed: FeedConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://news.google.com/rss/search".to_string(),
            language: "en-US".to_string(),
            region: "US".to_string(),
            edition: "US:en".to_string(),
            timeout_secs: 20,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                         AppleWebKit/537.36 (KHTML, like Gecko) \
                         Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data").join("news_data.json"),
            output_html: PathBuf::from("index.html"),
        }
    }
}

impl Config {
    /// Load a YAML config file and validate it.
    ///
    /// A missing file is an error here; callers wanting defaults should not
    /// call this.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&raw)?;
        info!(keywords = config.keywords.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.keywords.is_empty() {
            return Err(ConfigError::Invalid("at least one keyword is required".into()));
        }
        let mut labels = HashSet::new();
        let mut queries = HashSet::new();
        for keyword in &self.keywords {
            if keyword.label.trim().is_empty() || keyword.query.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "keyword label and query must be non-empty".into(),
                ));
            }
            // The page's "All" filter button already uses this value.
            if keyword.label == ALL_FILTER {
                return Err(ConfigError::Invalid(format!(
                    "keyword label {ALL_FILTER:?} is reserved"
                )));
            }
            if !labels.insert(keyword.label.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate keyword label {:?}",
                    keyword.label
                )));
            }
            if !queries.insert(keyword.query.trim()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate keyword query {:?}",
                    keyword.query
                )));
            }
        }
        if !(1..=MAX_LOOKBACK_DAYS).contains(&self.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be between 1 and {MAX_LOOKBACK_DAYS}"
            )));
        }
        if self.feed.timeout_secs == 0 {
            return Err(ConfigError::Invalid("feed.timeout_secs must be positive".into()));
        }
        Url::parse(&self.feed.endpoint).map_err(|e| {
            ConfigError::Invalid(format!("feed.endpoint {:?}: {e}", self.feed.endpoint))
        })?;
        Ok(())
    }

    pub fn lookback(&self) -> Duration {
        Duration::days(self.lookback_days)
    }
}
