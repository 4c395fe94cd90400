//! Command-line interface definitions.
//!
//! No argument is required: without a config file the built-in keyword set
//! and paths are used. Every option can also come from an environment
//! variable.

use crate::config::Config;
use crate::error::ConfigError;
use clap::Parser;
use std::path::PathBuf;

/// Fetch news for the configured keywords, update the store and render the page.
///
/// # Examples
///
/// ```sh
/// # Built-in configuration
/// keyword_news_feed
///
/// # Custom keywords and output location
/// keyword_news_feed --config config.yaml --output public/index.html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "NEWS_FEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Article store (JSON); overrides `paths.data_file`
    #[arg(short, long, env = "NEWS_FEED_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Rendered HTML page; overrides `paths.output_html`
    #[arg(short, long, env = "NEWS_FEED_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Lookback window in days; overrides `lookback_days`
    #[arg(short, long, env = "NEWS_FEED_LOOKBACK_DAYS")]
    pub lookback_days: Option<i64>,
}

impl Cli {
    /// Build the run configuration from the config file (or defaults) plus
    /// command-line overrides.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(data_file) = &self.data_file {
            config.paths.data_file = data_file.clone();
        }
        if let Some(output) = &self.output {
            config.paths.output_html = output.clone();
        }
        if let Some(days) = self.lookback_days {
            config.lookback_days = days;
        }
        config.validate()?;
        Ok(config)
    }
}
