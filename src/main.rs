//! # Keyword News Feed
//!
//! Tracks news coverage of a fixed set of keyword phrases. Each run searches
//! the Google News RSS feed once per keyword, merges the results into a JSON
//! article store, and renders a static HTML page of everything published
//! within the lookback window.
//!
//! ## Usage
//!
//! ```sh
//! keyword_news_feed --config config.yaml
//! ```
//!
//! ## Architecture
//!
//! The application is a linear pipeline, run once per invocation:
//! 1. **Load**: read the existing article store (missing store = empty)
//! 2. **Fetch**: search each keyword in turn; failed searches are skipped
//! 3. **Merge**: union with the store, dedup by link, prune old articles
//! 4. **Save**: rewrite the store
//! 5. **Render**: write the HTML page with client-side keyword filters
//!
//! Scheduling (e.g. cron) and publishing the page are left to the caller.

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod error;
mod models;
mod normalize;
mod outputs;
mod pipeline;
mod scrapers;
mod store;
mod utils;

use cli::Cli;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("keyword_news_feed starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.data_file, ?args.output, "Parsed CLI arguments");

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    info!(
        keywords = config.keywords.len(),
        lookback_days = config.lookback_days,
        data_file = %config.paths.data_file.display(),
        output = %config.paths.output_html.display(),
        "Configuration ready"
    );

    let summary = match pipeline::run(&config, Utc::now()).await {
        Ok(summary) => summary,
        Err(e) => {
            error!(error = %e, "Run failed");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        existing = summary.existing,
        fetched = summary.fetched,
        total = summary.total,
        "Execution complete"
    );

    Ok(())
}
