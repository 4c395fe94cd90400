//! Error types for the fallible stages of a run.
//!
//! Fetch errors are recovered per keyword by the caller. Store and config
//! errors are fatal and bubble up to `main`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to retrieve or parse the search feed for one keyword.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to parse RSS feed: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("response is not an RSS feed (no <channel> element)")]
    NotRss,
}

/// Failure to read or write the persisted article store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("store {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize articles: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write store {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Failure to load or validate the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
