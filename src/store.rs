//! Persistent article store.
//!
//! The store is a single pretty-printed JSON array of [`Article`] records. It
//! is read once at the start of a run and rewritten in full at the end.
//!
//! [`merge`] is the only place records are combined: existing records come
//! first so they win over incoming duplicates, then anything older than the
//! lookback window is pruned.

use crate::error::StoreError;
use crate::models::Article;
use chrono::{DateTime, Duration, Utc};
use itertools::Itertools;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, instrument};

/// JSON file holding every tracked article.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read all stored articles.
    ///
    /// A missing file is an empty store. A file that exists but cannot be read
    /// or parsed is an error.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<Vec<Article>, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No existing store; starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let articles: Vec<Article> =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        info!(count = articles.len(), "Loaded existing articles");
        Ok(articles)
    }

    /// Overwrite the store with `articles`, creating parent directories.
    #[instrument(level = "info", skip_all, fields(path = %self.path.display(), count = articles.len()))]
    pub async fn save(&self, articles: &[Article]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(articles)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        info!("Saved articles");
        Ok(())
    }
}

/// Union `existing` and `incoming`, dedup by link, and drop anything published
/// before `now - lookback`.
///
/// The first record seen for a link is kept, so existing records shadow
/// incoming ones. Dedup runs before pruning. Records exactly at the cutoff are
/// kept.
pub fn merge(
    existing: Vec<Article>,
    incoming: Vec<Article>,
    lookback: Duration,
    now: DateTime<Utc>,
) -> Vec<Article> {
    let cutoff = now - lookback;
    let candidates = existing.len() + incoming.len();

    let merged: Vec<Article> = existing
        .into_iter()
        .chain(incoming)
        .unique_by(|article| article.link.clone())
        .filter(|article| article.published >= cutoff)
        .collect();

    debug!(
        candidates,
        kept = merged.len(),
        %cutoff,
        "Merged articles"
    );
    merged
}
