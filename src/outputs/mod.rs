//! Output generation.
//!
//! - [`html`]: renders the article page
//! - [`write_page`]: writes the rendered page to disk
//!
//! # Output Structure
//!
//! ```text
//! ./
//! ├── data/
//! │   └── news_data.json   # article store
//! └── index.html           # rendered page
//! ```

pub mod html;

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write the rendered page, creating the parent directory if needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_page(path: &Path, html: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, html).await?;
    info!(bytes = html.len(), "Wrote HTML page");
    Ok(())
}
