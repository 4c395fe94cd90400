//! Utility functions for logging and file system checks.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and the number of
/// dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
        None => s.to_string(),
    }
}

/// Directory that will hold `file`; the current directory for bare file names.
pub fn parent_dir(file: &Path) -> &Path {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

const WRITE_PROBE: &str = "..__probe_write__";

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes an empty probe
/// file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the probe cannot be
/// written (permission denied, read-only filesystem, path is a file, etc.).
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe = path.join(WRITE_PROBE);
    fs::write(&probe, b"").await?;
    remove_probe(&probe).await;
    info!("Output directory is writable");
    Ok(())
}

/// Delete a write probe, logging when it has to be left behind.
async fn remove_probe(probe: &Path) -> bool {
    match fs::remove_file(probe).await {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %probe.display(), error = %e, "Could not remove write probe");
            false
        }
    }
}
