//! Raw article snapshot.
//!
//! The fetched articles are written as a pretty-printed JSON array before
//! deduplication, so a run can be inspected after the fact. The snapshot is
//! write-once and is never read back by the pipeline.

use crate::models::RawArticle;
use crate::utils::parent_dir;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write `articles` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Fails when the directory cannot be created or the file cannot be written.
/// Callers treat this as non-fatal.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn write_raw_snapshot(path: &Path, articles: &[RawArticle]) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(articles)?;

    let dir = parent_dir(path);
    if let Err(e) = fs::create_dir_all(dir).await {
        error!(dir = %dir.display(), error = %e, "Failed to create snapshot dir");
        return Err(e.into());
    }

    fs::write(path, json).await?;
    info!("Wrote raw article snapshot");
    Ok(())
}
