//! JSON output: a pretty-printed array of article records.

use crate::models::Article;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn write_articles(articles: &[Article], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(articles)?;
    debug!(bytes = json.len(), "Writing JSON");
    fs::write(path, json).await?;
    Ok(())
}
