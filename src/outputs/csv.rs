//! CSV output.

use crate::models::Article;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Serialize articles to CSV bytes, header row first.
pub fn to_csv(articles: &[Article]) -> Result<Vec<u8>, Box<dyn Error>> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for article in articles {
        writer.serialize(article)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}

#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn write_articles(articles: &[Article], path: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = to_csv(articles)?;
    debug!(bytes = bytes.len(), "Writing CSV");
    fs::write(path, bytes).await?;
    Ok(())
}
