//! Writers for the run's output file.
//!
//! # Submodules
//!
//! - [`csv`]: the default tabular output, one row per article with a header row
//! - [`json`]: the same records as a pretty-printed JSON array
//!
//! Either way the columns are `source`, `title`, `link`, `date`,
//! `matched_keywords`, in that order, and the file is UTF-8. When no path is
//! given the file lands in the working directory as
//! `news_articles_<YYYYMMDD>_<HHMMSS>.<ext>`.

pub mod csv;
pub mod json;

use crate::models::Article;
use crate::utils::default_output_filename;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use std::error::Error;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Serialization used for the output file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

/// Where and how to write the surviving articles.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    /// Explicit destination; a timestamped name is generated when `None`.
    pub path: Option<PathBuf>,
    pub format: OutputFormat,
}

impl OutputOptions {
    /// The destination for a run started at `now`.
    pub fn resolve_path(&self, now: &DateTime<Local>) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| PathBuf::from(default_output_filename(now, self.format.extension())))
    }
}

/// Write `articles` and return the absolute path of the file.
///
/// Write failures are returned to the caller; nothing here retries.
#[instrument(level = "info", skip_all, fields(count = articles.len(), format = ?options.format))]
pub async fn write_articles(
    articles: &[Article],
    options: &OutputOptions,
    now: &DateTime<Local>,
) -> Result<PathBuf, Box<dyn Error>> {
    let path = options.resolve_path(now);
    match options.format {
        OutputFormat::Csv => csv::write_articles(articles, &path).await?,
        OutputFormat::Json => json::write_articles(articles, &path).await?,
    }
    let absolute = std::path::absolute(&path)?;
    info!(path = %absolute.display(), "Wrote output file");
    Ok(absolute)
}
