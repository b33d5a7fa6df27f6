//! # News Keyword Scraper
//!
//! Pulls headlines from a fixed list of RSS/Atom feeds and one HTML page,
//! keeps those that mention any configured keyword, removes duplicates and
//! writes the survivors to a CSV file.
//!
//! ## Usage
//!
//! ```sh
//! news_keyword_scraper -o matches.csv
//! ```
//!
//! ## Architecture
//!
//! 1. **Fetching**: one HTTP request per source ([`fetcher`])
//! 2. **Extraction**: RSS, Atom or HTML headlines ([`scrapers`])
//! 3. **Filtering**: case-insensitive keyword containment ([`matcher`])
//! 4. **Deduplication and output**: [`pipeline`] and [`outputs`]
//!
//! A failing source never stops the run; only output errors do.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod fetcher;
mod matcher;
mod models;
mod outputs;
mod pipeline;
mod report;
mod scrapers;
#[cfg(test)]
mod test_support;
mod utils;

use cli::Cli;
use config::Config;
use pipeline::Pipeline;
use report::ConsoleReporter;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init (stderr, so the run report owns stdout) ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("news_keyword_scraper starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let config = match &args.config {
        Some(path) => Config::load(path).await?,
        None => Config::default(),
    };

    let pipeline = Pipeline::new(&config, Arc::new(ConsoleReporter))?
        .with_concurrency(usize::from(args.concurrency));
    let outcome = pipeline.run(&args.output_options()).await?;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        articles = outcome.articles.len(),
        sources_with_matches = outcome.by_source.len(),
        written = outcome.output_path.is_some(),
        "Execution complete"
    );
    Ok(())
}
