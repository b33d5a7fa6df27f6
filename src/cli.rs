//! Command-line interface definitions.
//!
//! Every option is optional: with no arguments the built-in keyword list and
//! source table are used and a timestamped CSV lands in the working directory.

use crate::outputs::{OutputFormat, OutputOptions};
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Built-in sources and keywords, timestamped CSV
/// news_keyword_scraper
///
/// # Explicit output file, JSON instead of CSV
/// news_keyword_scraper -o today.json -f json
///
/// # Custom keywords/sources, four sources in flight
/// news_keyword_scraper -c sources.yaml --concurrency 4
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Output file (default: news_articles_<YYYYMMDD>_<HHMMSS>.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Optional path to a YAML file overriding keywords, sources and limits
    #[arg(short, long, env = "NEWS_SCRAPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Number of sources fetched at the same time
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=32))]
    pub concurrency: u16,
}

impl Cli {
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            path: self.output.clone(),
            format: self.format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_keyword_scraper"]);
        assert_eq!(cli.output, None);
        assert_eq!(cli.format, OutputFormat::Csv);
        assert_eq!(cli.concurrency, 1);
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_keyword_scraper",
            "-o",
            "/tmp/out.json",
            "-f",
            "json",
            "-c",
            "/tmp/config.yaml",
        ]);
        let options = cli.output_options();
        assert_eq!(options.path, Some(PathBuf::from("/tmp/out.json")));
        assert_eq!(options.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/config.yaml")));
    }

    #[test]
    fn test_cli_rejects_zero_concurrency() {
        assert!(Cli::try_parse_from(["news_keyword_scraper", "--concurrency", "0"]).is_err());
    }
}
