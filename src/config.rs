//! Run configuration: keywords, source table and fetch limits.
//!
//! [`Config::default`] reproduces the built-in keyword list and the nine
//! sources in their run order. A YAML file passed with `--config` can
//! override any field; omitted fields keep their defaults.
//!
//! ```yaml
//! keywords: ["Rust", "WebAssembly"]
//! sources:
//!   - name: Hacker News
//!     url: https://news.ycombinator.com/rss
//!   - name: Example Blog
//!     url: https://blog.example.com/
//!     kind: html
//!     base_url: https://blog.example.com
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Browser-like user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const GOOGLE_NEWS_TECHNOLOGY: &str =
    "https://news.google.com/rss/topics/CAAqJggKIiBDQkFTRWdvSUwyMHZNRGRqTVhZU0FtVnVHZ0pWVXlnQVAB";
const GOOGLE_NEWS_BUSINESS: &str =
    "https://news.google.com/rss/topics/CAAqJggKIiBDQkFTRWdvSUwyMHZNRGx6TVdZU0FtVnVHZ0pWVXlnQVAB";

/// How a source's document is turned into candidates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// RSS or Atom XML; the dialect is detected from the root element.
    #[default]
    Feed,
    /// A plain HTML page scraped for headlines.
    Html,
}

/// One named endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub kind: SourceKind,
    /// Base for resolving relative links on HTML pages; defaults to `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl SourceConfig {
    pub fn feed(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            kind: SourceKind::Feed,
            base_url: None,
        }
    }

    pub fn html(name: impl Into<String>, url: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            kind: SourceKind::Html,
            base_url: Some(base_url.into()),
        }
    }

    pub fn is_feed(&self) -> bool {
        self.kind == SourceKind::Feed
    }

    /// The URL relative links on this source are resolved against.
    pub fn base(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.base_url.as_deref().unwrap_or(&self.url))
    }
}

/// Everything a run needs besides the output destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keywords in display casing; order decides which three are reported.
    pub keywords: Vec<String>,
    /// Sources in run order.
    pub sources: Vec<SourceConfig>,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Items considered per source, in document order.
    pub max_items_per_source: usize,
    /// Minimum trimmed title length for scraped HTML headlines.
    pub min_title_len: usize,
    /// Pause between consecutive feed requests.
    pub courtesy_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keywords: default_keywords(),
            sources: default_sources(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 15,
            max_items_per_source: 20,
            min_title_len: 10,
            courtesy_delay_ms: 1000,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn courtesy_delay(&self) -> Duration {
        Duration::from_millis(self.courtesy_delay_ms)
    }

    /// Reject configurations that would make every run meaningless.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err("config lists no keywords".into());
        }
        for source in &self.sources {
            if source.kind == SourceKind::Html {
                source
                    .base()
                    .map_err(|e| format!("source {:?}: invalid base url: {e}", source.name))?;
            }
        }
        Ok(())
    }

    /// Load a YAML config file, falling back to defaults for missing fields.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = fs::read_to_string(path).await?;
        let config: Config = serde_yaml::from_str(&raw)?;
        config.validate()?;
        info!(
            keywords = config.keywords.len(),
            sources = config.sources.len(),
            "Loaded configuration"
        );
        Ok(config)
    }
}

/// The built-in keyword list.
pub fn default_keywords() -> Vec<String> {
    [
        "AI",
        "Artificial Intelligence",
        "Machine Learning",
        "ML",
        "India",
        "Indian",
        "BJP",
        "Congress",
        "Election",
        "Politics",
        "CFA",
        "Chartered Financial Analyst",
        "Finance",
        "Financial",
        "Automation",
        "RPA",
        "Automate",
        "Financial Modeling",
        "Valuation",
        "DCF",
        "Investment",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// The built-in source table, in run order.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::feed("TechCrunch", "https://techcrunch.com/feed/"),
        SourceConfig::feed("Google News (india)", google_news_url("india")),
        SourceConfig::feed("Google News (finance)", google_news_url("finance")),
        SourceConfig::feed("Google News (technology)", google_news_url("technology")),
        SourceConfig::feed(
            "Economic Times",
            "https://economictimes.indiatimes.com/rssfeedstopstories.cms",
        ),
        SourceConfig::feed(
            "The Hindu",
            "https://www.thehindu.com/news/national/feeder/default.rss",
        ),
        SourceConfig::feed("BBC News", "http://feeds.bbci.co.uk/news/rss.xml"),
        SourceConfig::feed(
            "Reuters",
            "https://www.reutersagency.com/feed/?taxonomy=best-topics&post_type=best",
        ),
        SourceConfig::html(
            "NewsLaundry",
            "https://www.newslaundry.com/",
            "https://www.newslaundry.com",
        ),
    ]
}

/// Google News RSS endpoint for a topic.
///
/// `technology` and `business` map to Google's curated topic feeds; anything
/// else becomes an Indian-edition search for the topic text.
pub fn google_news_url(topic: &str) -> String {
    match topic {
        "technology" => GOOGLE_NEWS_TECHNOLOGY.to_string(),
        "business" => GOOGLE_NEWS_BUSINESS.to_string(),
        other => format!(
            "https://news.google.com/rss/search?q={}&hl=en-IN&gl=IN&ceid=IN:en",
            urlencoding::encode(other)
        ),
    }
}
