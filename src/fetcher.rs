//! Retrieval of source documents and per-source failure containment.
//!
//! [`SourceFetcher`] owns one `reqwest` client configured with the browser-like
//! user agent and the request timeout. [`SourceFetcher::collect`] is the
//! boundary for a single source: whatever goes wrong inside it is reported
//! and turned into an empty batch, so the run carries on with the next source.

use crate::config::{SourceConfig, SourceKind};
use crate::error::ScrapeError;
use crate::matcher::KeywordMatcher;
use crate::models::Article;
use crate::pipeline::dedupe_within_source;
use crate::report::{ReportEvent, Reporter};
use crate::scrapers::{self, Document, ExtractLimits};
use crate::utils::truncate_for_log;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// HTTP client shared by all sources of a run.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    /// Build a fetcher sending `user_agent` and giving up after `timeout`.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Like [`new`](Self::new) but ignoring proxy environment variables, so
    /// tests can reach their local servers.
    #[cfg(test)]
    pub(crate) fn direct(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .no_proxy()
            .build()
            .unwrap();
        Self { client }
    }

    async fn get(&self, url: &str) -> Result<Response, ScrapeError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Download `url` and return the raw response body.
    ///
    /// # Errors
    ///
    /// [`ScrapeError::Network`] for DNS, connection and timeout failures, and
    /// for any non-2xx status.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScrapeError> {
        let body = self.get(url).await?.bytes().await?;
        debug!(bytes = body.len(), "Fetched document");
        Ok(body.to_vec())
    }

    /// Download `url` and decode it with the charset from `Content-Type`,
    /// falling back to UTF-8.
    ///
    /// # Errors
    ///
    /// Same as [`fetch`](Self::fetch).
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        let body = self.get(url).await?.text().await?;
        debug!(bytes = body.len(), "Fetched page");
        Ok(body)
    }

    /// Fetch one source, extract candidates and keep the keyword matches.
    ///
    /// Feeds are parsed from raw bytes so the XML declaration decides their
    /// encoding; HTML pages are decoded with the response charset. HTML
    /// sources additionally drop repeated titles within their own batch.
    ///
    /// # Errors
    ///
    /// Propagates network and parse failures; a source whose base URL cannot
    /// be parsed fails as [`ScrapeError::Unexpected`].
    pub async fn scrape(
        &self,
        source: &SourceConfig,
        matcher: &KeywordMatcher,
        limits: ExtractLimits,
        date: &str,
    ) -> Result<Vec<Article>, ScrapeError> {
        let candidates = match source.kind {
            SourceKind::Feed => {
                let body = self.fetch(&source.url).await?;
                scrapers::extract(Document::Feed(&body), limits).inspect_err(|e| {
                    debug!(
                        error = %e,
                        preview = %truncate_for_log(&String::from_utf8_lossy(&body), 200),
                        "Document did not parse"
                    );
                })?
            }
            SourceKind::Html => {
                let base_url = source
                    .base()
                    .map_err(|e| ScrapeError::Unexpected(format!("invalid base url: {e}")))?;
                let markup = self.fetch_text(&source.url).await?;
                let document = Document::Html {
                    markup: &markup,
                    base_url: &base_url,
                };
                scrapers::extract(document, limits)?
            }
        };
        let total = candidates.len();

        let articles: Vec<Article> = candidates
            .into_iter()
            .filter(|c| matcher.matches(&c.match_text))
            .map(|c| Article {
                source: source.name.clone(),
                matched_keywords: matcher.matched_terms(&c.match_text),
                title: c.title,
                link: c.link,
                date: date.to_string(),
            })
            .collect();
        debug!(candidates = total, matched = articles.len(), "Filtered candidates");

        Ok(match source.kind {
            SourceKind::Html => dedupe_within_source(articles),
            SourceKind::Feed => articles,
        })
    }

    /// Run [`scrape`](Self::scrape) for one source, reporting the outcome.
    ///
    /// Never fails: any error is reported and yields an empty batch.
    #[instrument(level = "info", skip_all, fields(source = %source.name))]
    pub async fn collect(
        &self,
        source: &SourceConfig,
        matcher: &KeywordMatcher,
        limits: ExtractLimits,
        date: &str,
        reporter: &dyn Reporter,
    ) -> Vec<Article> {
        reporter.report(ReportEvent::SourceStarted {
            source: source.name.clone(),
            kind: source.kind,
        });

        match self.scrape(source, matcher, limits, date).await {
            Ok(articles) => {
                info!(count = articles.len(), "Found relevant articles");
                reporter.report(ReportEvent::SourceCompleted {
                    source: source.name.clone(),
                    count: articles.len(),
                });
                articles
            }
            Err(e) => {
                match &e {
                    ScrapeError::Parse(_) => warn!(error = %e, url = %source.url, "Feed did not parse"),
                    _ => error!(error = %e, url = %source.url, "Source failed"),
                }
                reporter.report(ReportEvent::SourceFailed {
                    source: source.name.clone(),
                    kind: e.kind(),
                    message: e.to_string(),
                });
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_USER_AGENT, default_keywords};
    use crate::error::FailureKind;
    use crate::report::recording::RecordingReporter;
    use crate::test_support::MockServer;

    const TWO_ITEM_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>India signs new trade deal</title><link>https://example.com/india</link></item>
  <item><title>Local bakery wins award</title><link>https://example.com/bakery</link></item>
</channel></rss>"#;

    fn fetcher() -> SourceFetcher {
        SourceFetcher::direct(DEFAULT_USER_AGENT, Duration::from_secs(5))
    }

    fn matcher() -> KeywordMatcher {
        KeywordMatcher::new(default_keywords())
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start("200 OK", "application/rss+xml", TWO_ITEM_FEED).await;
        let body = fetcher().fetch(&server.url("/feed")).await.unwrap();
        assert_eq!(body, TWO_ITEM_FEED.as_bytes());

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].starts_with("GET /feed "));
        assert!(
            requests[0]
                .to_lowercase()
                .contains(&format!("user-agent: {}", DEFAULT_USER_AGENT.to_lowercase()))
        );
    }

    #[tokio::test]
    async fn test_fetch_non_2xx_is_network_error() {
        let server = MockServer::start("503 Service Unavailable", "text/plain", "down").await;
        let err = fetcher().fetch(&server.url("/feed")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::Network);
    }

    #[tokio::test]
    async fn test_scrape_keeps_only_matching_items() {
        let server = MockServer::start("200 OK", "application/rss+xml", TWO_ITEM_FEED).await;
        let source = SourceConfig::feed("Test Feed", server.url("/feed"));
        let articles = fetcher()
            .scrape(&source, &matcher(), ExtractLimits::default(), "2024-05-06")
            .await
            .unwrap();

        assert_eq!(
            articles,
            vec![Article {
                source: "Test Feed".into(),
                title: "India signs new trade deal".into(),
                link: "https://example.com/india".into(),
                date: "2024-05-06".into(),
                matched_keywords: "India".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_scrape_html_dedupes_titles_and_resolves_links() {
        let page = r#"<html><body>
            <h2><a href="/politics/1">Election commission meets parties</a></h2>
            <h3><a href="/politics/1">Election commission meets parties</a></h3>
            <a class="article-card" href="/food">Street food festival opens</a>
        </body></html>"#;
        let server = MockServer::start("200 OK", "text/html", page).await;
        let source = SourceConfig::html("Test Page", server.url("/"), "https://www.newslaundry.com");
        let articles = fetcher()
            .scrape(&source, &matcher(), ExtractLimits::default(), "2024-05-06")
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://www.newslaundry.com/politics/1");
        assert_eq!(articles[0].matched_keywords, "Election");
    }

    #[tokio::test]
    async fn test_scrape_html_uses_response_charset() {
        let mut page = b"<html><body><h2><a href=\"/c\">Caf".to_vec();
        page.push(0xE9);
        page.extend_from_slice(b" owners cheer India budget</a></h2></body></html>");
        let server = MockServer::start("200 OK", "text/html; charset=iso-8859-1", page).await;
        let source = SourceConfig::html("Test Page", server.url("/"), "https://www.newslaundry.com");
        let articles = fetcher()
            .scrape(&source, &matcher(), ExtractLimits::default(), "2024-05-06")
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Caf\u{e9} owners cheer India budget");
    }

    #[tokio::test]
    async fn test_scrape_feed_uses_declared_encoding() {
        let mut feed = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><rss><channel><item><title>Caf".to_vec();
        feed.push(0xE9);
        feed.extend_from_slice(b" India investment news</title></item></channel></rss>");
        // Content-Type says UTF-8; the XML declaration wins
        let server = MockServer::start("200 OK", "application/rss+xml; charset=utf-8", feed).await;
        let source = SourceConfig::feed("Test Feed", server.url("/feed"));
        let articles = fetcher()
            .scrape(&source, &matcher(), ExtractLimits::default(), "2024-05-06")
            .await
            .unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Caf\u{e9} India investment news");
    }

    #[tokio::test]
    async fn test_collect_contains_unreachable_source() {
        let reporter = RecordingReporter::default();
        let source = SourceConfig::feed("Nowhere", "http://127.0.0.1:1/feed");
        let articles = fetcher()
            .collect(&source, &matcher(), ExtractLimits::default(), "2024-05-06", &reporter)
            .await;

        assert!(articles.is_empty());
        let events = reporter.events();
        assert!(matches!(
            &events[1],
            ReportEvent::SourceFailed { source, kind: FailureKind::Network, .. } if source == "Nowhere"
        ));
    }

    #[tokio::test]
    async fn test_collect_contains_malformed_feed() {
        let server = MockServer::start("200 OK", "application/rss+xml", "<rss><channel>").await;
        let reporter = RecordingReporter::default();
        let source = SourceConfig::feed("Broken", server.url("/feed"));
        let articles = fetcher()
            .collect(&source, &matcher(), ExtractLimits::default(), "2024-05-06", &reporter)
            .await;

        assert!(articles.is_empty());
        assert!(matches!(
            &reporter.events()[1],
            ReportEvent::SourceFailed { kind: FailureKind::Parse, .. }
        ));
    }
}
