//! Run orchestration: sources in, deduplicated articles and an output file out.
//!
//! A run goes through these steps in order:
//!
//! 1. **Collect**: each configured source is fetched, extracted and keyword
//!    filtered inside its own task (see [`SourceFetcher::collect`]). HTML
//!    sources drop repeated titles within their own batch.
//! 2. **Merge**: batches are concatenated in source order.
//! 3. **Deduplicate**: titles are compared lowercase and trimmed; the first
//!    occurrence wins and titles of ten characters or fewer are dropped.
//! 4. **Summarize**: counts per source, highest first.
//! 5. **Write**: the output file is written only if something survived.
//!
//! By default sources run one at a time with a courtesy pause between two
//! consecutive feed requests. A higher concurrency runs several sources at
//! once; results still come back in configured order.

use crate::config::{Config, SourceConfig};
use crate::error::ScrapeError;
use crate::fetcher::SourceFetcher;
use crate::matcher::KeywordMatcher;
use crate::models::{Article, SourceCount};
use crate::outputs::{self, OutputOptions};
use crate::report::{ReportEvent, Reporter};
use crate::scrapers::ExtractLimits;
use crate::utils::normalize_title;
use chrono::Local;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use std::collections::HashSet;
use std::error::Error;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument};

/// Normalized titles this short or shorter never reach the output.
pub const MIN_UNIQUE_TITLE_LEN: usize = 10;

/// What a finished run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// Articles that survived both deduplication passes, in merge order.
    pub articles: Vec<Article>,
    /// Per-source counts, highest first.
    pub by_source: Vec<SourceCount>,
    /// Absolute path of the written file, if anything was written.
    pub output_path: Option<PathBuf>,
}

/// Drop articles whose exact title already appeared earlier in the batch.
pub fn dedupe_within_source(articles: Vec<Article>) -> Vec<Article> {
    articles
        .into_iter()
        .unique_by(|article| article.title.clone())
        .collect()
}

/// Keep the first article for each normalized title, skipping short titles.
pub fn dedupe_across_sources(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|article| {
            let key = normalize_title(&article.title);
            key.chars().count() > MIN_UNIQUE_TITLE_LEN && seen.insert(key)
        })
        .collect()
}

/// Count articles per source, highest count first.
///
/// Ties keep the order in which sources were first encountered.
pub fn summarize(articles: &[Article]) -> Vec<SourceCount> {
    let mut counts: Vec<SourceCount> = Vec::new();
    for article in articles {
        match counts.iter_mut().find(|c| c.source == article.source) {
            Some(entry) => entry.count += 1,
            None => counts.push(SourceCount {
                source: article.source.clone(),
                count: 1,
            }),
        }
    }
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Run `work` in its own task so a panic inside it is contained.
///
/// A panicking or cancelled task is reported as an unexpected failure for
/// `source` and contributes nothing.
async fn contained<F>(source: &str, reporter: &dyn Reporter, work: F) -> Vec<Article>
where
    F: Future<Output = Vec<Article>> + Send + 'static,
{
    match tokio::spawn(work).await {
        Ok(articles) => articles,
        Err(join_error) => {
            let message = if join_error.is_panic() {
                "source task panicked".to_string()
            } else {
                join_error.to_string()
            };
            let e = ScrapeError::Unexpected(message);
            error!(%source, error = %e, "Source task aborted");
            reporter.report(ReportEvent::SourceFailed {
                source: source.to_string(),
                kind: e.kind(),
                message: e.to_string(),
            });
            Vec::new()
        }
    }
}

/// Drives one run over a fixed source list.
pub struct Pipeline {
    fetcher: Arc<SourceFetcher>,
    matcher: Arc<KeywordMatcher>,
    sources: Vec<SourceConfig>,
    limits: ExtractLimits,
    courtesy_delay: Duration,
    concurrency: usize,
    reporter: Arc<dyn Reporter>,
}

impl Pipeline {
    /// Build a sequential pipeline from `config`.
    pub fn new(config: &Config, reporter: Arc<dyn Reporter>) -> Result<Self, reqwest::Error> {
        let fetcher = SourceFetcher::new(&config.user_agent, config.timeout())?;
        Ok(Self {
            fetcher: Arc::new(fetcher),
            matcher: Arc::new(KeywordMatcher::new(config.keywords.iter().cloned())),
            sources: config.sources.clone(),
            limits: ExtractLimits {
                max_items: config.max_items_per_source,
                min_title_len: config.min_title_len,
            },
            courtesy_delay: config.courtesy_delay(),
            concurrency: 1,
            reporter,
        })
    }

    /// Allow up to `concurrency` sources in flight (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[cfg(test)]
    fn with_fetcher(mut self, fetcher: SourceFetcher) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    /// Whether to pause after source `index`: only between two feed sources.
    fn pauses_after(&self, index: usize) -> bool {
        let current = &self.sources[index];
        let next = self.sources.get(index + 1);
        current.is_feed() && next.is_some_and(SourceConfig::is_feed)
    }

    async fn run_source(&self, index: usize, date: String) -> Vec<Article> {
        let source = self.sources[index].clone();
        let name = source.name.clone();
        let fetcher = Arc::clone(&self.fetcher);
        let matcher = Arc::clone(&self.matcher);
        let reporter = Arc::clone(&self.reporter);
        let limits = self.limits;

        let work = async move {
            fetcher
                .collect(&source, &matcher, limits, &date, reporter.as_ref())
                .await
        };
        let articles = contained(&name, self.reporter.as_ref(), work).await;

        if self.pauses_after(index) && !self.courtesy_delay.is_zero() {
            sleep(self.courtesy_delay).await;
        }
        articles
    }

    /// Collect every source and return one batch per source, in source order.
    pub async fn collect(&self, date: &str) -> Vec<Vec<Article>> {
        stream::iter(0..self.sources.len())
            .map(|index| self.run_source(index, date.to_string()))
            .buffered(self.concurrency)
            .collect()
            .await
    }

    /// Execute a full run and write the output file if anything matched.
    ///
    /// # Errors
    ///
    /// Only output failures are returned; source failures are reported and
    /// skipped.
    #[instrument(level = "info", skip_all, fields(sources = self.sources.len(), concurrency = self.concurrency))]
    pub async fn run(&self, output: &OutputOptions) -> Result<RunOutcome, Box<dyn Error>> {
        let started = Local::now();
        self.reporter.report(ReportEvent::RunStarted {
            timestamp: started.format("%Y-%m-%d %H:%M:%S").to_string(),
            keywords: self.matcher.keywords().map(String::from).collect(),
            sources: self.sources.len(),
        });
        info!(keywords = self.matcher.keywords().count(), "Run started");

        let date = started.format("%Y-%m-%d").to_string();
        let merged: Vec<Article> = self.collect(&date).await.into_iter().flatten().collect();
        let merged_count = merged.len();

        let articles = dedupe_across_sources(merged);
        let by_source = summarize(&articles);
        info!(
            merged = merged_count,
            unique = articles.len(),
            "Deduplicated articles"
        );
        self.reporter.report(ReportEvent::Summary {
            total: articles.len(),
            by_source: by_source.clone(),
        });

        let output_path = if articles.is_empty() {
            info!("No articles matched; skipping output");
            self.reporter.report(ReportEvent::NoMatches);
            None
        } else {
            let path = outputs::write_articles(&articles, output, &started).await?;
            self.reporter.report(ReportEvent::Saved {
                path: path.clone(),
                count: articles.len(),
            });
            Some(path)
        };

        self.reporter.report(ReportEvent::RunFinished);
        Ok(RunOutcome {
            articles,
            by_source,
            output_path,
        })
    }
}
