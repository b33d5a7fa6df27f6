//! Progress reporting, kept apart from the pipeline logic.
//!
//! The pipeline emits [`ReportEvent`]s through a [`Reporter`]; it never
//! prints. [`ConsoleReporter`] renders the human-readable run log on stdout.
//! Structured `tracing` events are emitted separately by the pipeline itself
//! and go to stderr.

use crate::config::SourceKind;
use crate::error::FailureKind;
use crate::models::SourceCount;
use std::path::PathBuf;

const RULE_WIDTH: usize = 60;

/// Number of keywords echoed in the run banner.
const BANNER_KEYWORDS: usize = 8;

/// Something worth telling the user about while a run progresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    RunStarted {
        timestamp: String,
        keywords: Vec<String>,
        sources: usize,
    },
    SourceStarted {
        source: String,
        kind: SourceKind,
    },
    SourceCompleted {
        source: String,
        count: usize,
    },
    SourceFailed {
        source: String,
        kind: FailureKind,
        message: String,
    },
    Summary {
        total: usize,
        by_source: Vec<SourceCount>,
    },
    Saved {
        path: PathBuf,
        count: usize,
    },
    NoMatches,
    RunFinished,
}

/// Receives progress events. Shared across source tasks, hence `Send + Sync`.
pub trait Reporter: Send + Sync {
    fn report(&self, event: ReportEvent);
}

/// Prints the run log to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn report(&self, event: ReportEvent) {
        println!("{}", render(&event));
    }
}

/// Render one event as console text (may span several lines).
pub fn render(event: &ReportEvent) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    match event {
        ReportEvent::RunStarted {
            timestamp,
            keywords,
            sources,
        } => {
            let mut shown = keywords
                .iter()
                .take(BANNER_KEYWORDS)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            if keywords.len() > BANNER_KEYWORDS {
                shown.push_str("...");
            }
            format!(
                "{rule}\nNews scraper starting ({sources} sources)\n{rule}\nDate: {timestamp}\nKeywords: {shown}\n{rule}\n"
            )
        }
        ReportEvent::SourceStarted { source, kind } => match kind {
            SourceKind::Feed => format!("Scraping {source} RSS feed..."),
            SourceKind::Html => format!("Scraping {source}..."),
        },
        ReportEvent::SourceCompleted { source, count } => {
            format!("✅ Found {count} relevant articles from {source}")
        }
        ReportEvent::SourceFailed {
            source,
            kind,
            message,
        } => format!("❌ {kind} scraping {source}: {message}"),
        ReportEvent::Summary { total, by_source } => {
            let mut out = format!("\n{rule}\n📊 SUMMARY: Found {total} unique articles\n{rule}\n");
            out.push_str("\n📈 Articles by source:");
            for entry in by_source {
                out.push_str(&format!("\n   {}: {}", entry.source, entry.count));
            }
            out
        }
        ReportEvent::Saved { path, count } => {
            format!("\n✅ Saved {count} articles\n📂 Location: {}", path.display())
        }
        ReportEvent::NoMatches => "\n⚠️  No articles matched your keywords today.\n💡 Try broadening your keywords or check back tomorrow!".to_string(),
        ReportEvent::RunFinished => "\n✨ Scraping complete!".to_string(),
    }
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every event for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingReporter {
        events: Mutex<Vec<ReportEvent>>,
    }

    impl RecordingReporter {
        pub fn events(&self) -> Vec<ReportEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Reporter for RecordingReporter {
        fn report(&self, event: ReportEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
