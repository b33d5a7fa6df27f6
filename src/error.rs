//! Failure kinds recognised at the per-source boundary.
//!
//! Every failure a single source can hit is folded into [`ScrapeError`].
//! None of them are fatal to a run: the pipeline reports the failure and the
//! source contributes zero articles.

use std::fmt;
use thiserror::Error;

/// An error raised while fetching or extracting one source.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// DNS, connection, timeout or non-2xx status.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The document could not be parsed as a feed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Anything else, including a panic inside the source's task.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ScrapeError {
    /// Which of the three recognised failure kinds this error belongs to.
    pub fn kind(&self) -> FailureKind {
        match self {
            ScrapeError::Network(_) => FailureKind::Network,
            ScrapeError::Parse(_) => FailureKind::Parse,
            ScrapeError::Unexpected(_) => FailureKind::Unexpected,
        }
    }
}

impl From<quick_xml::Error> for ScrapeError {
    fn from(err: quick_xml::Error) -> Self {
        ScrapeError::Parse(err.to_string())
    }
}

impl From<quick_xml::encoding::EncodingError> for ScrapeError {
    fn from(err: quick_xml::encoding::EncodingError) -> Self {
        ScrapeError::Parse(err.to_string())
    }
}

/// Coarse classification used by reporters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Parse,
    Unexpected,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Network => "Network error",
            FailureKind::Parse => "Parse error",
            FailureKind::Unexpected => "Unexpected error",
        };
        f.write_str(label)
    }
}
