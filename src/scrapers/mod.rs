//! Turning fetched documents into headline candidates.
//!
//! # Supported formats
//!
//! | Format | Module | Title | Link | Match text |
//! |--------|--------|-------|------|------------|
//! | RSS | [`feed`] | `item/title` | `item/link` text | title + description |
//! | Atom | [`feed`] | `entry/title` | `entry/link/@href` | title only |
//! | HTML | [`html`] | `h2`/`h3` or `a[class*=article]` text | `href`, made absolute | title only |
//!
//! The RSS/Atom asymmetry in match text is deliberate and preserved.
//! Every format stops after the configured number of items in document order.

pub mod feed;
pub mod html;

use crate::error::ScrapeError;
use crate::models::Candidate;
use url::Url;

/// A fetched document, tagged with how it should be read.
#[derive(Debug, Clone, Copy)]
pub enum Document<'a> {
    /// RSS or Atom bytes, told apart by the root element. The encoding named
    /// in the XML declaration is honoured.
    Feed(&'a [u8]),
    /// HTML already decoded with the response charset; relative links
    /// resolve against `base_url`.
    Html { markup: &'a str, base_url: &'a Url },
}

/// Limits applied during extraction.
#[derive(Debug, Clone, Copy)]
pub struct ExtractLimits {
    /// Cap on items (feeds) or on each selector's matches (HTML).
    pub max_items: usize,
    /// HTML titles shorter than this, after trimming, are dropped.
    pub min_title_len: usize,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_items: 20,
            min_title_len: 10,
        }
    }
}

/// Extract candidates from a fetched document.
///
/// # Errors
///
/// Returns [`ScrapeError::Parse`] when a feed is not well-formed XML or does
/// not match its declared encoding. HTML parsing is lenient and never fails.
pub fn extract(document: Document<'_>, limits: ExtractLimits) -> Result<Vec<Candidate>, ScrapeError> {
    match document {
        Document::Feed(xml) => feed::extract(xml, limits.max_items),
        Document::Html { markup, base_url } => Ok(html::extract(markup, base_url, limits)),
    }
}
