//! Data models shared by the extractors, the pipeline and the writers.
//!
//! - [`Candidate`]: a raw `(title, link)` pair pulled out of a document,
//!   together with the text the keyword matcher should look at
//! - [`Article`]: a candidate that matched, stamped with its source and the
//!   generation date; this is the row written to the output file
//! - [`SourceCount`]: one line of the per-source summary

use serde::{Deserialize, Serialize};

/// A headline extracted from a feed or page, before keyword filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The headline text, trimmed.
    pub title: String,
    /// Link to the story as published, trimmed, or an empty string when the
    /// document had none. HTML links are made absolute; feed links are not.
    pub link: String,
    /// Text handed to the keyword matcher.
    ///
    /// For RSS this is the title and description joined by a space; for Atom
    /// and HTML it is the title alone.
    pub match_text: String,
}

/// A keyword-matching article, as written to the output file.
///
/// Field order here is the column order of the CSV output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    /// The configured display name of the source, e.g. `"BBC News"`.
    pub source: String,
    /// The headline.
    pub title: String,
    /// The story URL; may be empty.
    pub link: String,
    /// Date the run produced this row (`YYYY-MM-DD`), not the publish date.
    pub date: String,
    /// Up to three matched keywords, comma-joined, in configured order.
    pub matched_keywords: String,
}

/// Number of surviving articles contributed by one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCount {
    pub source: String,
    pub count: usize,
}
