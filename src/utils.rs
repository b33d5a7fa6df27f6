//! Small helpers for titles, filenames and log output.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// Prefix of generated output filenames.
pub const OUTPUT_PREFIX: &str = "news_articles";

/// Key used for cross-source duplicate detection: lowercase, trimmed.
pub fn normalize_title(title: &str) -> String {
    title.to_lowercase().trim().to_string()
}

/// Timestamped output filename, e.g. `news_articles_20240506_070809.csv`.
pub fn default_output_filename<Tz>(now: &DateTime<Tz>, extension: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{OUTPUT_PREFIX}_{}.{extension}", now.format("%Y%m%d_%H%M%S"))
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a character
/// boundary) with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…(+{} bytes)", &s[..end], s.len() - end)
}
