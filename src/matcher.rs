//! Case-insensitive keyword matching.
//!
//! A keyword matches when its lowercase form appears anywhere in the
//! lowercase text. Matching is plain substring containment, not token
//! bounded, so `"AI"` matches inside `"against"`.

/// Maximum number of keywords listed in [`KeywordMatcher::matched_terms`].
pub const MAX_MATCHED_TERMS: usize = 3;

/// Label returned by [`KeywordMatcher::matched_terms`] when no keyword is listed.
pub const GENERAL_MATCH: &str = "General Match";

/// Holds the configured keywords and decides whether text is relevant.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    /// `(original, lowercase)` pairs in configured order.
    terms: Vec<(String, String)>,
}

impl KeywordMatcher {
    /// Build a matcher from keywords in their display casing.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms = keywords
            .into_iter()
            .filter_map(|k| {
                let k: String = k.into();
                (!k.is_empty()).then(|| {
                    let lower = k.to_lowercase();
                    (k, lower)
                })
            })
            .collect();
        Self { terms }
    }

    /// Keywords in configured order, original casing.
    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(|(original, _)| original.as_str())
    }

    /// `true` if any configured keyword occurs in `text`. Empty text never matches.
    pub fn matches(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.terms.iter().any(|(_, term)| lower.contains(term.as_str()))
    }

    /// The first three matching keywords in configured order, comma-joined.
    ///
    /// Order follows the keyword list, not where the terms appear in the
    /// text. Returns [`GENERAL_MATCH`] when `text` is empty or nothing matches;
    /// the pipeline only calls this after a positive [`matches`](Self::matches),
    /// so that label never reaches the output in a normal run.
    pub fn matched_terms(&self, text: &str) -> String {
        if text.is_empty() {
            return GENERAL_MATCH.to_string();
        }
        let lower = text.to_lowercase();
        let matched: Vec<&str> = self
            .terms
            .iter()
            .filter(|(_, term)| lower.contains(term.as_str()))
            .map(|(original, _)| original.as_str())
            .take(MAX_MATCHED_TERMS)
            .collect();

        if matched.is_empty() {
            GENERAL_MATCH.to_string()
        } else {
            matched.join(", ")
        }
    }
}
