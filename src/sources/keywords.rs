//! Keyword relevance matching shared by the built-in sources

use regex::{Regex, RegexBuilder};

/// Case-insensitive substring matcher over a fixed keyword list
///
/// A query is relevant when any keyword occurs anywhere in it, so
/// `"chat"` matches `"chatter"` as well.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
    pattern: Option<Regex>,
}

impl KeywordMatcher {
    /// Build a matcher. Empty keywords are ignored.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        let pattern = if keywords.is_empty() {
            None
        } else {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            // Escaped literals always form a valid pattern.
            RegexBuilder::new(&alternation)
                .case_insensitive(true)
                .build()
                .ok()
        };

        Self { keywords, pattern }
    }

    /// Whether any keyword appears in the query
    pub fn matches(&self, query: &str) -> bool {
        self.pattern
            .as_ref()
            .map(|p| p.is_match(query))
            .unwrap_or(false)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
