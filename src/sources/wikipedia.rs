//! Wikipedia search through the MediaWiki API

use super::keywords::KeywordMatcher;
use super::traits::{position_score, DataSource};
use crate::error::SourceError;
use crate::network::{ApiRequest, HttpClient};
use crate::results::SearchResult;
use async_trait::async_trait;
use serde_json::json;

/// Default relevance keywords
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "what is",
    "what are",
    "who is",
    "who was",
    "define",
    "definition",
    "history of",
    "wiki",
    "web",
];

/// Longest extract kept as result content, in characters
const MAX_EXTRACT_CHARS: usize = 500;

/// Public web knowledge search
pub struct Wikipedia {
    name: String,
    client: HttpClient,
    api_url: String,
    limit: u32,
    keywords: KeywordMatcher,
}

impl Wikipedia {
    pub fn new(client: HttpClient) -> Self {
        Self {
            name: "Wikipedia".to_string(),
            client,
            api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            limit: 10,
            keywords: KeywordMatcher::new(DEFAULT_KEYWORDS),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_keywords(mut self, keywords: KeywordMatcher) -> Self {
        self.keywords = keywords;
        self
    }

    fn request(&self, query: &str) -> ApiRequest {
        let limit = self.limit.to_string();
        ApiRequest::get(&self.api_url)
            .param("action", "query")
            .param("format", "json")
            .param("generator", "search")
            .param("gsrsearch", query)
            .param("gsrlimit", limit.as_str())
            .param("prop", "extracts|info")
            .param("exintro", "1")
            .param("explaintext", "1")
            .param("exlimit", limit.as_str())
            .param("inprop", "url")
    }

    fn parse(&self, json: &serde_json::Value) -> Vec<SearchResult> {
        let Some(pages) = json
            .get("query")
            .and_then(|q| q.get("pages"))
            .and_then(|p| p.as_object())
        else {
            return Vec::new();
        };

        // Sort by index to maintain search relevance order
        let mut page_list: Vec<_> = pages.values().collect();
        page_list.sort_by_key(|page| {
            page.get("index")
                .and_then(|i| i.as_i64())
                .unwrap_or(i64::MAX)
        });

        page_list
            .into_iter()
            .filter_map(|page| {
                let title = page.get("title").and_then(|t| t.as_str())?;
                let extract = page
                    .get("extract")
                    .and_then(|e| e.as_str())
                    .unwrap_or_default();
                let url = page.get("fullurl").and_then(|u| u.as_str());
                let page_id = page.get("pageid").and_then(|p| p.as_i64());
                Some((title, truncate(extract), url, page_id))
            })
            .enumerate()
            .map(|(index, (title, content, url, page_id))| {
                let mut result =
                    SearchResult::new(&self.name, title, content, position_score(index));
                if let Some(url) = url {
                    result = result.with_url(url);
                }
                if let Some(id) = page_id {
                    result = result.with_metadata("page_id", json!(id));
                }
                result
            })
            .collect()
    }
}

#[async_trait]
impl DataSource for Wikipedia {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SourceError> {
        Ok(())
    }

    fn is_relevant_for(&self, query: &str) -> bool {
        self.keywords.matches(query)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let json: serde_json::Value = self.client.get_json(self.request(query)).await?;
        Ok(self.parse(&json))
    }
}

fn truncate(content: &str) -> String {
    match content.char_indices().nth(MAX_EXTRACT_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
