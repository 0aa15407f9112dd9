//! Document store backed by a local JSON file

use super::keywords::KeywordMatcher;
use super::traits::DataSource;
use crate::error::SourceError;
use crate::results::SearchResult;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::info;

/// Default relevance keywords
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "doc",
    "guide",
    "policy",
    "runbook",
    "handbook",
    "manual",
    "how to",
    "process",
];

/// One entry in the backing file
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// Term-matching search over a JSON array of documents
///
/// The file is read on `connect`; searching before that fails with
/// [`SourceError::NotConnected`].
pub struct Documents {
    name: String,
    path: PathBuf,
    limit: usize,
    keywords: KeywordMatcher,
    documents: RwLock<Option<Vec<Document>>>,
}

impl Documents {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            name: "Documents".to_string(),
            path: path.into(),
            limit: 10,
            keywords: KeywordMatcher::new(DEFAULT_KEYWORDS),
            documents: RwLock::new(None),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_keywords(mut self, keywords: KeywordMatcher) -> Self {
        self.keywords = keywords;
        self
    }
}

#[async_trait]
impl DataSource for Documents {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<(), SourceError> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let documents: Vec<Document> = serde_json::from_str(&text)?;

        info!(
            "{} loaded {} documents from {}",
            self.name,
            documents.len(),
            self.path.display()
        );
        *self.documents.write().await = Some(documents);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SourceError> {
        *self.documents.write().await = None;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.documents
            .try_read()
            .map_or(false, |documents| documents.is_some())
    }

    fn is_relevant_for(&self, query: &str) -> bool {
        self.keywords.matches(query)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let guard = self.documents.read().await;
        let documents = guard
            .as_ref()
            .ok_or_else(|| SourceError::NotConnected(self.name.clone()))?;

        let terms = query_terms(query);
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f64, &Document)> = documents
            .iter()
            .filter_map(|doc| {
                let score = term_coverage(&terms, doc);
                (score > 0.0).then_some((score, doc))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.truncate(self.limit);

        Ok(scored
            .into_iter()
            .map(|(score, doc)| {
                let mut result = SearchResult::new(&self.name, &doc.title, &doc.content, score)
                    .with_metadata("file", json!(self.path.display().to_string()));
                if let Some(ref url) = doc.url {
                    result = result.with_url(url);
                }
                result
            })
            .collect())
    }
}

/// Lower-cased query words, punctuation stripped, one-letter words dropped
fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.chars().count() > 1)
        .collect();
    let mut seen = HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
    terms
}

/// Share of terms that occur in the title or content
fn term_coverage(terms: &[String], doc: &Document) -> f64 {
    let haystack = format!("{} {}", doc.title, doc.content).to_lowercase();
    let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
    hits as f64 / terms.len() as f64
}
