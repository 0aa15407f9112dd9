//! Result and progress type definitions

use serde::{Deserialize, Serialize};

/// Opaque backend-defined payload attached to a result
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A single piece of evidence returned by a data source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Name of the data source that produced this result
    pub source: String,
    /// Short label, stable for identical underlying content
    pub title: String,
    /// Body text or snippet
    pub content: String,
    /// Optional locator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Backend-assigned score, higher is better
    pub relevance_score: f64,
    /// Backend-defined payload, never interpreted by the orchestrator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

impl SearchResult {
    /// Create a new result
    pub fn new(
        source: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        relevance_score: f64,
    ) -> Self {
        Self {
            source: source.into(),
            title: title.into(),
            content: content.into(),
            url: None,
            relevance_score,
            metadata: None,
        }
    }

    /// Attach a URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(Metadata::new)
            .insert(key.into(), value);
        self
    }

    /// Key used to collapse duplicates across the merged pool
    pub fn dedup_key(&self) -> (&str, &str) {
        (&self.title, &self.source)
    }
}

/// Lifecycle state of one data source during a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Searching,
    Completed,
    Error,
}

impl ProgressStatus {
    /// Whether no further events follow for this source
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Searching)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Searching => "searching",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A progress event emitted while a search fans out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProgress {
    /// Data source name
    pub source: String,
    pub status: ProgressStatus,
    /// Number of results produced, only set on completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_count: Option<usize>,
}

impl SearchProgress {
    pub fn searching(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            status: ProgressStatus::Searching,
            result_count: None,
        }
    }

    pub fn completed(source: impl Into<String>, result_count: usize) -> Self {
        Self {
            source: source.into(),
            status: ProgressStatus::Completed,
            result_count: Some(result_count),
        }
    }

    pub fn error(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            status: ProgressStatus::Error,
            result_count: None,
        }
    }
}
