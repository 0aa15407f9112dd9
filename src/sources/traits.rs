//! Data source trait and helpers

use crate::error::SourceError;
use crate::results::SearchResult;
use async_trait::async_trait;

/// Main trait that every searchable data source implements
///
/// Sources are held behind `Arc<dyn DataSource>` in a
/// [`SourceRegistry`](super::SourceRegistry) and searched concurrently, so
/// implementations must be `Send + Sync`.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Stable name, used as `source` on every result and progress event
    fn name(&self) -> &str;

    /// Prepare the source for searching. Calling it twice is harmless.
    async fn connect(&self) -> Result<(), SourceError>;

    /// Release any resources. Calling it twice is harmless.
    async fn disconnect(&self) -> Result<(), SourceError>;

    /// Whether the last `connect` succeeded and no `disconnect` followed.
    /// Sources without connection state are always connected.
    fn is_connected(&self) -> bool {
        true
    }

    /// Cheap lexical check, evaluated for every source on every query.
    /// Must not perform I/O.
    fn is_relevant_for(&self, query: &str) -> bool;

    /// Search the source. Expected failures come back as `Err`, never a panic.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError>;

    /// URL-friendly identifier: lower case, spaces replaced by dashes
    fn slug(&self) -> String {
        slugify(self.name())
    }
}

/// Lower-case a source name and replace spaces with dashes
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Position-based score used by API-backed sources: 1.0 for the first hit,
/// 0.1 less for each following one
pub fn position_score(index: usize) -> f64 {
    1.0 - index as f64 * 0.1
}
