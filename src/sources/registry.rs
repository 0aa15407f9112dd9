//! Ordered registry of data sources

use super::traits::{slugify, DataSource};
use crate::error::SourceError;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, warn};

/// Registry of all configured data sources, in registration order
///
/// Built once at startup and read-only afterwards; the orchestrator relies
/// on the order for tie-breaking when ranking.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn DataSource>>,
}

impl SourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source at the end of the list
    pub fn register(&mut self, source: Arc<dyn DataSource>) {
        self.sources.push(source);
    }

    /// Builder-style register
    pub fn with(mut self, source: Arc<dyn DataSource>) -> Self {
        self.register(source);
        self
    }

    /// All sources in registration order
    pub fn all(&self) -> &[Arc<dyn DataSource>] {
        &self.sources
    }

    /// Get a source by exact name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn DataSource>> {
        self.sources.iter().find(|s| s.name() == name)
    }

    /// Get a source by slug (`"google-docs"` for `"Google Docs"`)
    pub fn get_by_slug(&self, slug: &str) -> Option<&Arc<dyn DataSource>> {
        let slug = slugify(slug);
        self.sources.iter().find(|s| s.slug() == slug)
    }

    /// Get all source names
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Check if a source exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Get number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Connect every source concurrently; the first failure is returned
    pub async fn connect_all(&self) -> Result<(), SourceError> {
        let outcomes = join_all(self.sources.iter().map(|s| s.connect())).await;

        for (source, outcome) in self.sources.iter().zip(outcomes) {
            if let Err(e) = outcome {
                warn!("{} connection failed: {}", source.name(), e);
                return Err(e);
            }
        }

        if !self.sources.is_empty() {
            info!(
                "Connected to {} data sources: {}",
                self.sources.len(),
                self.names().join(", ")
            );
        }
        Ok(())
    }

    /// Disconnect every source concurrently, logging failures
    pub async fn disconnect_all(&self) {
        let outcomes = join_all(self.sources.iter().map(|s| s.disconnect())).await;

        for (source, outcome) in self.sources.iter().zip(outcomes) {
            if let Err(e) = outcome {
                warn!("{} disconnect failed: {}", source.name(), e);
            }
        }
    }
}
