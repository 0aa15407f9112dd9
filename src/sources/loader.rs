//! Source loader for initializing data sources from configuration

use super::documents::Documents;
use super::keywords::KeywordMatcher;
use super::registry::SourceRegistry;
use super::slack::Slack;
use super::traits::DataSource;
use super::wikipedia::Wikipedia;
use crate::config::{Settings, SourceConfig};
use crate::network::HttpClient;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Loader for initializing sources from configuration
pub struct SourceLoader;

impl SourceLoader {
    /// Build the registry from settings, keeping the configured order.
    ///
    /// Disabled sources are skipped; sources that cannot be built are
    /// logged and skipped.
    pub fn load(settings: &Settings, client: &HttpClient) -> SourceRegistry {
        let mut registry = SourceRegistry::new();

        let enabled = settings.enabled_sources();
        let skipped = settings.sources.len() - enabled.len();
        if skipped > 0 {
            info!("Skipping {} disabled sources", skipped);
        }

        for config in enabled {
            match Self::create_source(config, client) {
                Ok(source) => {
                    info!("Loaded source: {} ({})", config.name, config.kind);
                    registry.register(source);
                }
                Err(e) => {
                    warn!("Failed to load source {}: {}", config.name, e);
                }
            }
        }

        info!("Loaded {} sources", registry.len());
        registry
    }

    /// Create a source instance by kind
    fn create_source(config: &SourceConfig, client: &HttpClient) -> Result<Arc<dyn DataSource>> {
        let keywords = config.keywords.as_ref().map(KeywordMatcher::new);

        let source: Arc<dyn DataSource> = match config.kind.as_str() {
            "slack" => {
                let token = config
                    .token
                    .as_ref()
                    .ok_or_else(|| anyhow!("slack source requires a token"))?;
                let mut slack = Slack::new(client.clone(), token).with_name(&config.name);
                if let Some(ref url) = config.base_url {
                    slack = slack.with_api_url(url);
                }
                if let Some(count) = config.max_results {
                    slack = slack.with_count(count);
                }
                if let Some(keywords) = keywords {
                    slack = slack.with_keywords(keywords);
                }
                Arc::new(slack)
            }
            "wikipedia" => {
                let mut wiki = Wikipedia::new(client.clone()).with_name(&config.name);
                if let Some(ref url) = config.base_url {
                    wiki = wiki.with_api_url(url);
                }
                if let Some(limit) = config.max_results {
                    wiki = wiki.with_limit(limit);
                }
                if let Some(keywords) = keywords {
                    wiki = wiki.with_keywords(keywords);
                }
                Arc::new(wiki)
            }
            "documents" => {
                let path = config
                    .path
                    .as_ref()
                    .ok_or_else(|| anyhow!("documents source requires a path"))?;
                let mut docs = Documents::new(path).with_name(&config.name);
                if let Some(limit) = config.max_results {
                    docs = docs.with_limit(limit as usize);
                }
                if let Some(keywords) = keywords {
                    docs = docs.with_keywords(keywords);
                }
                Arc::new(docs)
            }
            other => {
                return Err(anyhow!(
                    "Unknown source kind: {} (available: {})",
                    other,
                    Self::available_kinds().join(", ")
                ))
            }
        };

        Ok(source)
    }

    /// Get list of available source kinds
    pub fn available_kinds() -> Vec<&'static str> {
        vec!["slack", "wikipedia", "documents"]
    }
}
