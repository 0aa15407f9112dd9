//! Application state shared across handlers

use crate::config::Settings;
use crate::metrics::Metrics;
use crate::search::QueryOrchestrator;
use crate::sources::SourceRegistry;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Query orchestrator over the connected sources
    pub orchestrator: Arc<QueryOrchestrator>,
    /// Per-source statistics
    pub metrics: Arc<Metrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, registry: SourceRegistry) -> Self {
        let orchestrator = QueryOrchestrator::new(Arc::new(registry))
            .with_timeout(settings.search.timeout_duration());

        Self {
            settings: Arc::new(settings),
            orchestrator: Arc::new(orchestrator),
            metrics: Arc::new(Metrics::new()),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    pub fn registry(&self) -> &SourceRegistry {
        self.orchestrator.registry()
    }
}
