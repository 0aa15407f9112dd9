//! multisearch: one query, many data sources
//!
//! Routes a query to the data sources that claim it, searches them
//! concurrently while streaming per-source progress, and merges the partial
//! results into one ranked, deduplicated list.

pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod results;
pub mod search;
pub mod sources;
pub mod web;

pub use config::Settings;
pub use error::{SearchError, SourceError};
pub use results::{format_results, rank_results, ProgressStatus, SearchProgress, SearchResult};
pub use search::{ProgressSink, QueryOrchestrator, SearchOptions};
pub use sources::{DataSource, SourceRegistry};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
