//! Relevance routing

use crate::sources::DataSource;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// Sources chosen for one query
pub struct Route<'a> {
    /// Sources to search, in registration order
    pub sources: Vec<&'a Arc<dyn DataSource>>,
    /// True when no source claimed the query and every source was taken
    pub fallback: bool,
}

/// Pick the sources to search for `query`.
///
/// Every source's relevance predicate is evaluated in registration order.
/// If none claims the query, all sources are searched. A predicate that
/// panics counts as "not relevant".
pub fn select_sources<'a>(sources: &'a [Arc<dyn DataSource>], query: &str) -> Route<'a> {
    let relevant: Vec<_> = sources
        .iter()
        .filter(|source| is_relevant(source, query))
        .collect();

    if relevant.is_empty() {
        Route {
            sources: sources.iter().collect(),
            fallback: !sources.is_empty(),
        }
    } else {
        Route {
            sources: relevant,
            fallback: false,
        }
    }
}

fn is_relevant(source: &Arc<dyn DataSource>, query: &str) -> bool {
    catch_unwind(AssertUnwindSafe(|| source.is_relevant_for(query))).unwrap_or_else(|_| {
        warn!("Relevance check for {} panicked, skipping it", source.name());
        false
    })
}
