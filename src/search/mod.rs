//! Search orchestration module
//!
//! Routes a query to the relevant data sources, runs them concurrently,
//! reports progress and merges the results.

mod executor;
mod models;
mod router;

pub use executor::QueryOrchestrator;
pub use models::*;
pub use router::{select_sources, Route};
