//! Result types, ranking and presentation
//!
//! This module defines the shapes every data source reports through, the
//! aggregation step that turns the merged pool into a ranked list, and the
//! text rendering consumed by the tool layer.

mod format;
mod ranking;
mod types;

pub use format::{format_progress, format_results, group_by_source, NO_RESULTS_MESSAGE};
pub use ranking::{deduplicate, rank_results, sort_by_relevance};
pub use types::*;
