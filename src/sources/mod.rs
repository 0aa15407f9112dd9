//! Data source module
//!
//! Defines the DataSource trait and provides an ordered registry of sources.

mod keywords;
mod loader;
mod registry;
mod traits;

// Source implementations
pub mod documents;
pub mod slack;
pub mod wikipedia;

pub use keywords::KeywordMatcher;
pub use loader::SourceLoader;
pub use registry::SourceRegistry;
pub use traits::*;
