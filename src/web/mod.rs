//! Web server module
//!
//! Exposes the orchestrator as HTTP tools: search everything, search one
//! source, list sources and report per-source statistics.

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
