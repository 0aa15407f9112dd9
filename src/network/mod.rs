//! HTTP networking module
//!
//! Provides the HTTP client used by API-backed data sources.

mod client;

pub use client::{ApiRequest, ApiResponse, HttpClient};
