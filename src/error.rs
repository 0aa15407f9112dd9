//! Error types
//!
//! [`SourceError`] is what a single data source reports when a lifecycle call
//! or a search fails. The orchestrator never lets it escape a fan-out; it is
//! turned into an `error` progress event instead. [`SearchError`] covers the
//! few failures the entry points themselves can return.

/// Failure inside one data source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The backend answered with a non-success status code.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The backend answered but reported a failure in its payload.
    #[error("API error: {0}")]
    Api(String),

    /// The response could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// `search` was called before a successful `connect`.
    #[error("{0} is not connected")]
    NotConnected(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status(status.as_u16()),
            None if err.is_decode() => Self::Parse(err.to_string()),
            None => Self::Http(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Failure returned by an orchestration entry point
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// No registered data source matches the requested slug.
    #[error("source '{name}' not found or not configured. Available sources: {available}")]
    UnknownSource { name: String, available: String },

    /// A directly addressed source failed.
    #[error("search failed: {0}")]
    Source(#[from] SourceError),
}
