//! Search options and progress reporting

use crate::results::SearchProgress;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Receiver for progress events
///
/// Called concurrently from every source task, in no particular order across
/// sources. Any `Fn(SearchProgress) + Send + Sync` closure is a sink.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: SearchProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(SearchProgress) + Send + Sync,
{
    fn report(&self, progress: SearchProgress) {
        self(progress)
    }
}

/// Deliver an event if a sink is present. A panicking sink is logged and ignored.
pub(crate) fn notify(sink: Option<&Arc<dyn ProgressSink>>, progress: SearchProgress) {
    if let Some(sink) = sink {
        let source = progress.source.clone();
        if catch_unwind(AssertUnwindSafe(|| sink.report(progress))).is_err() {
            warn!("Progress sink panicked while reporting {}", source);
        }
    }
}

/// Per-call limits for a fan-out
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Give up on sources still running after this long
    pub timeout: Option<Duration>,
    /// Give up on sources still running once this fires
    pub cancel: Option<CancellationToken>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_closure_is_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = seen.clone();
        let sink: Arc<dyn ProgressSink> = Arc::new(move |p: SearchProgress| {
            captured.lock().unwrap().push(p);
        });

        notify(Some(&sink), SearchProgress::searching("Docs"));
        notify(None, SearchProgress::searching("Web"));

        assert_eq!(*seen.lock().unwrap(), vec![SearchProgress::searching("Docs")]);
    }

    #[test]
    fn test_panicking_sink_is_contained() {
        let sink: Arc<dyn ProgressSink> = Arc::new(|_: SearchProgress| panic!("sink failure"));
        notify(Some(&sink), SearchProgress::error("Docs"));
    }

    #[test]
    fn test_options_builder() {
        let options = SearchOptions::new()
            .with_timeout(Duration::from_secs(3))
            .with_cancel(CancellationToken::new());
        assert_eq!(options.timeout, Some(Duration::from_secs(3)));
        assert!(options.cancel.is_some());
    }
}
