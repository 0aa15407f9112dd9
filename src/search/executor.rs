//! Search execution and orchestration

use super::models::{notify, ProgressSink, SearchOptions};
use super::router::select_sources;
use crate::error::{SearchError, SourceError};
use crate::results::{rank_results, SearchProgress, SearchResult};
use crate::sources::{DataSource, SourceRegistry};
use futures::future::join_all;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Why a source contributed nothing
#[derive(Debug, thiserror::Error)]
enum Failure {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("search panicked")]
    Panicked,
    #[error("cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    TimedOut,
}

/// Fans a query out to the relevant sources and merges what comes back
pub struct QueryOrchestrator {
    /// Sources, in registration order
    registry: Arc<SourceRegistry>,
    /// Deadline applied when a call does not set one
    default_timeout: Option<Duration>,
}

impl QueryOrchestrator {
    /// Create a new orchestrator with no deadline
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self {
            registry,
            default_timeout: None,
        }
    }

    /// Set default deadline
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Search every relevant source and return the ranked, deduplicated results
    pub async fn search(
        &self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Vec<SearchResult> {
        self.search_with(query, progress, SearchOptions::default())
            .await
    }

    /// Like [`search`](Self::search), with an explicit deadline or cancellation token.
    ///
    /// Sources still running when the deadline passes or the token fires
    /// report `error` and contribute nothing; results from sources that
    /// already finished are kept. Source failures never fail the call.
    pub async fn search_with(
        &self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
        options: SearchOptions,
    ) -> Vec<SearchResult> {
        let span = info_span!("search", id = %Uuid::new_v4());
        self.fan_out(query, progress, options).instrument(span).await
    }

    async fn fan_out(
        &self,
        query: &str,
        progress: Option<Arc<dyn ProgressSink>>,
        options: SearchOptions,
    ) -> Vec<SearchResult> {
        let route = select_sources(self.registry.all(), query);
        if route.sources.is_empty() {
            debug!("No sources registered");
            return Vec::new();
        }

        let names: Vec<String> = route.sources.iter().map(|s| s.name().to_string()).collect();
        info!(
            fallback = route.fallback,
            "Searching across: {}",
            names.join(", ")
        );

        // A deadline too far out to represent means no deadline.
        let deadline = options
            .timeout
            .or(self.default_timeout)
            .and_then(|t| Instant::now().checked_add(t));

        // Child token so finishing or dropping this call never cancels the caller's token.
        let cancel = options
            .cancel
            .map(|token| token.child_token())
            .unwrap_or_default();
        // Source tasks stop if this future is dropped before they finish.
        let _abandon = cancel.clone().drop_guard();
        let query: Arc<str> = Arc::from(query);

        let handles: Vec<_> = route
            .sources
            .into_iter()
            .map(|source| {
                tokio::spawn(
                    run_source(
                        Arc::clone(source),
                        Arc::clone(&query),
                        progress.clone(),
                        cancel.clone(),
                        deadline,
                    )
                    .in_current_span(),
                )
            })
            .collect();

        // Joined in registration order, so the pool keeps that order.
        let pool: Vec<SearchResult> = join_all(handles)
            .await
            .into_iter()
            .zip(&names)
            .flat_map(|(joined, name)| {
                joined.unwrap_or_else(|e| {
                    error!("Task for {} did not finish: {}", name, e);
                    Vec::new()
                })
            })
            .collect();

        let ranked = rank_results(pool);
        info!("Search returned {} results", ranked.len());
        ranked
    }

    /// Search a single source by slug, bypassing routing and ranking
    pub async fn search_source(
        &self,
        slug: &str,
        query: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let source = self
            .registry
            .get_by_slug(slug)
            .ok_or_else(|| SearchError::UnknownSource {
                name: slug.to_string(),
                available: self.registry.names().join(", "),
            })?;

        Ok(source.search(query).await?)
    }
}

/// Search one source, reporting its lifecycle to the sink
async fn run_source(
    source: Arc<dyn DataSource>,
    query: Arc<str>,
    progress: Option<Arc<dyn ProgressSink>>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
) -> Vec<SearchResult> {
    let name = source.name().to_string();
    let start = Instant::now();

    notify(progress.as_ref(), SearchProgress::searching(&name));

    let search = AssertUnwindSafe(source.search(&query)).catch_unwind();

    let outcome: Result<Vec<SearchResult>, Failure> = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Failure::Cancelled),
        result = search => match result {
            Ok(Ok(results)) => Ok(results),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(Failure::Panicked),
        },
        _ = wait_until(deadline) => Err(Failure::TimedOut),
    };

    match outcome {
        Ok(results) => {
            debug!(
                "Source {} returned {} results in {:?}",
                name,
                results.len(),
                start.elapsed()
            );
            notify(
                progress.as_ref(),
                SearchProgress::completed(&name, results.len()),
            );
            results
        }
        Err(e) => {
            warn!("Error searching {}: {}", name, e);
            notify(progress.as_ref(), SearchProgress::error(&name));
            Vec::new()
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ProgressStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Source returning canned results after an optional delay
    struct Fixed {
        name: &'static str,
        relevant: bool,
        delay: Duration,
        results: Result<Vec<(&'static str, f64)>, ()>,
    }

    impl Fixed {
        fn ok(name: &'static str, results: Vec<(&'static str, f64)>) -> Self {
            Self {
                name,
                relevant: false,
                delay: Duration::ZERO,
                results: Ok(results),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                results: Err(()),
                ..Self::ok(name, vec![])
            }
        }

        fn relevant(mut self) -> Self {
            self.relevant = true;
            self
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl DataSource for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        async fn connect(&self) -> Result<(), SourceError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), SourceError> {
            Ok(())
        }

        fn is_relevant_for(&self, _query: &str) -> bool {
            self.relevant
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SourceError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            match &self.results {
                Ok(results) => Ok(results
                    .iter()
                    .map(|&(title, score)| SearchResult::new(self.name, title, "", score))
                    .collect()),
                Err(()) => Err(SourceError::Http("connection refused".into())),
            }
        }
    }

    struct Panicking;

    #[async_trait]
    impl DataSource for Panicking {
        fn name(&self) -> &str {
            "Panicking"
        }

        async fn connect(&self) -> Result<(), SourceError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), SourceError> {
            Ok(())
        }

        fn is_relevant_for(&self, _query: &str) -> bool {
            false
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SourceError> {
            panic!("backend bug")
        }
    }

    fn orchestrator(sources: Vec<Arc<dyn DataSource>>) -> QueryOrchestrator {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(source);
        }
        QueryOrchestrator::new(Arc::new(registry))
    }

    fn recorder() -> (Arc<Mutex<Vec<SearchProgress>>>, Arc<dyn ProgressSink>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = events.clone();
        let sink: Arc<dyn ProgressSink> = Arc::new(move |p: SearchProgress| {
            captured.lock().unwrap().push(p);
        });
        (events, sink)
    }

    fn terminal(events: &[SearchProgress], status: ProgressStatus) -> Vec<String> {
        events
            .iter()
            .filter(|e| e.status == status)
            .map(|e| e.source.clone())
            .collect()
    }

    #[tokio::test]
    async fn test_no_sources_registered() {
        let (events, sink) = recorder();
        let results = orchestrator(vec![]).search("anything", Some(sink)).await;

        assert!(results.is_empty());
        assert!(events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_relevant_sources_are_searched() {
        let (events, sink) = recorder();
        let orch = orchestrator(vec![
            Arc::new(Fixed::ok("Slack", vec![("chat", 0.5)]).relevant()),
            Arc::new(Fixed::ok("Docs", vec![("doc", 0.9)])),
        ]);

        let results = orch.search("what was said", Some(sink)).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "Slack");
        let events = events.lock().unwrap();
        assert!(events.iter().all(|e| e.source == "Slack"));
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let (events, sink) = recorder();
        let orch = orchestrator(vec![
            Arc::new(Fixed::failing("A")),
            Arc::new(Fixed::ok("B", vec![("b1", 0.4), ("b2", 0.8)])),
        ]);

        let results = orch.search("query", Some(sink)).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.source == "B"));
        assert_eq!(results[0].title, "b2");

        let events = events.lock().unwrap();
        assert_eq!(terminal(&events, ProgressStatus::Error), ["A"]);
        assert_eq!(terminal(&events, ProgressStatus::Completed), ["B"]);
        let completed = events
            .iter()
            .find(|e| e.status == ProgressStatus::Completed)
            .unwrap();
        assert_eq!(completed.result_count, Some(2));
    }

    #[tokio::test]
    async fn test_searching_precedes_terminal_event() {
        let (events, sink) = recorder();
        let orch = orchestrator(vec![
            Arc::new(Fixed::ok("A", vec![("a", 0.1)]).slow(Duration::from_millis(20))),
            Arc::new(Fixed::failing("B")),
            Arc::new(Fixed::ok("C", vec![])),
        ]);

        orch.search("query", Some(sink)).await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 6);
        for name in ["A", "B", "C"] {
            let positions: Vec<_> = events
                .iter()
                .enumerate()
                .filter(|(_, e)| e.source == name)
                .map(|(i, e)| (i, e.status))
                .collect();
            assert_eq!(positions.len(), 2);
            assert_eq!(positions[0].1, ProgressStatus::Searching);
            assert!(positions[1].1.is_terminal());
        }
    }

    #[tokio::test]
    async fn test_pool_order_breaks_score_ties() {
        let orch = orchestrator(vec![
            Arc::new(
                Fixed::ok("A", vec![("r1", 0.9), ("r2", 0.5)]).slow(Duration::from_millis(30)),
            ),
            Arc::new(Fixed::ok("B", vec![("r3", 0.9), ("r4", 0.2)])),
        ]);

        let titles: Vec<_> = orch
            .search("query", None)
            .await
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, ["r1", "r3", "r2", "r4"]);
    }

    #[tokio::test]
    async fn test_panicking_source_reports_error() {
        let (events, sink) = recorder();
        let orch = orchestrator(vec![
            Arc::new(Panicking),
            Arc::new(Fixed::ok("B", vec![("b", 0.5)])),
        ]);

        let results = orch.search("query", Some(sink)).await;

        assert_eq!(results.len(), 1);
        let events = events.lock().unwrap();
        assert_eq!(terminal(&events, ProgressStatus::Error), ["Panicking"]);
    }

    #[tokio::test]
    async fn test_deadline_drops_slow_sources() {
        let (events, sink) = recorder();
        let orch = orchestrator(vec![
            Arc::new(Fixed::ok("Slow", vec![("late", 1.0)]).slow(Duration::from_secs(30))),
            Arc::new(Fixed::ok("Fast", vec![("early", 0.3)])),
        ]);

        let started = std::time::Instant::now();
        let results = orch
            .search_with(
                "query",
                Some(sink),
                SearchOptions::new().with_timeout(Duration::from_millis(100)),
            )
            .await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "early");
        let events = events.lock().unwrap();
        assert_eq!(terminal(&events, ProgressStatus::Error), ["Slow"]);
    }

    #[tokio::test]
    async fn test_unrepresentable_deadline_means_no_deadline() {
        let orch = orchestrator(vec![Arc::new(
            Fixed::ok("Slow", vec![("late", 1.0)]).slow(Duration::from_millis(20)),
        )]);

        let results = orch
            .search_with(
                "query",
                None,
                SearchOptions::new().with_timeout(Duration::MAX),
            )
            .await;
        assert_eq!(results.len(), 1);
    }

    /// Counts searches that ran to the end
    struct Finishing {
        delay: Duration,
        done: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DataSource for Finishing {
        fn name(&self) -> &str {
            "Finishing"
        }

        async fn connect(&self) -> Result<(), SourceError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), SourceError> {
            Ok(())
        }

        fn is_relevant_for(&self, _query: &str) -> bool {
            false
        }

        async fn search(&self, _query: &str) -> Result<Vec<SearchResult>, SourceError> {
            tokio::time::sleep(self.delay).await;
            self.done.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_dropped_search_stops_sources() {
        let done = Arc::new(AtomicUsize::new(0));
        let orch = orchestrator(vec![Arc::new(Finishing {
            delay: Duration::from_millis(200),
            done: done.clone(),
        })]);

        let outcome =
            tokio::time::timeout(Duration::from_millis(20), orch.search("query", None)).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(done.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_caller_token_survives_search() {
        let orch = orchestrator(vec![Arc::new(Fixed::ok("A", vec![("a", 0.5)]))]);
        let cancel = CancellationToken::new();

        let results = orch
            .search_with("query", None, SearchOptions::new().with_cancel(cancel.clone()))
            .await;

        assert_eq!(results.len(), 1);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_default_timeout_applies() {
        let orch = orchestrator(vec![Arc::new(
            Fixed::ok("Slow", vec![("late", 1.0)]).slow(Duration::from_secs(30)),
        )])
        .with_timeout(Some(Duration::from_millis(50)));

        assert!(orch.search("query", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation() {
        let orch = orchestrator(vec![Arc::new(
            Fixed::ok("Slow", vec![("late", 1.0)]).slow(Duration::from_secs(30)),
        )]);

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let results = orch
            .search_with("query", None, SearchOptions::new().with_cancel(cancel))
            .await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_source_by_slug() {
        let orch = orchestrator(vec![
            Arc::new(Fixed::ok("Team Docs", vec![("b", 0.1), ("a", 0.9)])),
            Arc::new(Fixed::failing("Slack")),
        ]);

        let results = orch.search_source("team-docs", "query").await.unwrap();
        assert_eq!(results[0].title, "b");

        let err = orch.search_source("web", "query").await.unwrap_err();
        assert!(err.to_string().contains("Available sources: Team Docs, Slack"));

        let err = orch.search_source("slack", "query").await.unwrap_err();
        assert!(matches!(err, SearchError::Source(SourceError::Http(_))));
    }
}
