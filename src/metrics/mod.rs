//! Metrics collection module
//!
//! Tracks per-source search counts, error rates and response times. A
//! [`MetricsSink`] turns the progress events of one fan-out into timed
//! records.

use crate::results::{ProgressStatus, SearchProgress};
use crate::search::ProgressSink;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

/// Response times kept per source
const MAX_SAMPLES: usize = 100;

#[derive(Debug, Default)]
struct SourceCounters {
    searches: u64,
    successes: u64,
    errors: u64,
    results: u64,
    /// Recent response times in ms
    response_times: VecDeque<u64>,
}

impl SourceCounters {
    fn stats(&self) -> SourceStats {
        let avg_response_time = if self.response_times.is_empty() {
            None
        } else {
            Some(self.response_times.iter().sum::<u64>() / self.response_times.len() as u64)
        };

        let finished = self.successes + self.errors;
        let reliability = if finished == 0 {
            100.0
        } else {
            (self.successes as f64 / finished as f64) * 100.0
        };

        SourceStats {
            searches: self.searches,
            successes: self.successes,
            errors: self.errors,
            results: self.results,
            avg_response_time,
            reliability,
        }
    }
}

/// Metrics collector
#[derive(Default)]
pub struct Metrics {
    /// Total fan-outs started
    total_searches: AtomicU64,
    sources: RwLock<HashMap<String, SourceCounters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment total search count
    pub fn inc_search(&self) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Count a search that has started against `source`
    pub fn record_started(&self, source: &str) {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        sources.entry(source.to_string()).or_default().searches += 1;
    }

    /// Record how a search against `source` ended.
    ///
    /// `Searching` is not an outcome and is ignored.
    pub fn record_finished(
        &self,
        source: &str,
        status: ProgressStatus,
        result_count: usize,
        elapsed: Option<Duration>,
    ) {
        let mut sources = self.sources.write().unwrap_or_else(PoisonError::into_inner);
        let counters = sources.entry(source.to_string()).or_default();

        match status {
            ProgressStatus::Searching => return,
            ProgressStatus::Completed => {
                counters.successes += 1;
                counters.results += result_count as u64;
            }
            ProgressStatus::Error => counters.errors += 1,
        }

        if let Some(elapsed) = elapsed {
            if counters.response_times.len() >= MAX_SAMPLES {
                counters.response_times.pop_front();
            }
            counters.response_times.push_back(elapsed.as_millis() as u64);
        }
    }

    /// Statistics for one source, if it has been searched
    pub fn source_stats(&self, source: &str) -> Option<SourceStats> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources.get(source).map(SourceCounters::stats)
    }

    /// Statistics for every source seen so far, keyed by name
    pub fn all_stats(&self) -> BTreeMap<String, SourceStats> {
        let sources = self.sources.read().unwrap_or_else(PoisonError::into_inner);
        sources
            .iter()
            .map(|(name, counters)| (name.clone(), counters.stats()))
            .collect()
    }
}

/// Progress sink for a single fan-out, timing each source from its
/// `searching` event to its terminal event
///
/// Each fan-out needs its own sink; start times die with it, so an
/// abandoned search leaves nothing behind in [`Metrics`].
pub struct MetricsSink {
    metrics: Arc<Metrics>,
    started: Mutex<HashMap<String, Instant>>,
}

impl MetricsSink {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            metrics,
            started: Mutex::new(HashMap::new()),
        }
    }
}

impl ProgressSink for MetricsSink {
    fn report(&self, progress: SearchProgress) {
        let mut started = self.started.lock().unwrap_or_else(PoisonError::into_inner);

        if progress.status == ProgressStatus::Searching {
            started.insert(progress.source.clone(), Instant::now());
            self.metrics.record_started(&progress.source);
            return;
        }

        let elapsed = started.remove(&progress.source).map(|t| t.elapsed());
        self.metrics.record_finished(
            &progress.source,
            progress.status,
            progress.result_count.unwrap_or(0),
            elapsed,
        );
    }
}

/// Statistics for a single source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceStats {
    pub searches: u64,
    pub successes: u64,
    pub errors: u64,
    pub results: u64,
    /// Mean of recent response times in ms
    pub avg_response_time: Option<u64>,
    /// Percentage of finished searches that completed
    pub reliability: f64,
}
