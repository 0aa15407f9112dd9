//! HTTP request handlers

use super::state::AppState;
use crate::error::SearchError;
use crate::metrics::{MetricsSink, SourceStats};
use crate::results::{
    format_progress, format_results, ProgressStatus, SearchProgress, SearchResult,
};
use crate::search::ProgressSink;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Opening line of the search-all transcript
pub const SEARCH_BANNER: &str = "🔍 Searching across multiple sources...\n\n";

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Results to show in the summary
    pub max_results: Option<usize>,
    /// Output format (`json` or `text`)
    pub format: Option<String>,
}

impl SearchParams {
    fn query(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// Search response for JSON format
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub number_of_results: usize,
    /// One line per progress event, in arrival order
    pub progress: Vec<String>,
    /// Human-readable transcript: banner, progress lines and grouped results
    pub summary: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub slug: String,
    pub connected: bool,
}

#[derive(Debug, Serialize)]
pub struct SourcesResponse {
    pub count: usize,
    pub sources: Vec<SourceInfo>,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub total_searches: u64,
    pub sources: BTreeMap<String, SourceStats>,
}

fn missing_query() -> Response {
    (StatusCode::BAD_REQUEST, "Missing query parameter 'q'").into_response()
}

fn plain_text(text: String) -> Response {
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], text).into_response()
}

/// Search every relevant source
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let Some(query) = params.query() else {
        return missing_query();
    };
    let limit = params
        .max_results
        .unwrap_or(state.settings.search.max_results);

    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink: Arc<dyn ProgressSink> = {
        let lines = lines.clone();
        let timing = MetricsSink::new(state.metrics.clone());
        Arc::new(move |progress: SearchProgress| {
            lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(format_progress(&progress));
            timing.report(progress);
        })
    };

    state.metrics.inc_search();
    let results = state.orchestrator.search(query, Some(sink)).await;

    let progress = std::mem::take(&mut *lines.lock().unwrap_or_else(PoisonError::into_inner));
    let summary = format!(
        "{}{}\n\n{}",
        SEARCH_BANNER,
        progress.join("\n"),
        format_results(&results, limit)
    );

    match params.format.as_deref() {
        Some("text") => plain_text(summary),
        _ => Json(SearchResponse {
            query: query.to_string(),
            number_of_results: results.len(),
            progress,
            summary,
            results,
        })
        .into_response(),
    }
}

/// Search one source by slug
pub async fn search_source(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(query) = params.query() else {
        return missing_query();
    };
    let limit = params
        .max_results
        .unwrap_or(state.settings.search.max_results);

    let name = state
        .registry()
        .get_by_slug(&slug)
        .map(|source| source.name().to_string());
    if let Some(name) = &name {
        state.metrics.record_started(name);
    }
    let started = Instant::now();

    match state.orchestrator.search_source(&slug, query).await {
        Ok(results) => {
            if let Some(name) = &name {
                state.metrics.record_finished(
                    name,
                    ProgressStatus::Completed,
                    results.len(),
                    Some(started.elapsed()),
                );
            }
            plain_text(format_results(&results, limit))
        }
        Err(e @ SearchError::UnknownSource { .. }) => {
            (StatusCode::NOT_FOUND, e.to_string()).into_response()
        }
        Err(e) => {
            tracing::warn!("Search on {} failed: {}", slug, e);
            if let Some(name) = &name {
                state.metrics.record_finished(
                    name,
                    ProgressStatus::Error,
                    0,
                    Some(started.elapsed()),
                );
            }
            (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
        }
    }
}

/// List registered sources
pub async fn sources(State(state): State<AppState>) -> impl IntoResponse {
    let sources: Vec<SourceInfo> = state
        .registry()
        .all()
        .iter()
        .map(|source| SourceInfo {
            name: source.name().to_string(),
            slug: source.slug(),
            connected: source.is_connected(),
        })
        .collect();

    Json(SourcesResponse {
        count: sources.len(),
        sources,
    })
}

/// Per-source statistics
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatsResponse {
        total_searches: state.metrics.total_searches(),
        sources: state.metrics.all_stats(),
    })
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": crate::VERSION,
        "instance": state.instance_name(),
        "sources": state.registry().len(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::error::SourceError;
    use crate::results::SearchResult;
    use crate::sources::{DataSource, SourceRegistry};
    use crate::web::{create_router, AppState};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct Canned {
        name: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl DataSource for Canned {
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
            false
        }

        async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
            if self.fail {
                return Err(SourceError::Status(503));
            }
            Ok(vec![SearchResult::new(
                self.name,
                format!("About {query}"),
                "body",
                0.7,
            )
            .with_url("https://example.com/a")])
        }
    }

    fn app() -> Router {
        let registry = SourceRegistry::new()
            .with(Arc::new(Canned {
                name: "Team Docs",
                fail: false,
            }))
            .with(Arc::new(Canned {
                name: "Slack",
                fail: true,
            }));
        create_router(AppState::new(Settings::default(), registry))
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["sources"], 2);
    }

    #[tokio::test]
    async fn test_search_all_json() {
        let (status, body) = get(app(), "/search?q=roadmap").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["number_of_results"], 1);
        assert_eq!(json["results"][0]["source"], "Team Docs");

        let progress = json["progress"].as_array().unwrap();
        assert_eq!(progress.len(), 4);
        assert!(progress.iter().any(|l| l == "❌ Slack: error"));
        assert!(progress
            .iter()
            .any(|l| l == "✅ Team Docs: completed (1 results)"));

        let summary = json["summary"].as_str().unwrap();
        assert!(summary.starts_with("🔍 Searching across multiple sources...\n\n"));
        assert!(summary.contains("Found 1 results across 1 sources:"));
        assert!(summary.contains("- **About roadmap**\n  body\n  https://example.com/a\n"));
    }

    #[tokio::test]
    async fn test_search_all_text() {
        let (status, body) = get(app(), "/search?q=roadmap&format=text").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("**Team Docs** (1 results):"));
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        let (status, _) = get(app(), "/search?q=%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_single_source() {
        let (status, body) = get(app(), "/sources/team-docs/search?q=handbook").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Found 1 results across 1 sources:"));

        let (status, body) = get(app(), "/sources/web/search?q=handbook").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.ends_with("Available sources: Team Docs, Slack"));

        let (status, body) = get(app(), "/sources/slack/search?q=handbook").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.starts_with("search failed"));
    }

    #[tokio::test]
    async fn test_sources_listing() {
        let (_, body) = get(app(), "/sources").await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["sources"][0]["slug"], "team-docs");
    }

    #[tokio::test]
    async fn test_stats_reflect_searches() {
        let app = app();
        get(app.clone(), "/search?q=roadmap").await;
        let (_, body) = get(app, "/stats").await;

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["total_searches"], 1);
        assert_eq!(json["sources"]["Slack"]["errors"], 1);
        assert_eq!(json["sources"]["Team Docs"]["successes"], 1);
    }

    #[tokio::test]
    async fn test_stats_count_single_source_searches() {
        let app = app();
        get(app.clone(), "/sources/team-docs/search?q=handbook").await;
        get(app.clone(), "/sources/slack/search?q=handbook").await;
        let (_, body) = get(app, "/stats").await;

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["sources"]["Team Docs"]["searches"], 1);
        assert_eq!(json["sources"]["Team Docs"]["successes"], 1);
        assert_eq!(json["sources"]["Slack"]["errors"], 1);
        assert!(json["sources"]["Slack"]["avg_response_time"].is_u64());
    }
}
