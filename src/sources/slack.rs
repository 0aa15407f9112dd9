//! Slack message search

use super::keywords::KeywordMatcher;
use super::traits::{position_score, DataSource};
use crate::error::SourceError;
use crate::network::{ApiRequest, HttpClient};
use crate::results::SearchResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

/// Default relevance keywords
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "said",
    "mentioned",
    "discussion",
    "conversation",
    "message",
    "chat",
    "slack",
];

const DEFAULT_API_URL: &str = "https://slack.com/api";

/// Searches Slack messages through the Web API
pub struct Slack {
    name: String,
    client: HttpClient,
    token: String,
    api_url: String,
    count: u32,
    keywords: KeywordMatcher,
    connected: AtomicBool,
}

impl Slack {
    pub fn new(client: HttpClient, token: impl Into<String>) -> Self {
        Self {
            name: "Slack".to_string(),
            client,
            token: token.into(),
            api_url: DEFAULT_API_URL.to_string(),
            count: 10,
            keywords: KeywordMatcher::new(DEFAULT_KEYWORDS),
            connected: AtomicBool::new(false),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Point at a different API root (used for self-hosted proxies and tests)
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn with_keywords(mut self, keywords: KeywordMatcher) -> Self {
        self.keywords = keywords;
        self
    }

    fn request(&self, method: &str) -> ApiRequest {
        ApiRequest::get(format!("{}/{}", self.api_url, method)).bearer(&self.token)
    }

    fn to_result(&self, index: usize, message: Message) -> SearchResult {
        let channel = message
            .channel
            .and_then(|c| c.name)
            .unwrap_or_else(|| "unknown".to_string());

        let mut result = SearchResult::new(
            &self.name,
            format!("Message in #{}", channel),
            message.text.unwrap_or_default(),
            position_score(index),
        )
        .with_metadata("user", json!(message.username))
        .with_metadata("timestamp", json!(message.ts))
        .with_metadata("channel", json!(channel));

        if let Some(posted) = message.ts.as_deref().and_then(parse_ts) {
            result = result.with_metadata("posted_at", json!(posted.to_rfc3339()));
        }
        if let Some(permalink) = message.permalink {
            result = result.with_url(permalink);
        }
        result
    }
}

#[async_trait]
impl DataSource for Slack {
    fn name(&self) -> &str {
        &self.name
    }

    async fn connect(&self) -> Result<(), SourceError> {
        let response: Envelope<serde_json::Value> =
            self.client.get_json(self.request("auth.test")).await?;
        response.into_payload()?;

        self.connected.store(true, Ordering::Release);
        info!("{} connected", self.name);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SourceError> {
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn is_relevant_for(&self, query: &str) -> bool {
        self.keywords.matches(query)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SourceError> {
        let request = self
            .request("search.messages")
            .param("query", query)
            .param("count", self.count.to_string());

        let response: Envelope<SearchPayload> = self.client.get_json(request).await?;
        let matches = response
            .into_payload()?
            .messages
            .map(|m| m.matches)
            .unwrap_or_default();

        debug!("{} returned {} messages", self.name, matches.len());

        Ok(matches
            .into_iter()
            .enumerate()
            .map(|(index, message)| self.to_result(index, message))
            .collect())
    }
}

/// Slack wraps every payload in `{ "ok": bool, "error": "..." }`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    payload: T,
}

impl<T> Envelope<T> {
    fn into_payload(self) -> Result<T, SourceError> {
        if self.ok {
            Ok(self.payload)
        } else {
            Err(SourceError::Api(
                self.error.unwrap_or_else(|| "unknown_error".to_string()),
            ))
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPayload {
    #[serde(default)]
    messages: Option<Matches>,
}

#[derive(Debug, Deserialize)]
struct Matches {
    #[serde(default)]
    matches: Vec<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    channel: Option<Channel>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    permalink: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    ts: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(default)]
    name: Option<String>,
}

/// Slack timestamps look like `"1700000000.000200"`
fn parse_ts(ts: &str) -> Option<DateTime<Utc>> {
    let secs = ts.split('.').next()?.parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0)
}
