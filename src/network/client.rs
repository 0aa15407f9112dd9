//! HTTP client shared by API-backed data sources

use crate::config::OutgoingSettings;
use crate::error::SourceError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// An outgoing API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// URL to request
    pub url: String,
    /// Query parameters, sent in insertion order
    pub params: Vec<(String, String)>,
    /// Bearer token for the `Authorization` header
    pub bearer: Option<String>,
}

impl ApiRequest {
    /// Create a GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
            bearer: None,
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Authenticate with a bearer token
    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }
}

/// Response body and status of an API call
#[derive(Debug)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub text: String,
}

impl ApiResponse {
    /// Parse response as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, SourceError> {
        Ok(serde_json::from_str(&self.text)?)
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into an error
    pub fn error_for_status(self) -> Result<Self, SourceError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(SourceError::Status(self.status))
        }
    }
}

/// HTTP client wrapper configured from [`OutgoingSettings`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    user_agent: String,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, SourceError> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self, SourceError> {
        let request_timeout = Duration::try_from_secs_f64(settings.request_timeout)
            .map_err(|e| SourceError::Http(format!("invalid request timeout: {}", e)))?;

        let mut builder = Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(reqwest::Proxy::http(http)?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(reqwest::Proxy::https(https)?);
            }
        }

        let client = builder.build()?;

        let user_agent = match settings.useragent_suffix {
            Some(ref suffix) => format!("multisearch/{} {}", crate::VERSION, suffix),
            None => format!("multisearch/{}", crate::VERSION),
        };

        Ok(Self { client, user_agent })
    }

    /// Execute an API request
    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, SourceError> {
        let mut req_builder = self
            .client
            .get(&request.url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json");

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(ref token) = request.bearer {
            req_builder = req_builder.bearer_auth(token);
        }

        let response = req_builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        Ok(ApiResponse { status, text })
    }

    /// Execute a request and decode a successful JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
    ) -> Result<T, SourceError> {
        self.execute(request).await?.error_for_status()?.json()
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new().unwrap();
        assert!(client.user_agent().starts_with("multisearch/"));
    }

    #[test]
    fn test_unrepresentable_timeout_is_error() {
        let settings = OutgoingSettings {
            request_timeout: f64::INFINITY,
            ..Default::default()
        };
        assert!(matches!(
            HttpClient::with_settings(&settings),
            Err(SourceError::Http(_))
        ));
    }

    #[tokio::test]
    async fn test_get_json_sends_params_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ping"))
            .and(query_param("q", "hello"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = ApiRequest::get(format!("{}/api/ping", server.uri()))
            .param("q", "hello")
            .bearer("secret");
        let body: serde_json::Value = client.get_json(request).await.unwrap();

        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let err = client
            .get_json::<serde_json::Value>(ApiRequest::get(server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, SourceError::Status(503)));
    }
}
