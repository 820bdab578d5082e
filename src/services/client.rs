//! Collaborator service clients
//!
//! [`WebIntelligence`] is the seam the executor calls through; [`FlowGenerator`]
//! seeds graphs from prompts. [`HttpServiceClient`] implements both over the
//! dashboard backend's JSON routes.
//!
//! Calls are fire-once: no retries, and no timeout unless one is configured.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::graph::FlowDefinition;
use crate::services::types::{
    CrawlRequest, ExtractRequest, GenerateFlowRequest, MapRequest, SearchRequest, ServiceResponse,
};

const SEARCH_PATH: &str = "/web_search/search";
const EXTRACT_PATH: &str = "/extract/";
const CRAWL_PATH: &str = "/crawl/";
const MAP_PATH: &str = "/map/";
const GENERATE_PATH: &str = "/flow/generate";

/// The four web-intelligence operations a node can perform.
#[async_trait]
pub trait WebIntelligence: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<ServiceResponse, ServiceError>;

    async fn extract(&self, request: &ExtractRequest) -> Result<ServiceResponse, ServiceError>;

    async fn crawl(&self, request: &CrawlRequest) -> Result<ServiceResponse, ServiceError>;

    async fn map(&self, request: &MapRequest) -> Result<ServiceResponse, ServiceError>;
}

/// Turns a natural-language prompt into an initial flow.
#[async_trait]
pub trait FlowGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<FlowDefinition, ServiceError>;
}

/// reqwest-backed client for the dashboard backend.
///
/// # Example
/// ```ignore
/// let client = HttpServiceClient::new("http://127.0.0.1:8000")
///     .with_timeout(Duration::from_secs(60));
/// let response = client.search(&SearchRequest::single("rust async")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpServiceClient {
    client: Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: None,
        }
    }

    /// Bound every call to `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON and return the decoded response body.
    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Calling service");

        let mut request = self.client.post(&url).json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return response
                .json::<Value>()
                .await
                .map_err(|e| ServiceError::Parse(e.to_string()));
        }

        let body = match response.text().await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => format!("HTTP {}", status.as_u16()),
            Err(e) => {
                warn!(url = %url, error = %e, "Could not read error body");
                format!("HTTP {}", status.as_u16())
            }
        };
        warn!(url = %url, status = status.as_u16(), "Service call failed");
        Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn post_classified<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ServiceResponse, ServiceError> {
        let value = self.post(path, body).await?;
        ServiceResponse::classify(value)
    }
}

#[async_trait]
impl WebIntelligence for HttpServiceClient {
    async fn search(&self, request: &SearchRequest) -> Result<ServiceResponse, ServiceError> {
        self.post_classified(SEARCH_PATH, request).await
    }

    async fn extract(&self, request: &ExtractRequest) -> Result<ServiceResponse, ServiceError> {
        self.post_classified(EXTRACT_PATH, request).await
    }

    async fn crawl(&self, request: &CrawlRequest) -> Result<ServiceResponse, ServiceError> {
        self.post_classified(CRAWL_PATH, request).await
    }

    async fn map(&self, request: &MapRequest) -> Result<ServiceResponse, ServiceError> {
        self.post_classified(MAP_PATH, request).await
    }
}

#[async_trait]
impl FlowGenerator for HttpServiceClient {
    async fn generate(&self, prompt: &str) -> Result<FlowDefinition, ServiceError> {
        let body = GenerateFlowRequest {
            prompt: prompt.to_string(),
        };
        let value = self.post(GENERATE_PATH, &body).await?;
        serde_json::from_value(value).map_err(|e| ServiceError::Parse(e.to_string()))
    }
}


/// HTTP tests against a mocked backend
#[cfg(test)]
mod http_tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_search_sends_queries_and_classifies() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .and(body_json(json!({"queries": ["rust"], "include_answer": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"query": "rust", "answer": "A systems language.", "results": []}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpServiceClient::new(mock_server.uri());
        let response = client.search(&SearchRequest::single("rust")).await.unwrap();

        assert_eq!(
            response.as_text().unwrap().first_result_answer(),
            Some("A systems language.")
        );
    }

    #[tokio::test]
    async fn test_http_map_returns_url_list() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MAP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "base_url": "https://example.com",
                "results": ["https://example.com/a"]
            })))
            .mount(&mock_server)
            .await;

        let client = HttpServiceClient::new(mock_server.uri());
        let response = client
            .map(&MapRequest {
                url: "https://example.com".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.as_url_list().unwrap().results, vec!["https://example.com/a"]);
    }

    #[tokio::test]
    async fn test_http_error_body_is_surfaced_verbatim() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(EXTRACT_PATH))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"detail":"Rate limit exceeded."}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpServiceClient::new(mock_server.uri());
        let err = client
            .extract(&ExtractRequest {
                urls: vec!["https://example.com".to_string()],
                query: None,
                include_answer: true,
                extract_depth: Default::default(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), r#"{"detail":"Rate limit exceeded."}"#);
    }

    #[tokio::test]
    async fn test_http_empty_error_body_falls_back_to_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MAP_PATH))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpServiceClient::new(mock_server.uri());
        let err = client
            .map(&MapRequest {
                url: "https://example.com".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP 503");
    }

    #[tokio::test]
    async fn test_http_no_retry_on_server_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(CRAWL_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpServiceClient::new(mock_server.uri());
        let result = client
            .crawl(&CrawlRequest {
                url: "https://example.com".to_string(),
                query: None,
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_http_malformed_response() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
            .mount(&mock_server)
            .await;

        let client = HttpServiceClient::new(mock_server.uri());
        let result = client.search(&SearchRequest::single("x")).await;

        assert!(matches!(result, Err(ServiceError::Parse(_))));
    }

    #[tokio::test]
    async fn test_http_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(MAP_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"results": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client =
            HttpServiceClient::new(mock_server.uri()).with_timeout(Duration::from_millis(50));
        let result = client
            .map(&MapRequest {
                url: "https://example.com".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Timeout)));
    }

    #[tokio::test]
    async fn test_http_connection_refused() {
        let client = HttpServiceClient::new("http://127.0.0.1:1");
        let result = client.search(&SearchRequest::single("x")).await;
        assert!(matches!(result, Err(ServiceError::Connection(_))));
    }

    #[tokio::test]
    async fn test_http_generate_flow() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(body_json(json!({"prompt": "AI news"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "nodes": [
                    {"id": "node_1", "type": "search", "position": {"x": 100, "y": 100},
                     "data": {"query": "AI news"}}
                ],
                "edges": []
            })))
            .mount(&mock_server)
            .await;

        let client = HttpServiceClient::new(mock_server.uri());
        let flow = client.generate("AI news").await.unwrap();

        assert_eq!(flow.nodes.len(), 1);
        assert_eq!(flow.nodes[0].data.query.as_deref(), Some("AI news"));
    }
}
