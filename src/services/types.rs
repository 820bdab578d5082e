//! Request and response shapes for the collaborator services.
//!
//! Responses are classified once, right after the call, into
//! [`ServiceResponse`]. Nothing downstream re-inspects raw JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceError;

/// Placeholder the search service uses when it has no real answer.
pub const NO_ANSWER_SENTINEL: &str = "No AI answer provided";

/// True when `text` carries real content (not blank, not the sentinel).
pub fn is_meaningful(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed != NO_ANSWER_SENTINEL
}

/// Extraction depth for the extract service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractDepth {
    Basic,
    #[default]
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub queries: Vec<String>,
    pub include_answer: bool,
}

impl SearchRequest {
    pub fn single(query: impl Into<String>) -> Self {
        Self {
            queries: vec![query.into()],
            include_answer: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractRequest {
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub include_answer: bool,
    pub extract_depth: ExtractDepth,
}

/// Body for the crawl route. The backend reads the guidance text from its
/// `instructions` field, so `query` is sent under that name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlRequest {
    pub url: String,
    /// Natural language guidance for the crawler.
    #[serde(rename = "instructions", skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapRequest {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateFlowRequest {
    pub prompt: String,
}

/// One entry of a text-bearing response.
///
/// Search returns one entry per query (with its own `answer`); extract and
/// crawl return one entry per page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

impl ResultItem {
    /// Best text this entry offers: answer, then content, then raw content.
    ///
    /// Each field is checked on its own, so a blank or placeholder answer falls
    /// through to the page content instead of discarding the entry.
    pub fn best_text(&self) -> Option<&str> {
        [&self.answer, &self.content, &self.raw_content]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .find(|text| is_meaningful(text))
    }
}

/// Search, extract and crawl responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub results: Vec<ResultItem>,
}

impl TextResponse {
    /// Top-level answer, unless blank or the sentinel.
    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|a| is_meaningful(a))
    }

    /// `answer` of the first entry, unless blank or the sentinel.
    pub fn first_result_answer(&self) -> Option<&str> {
        self.results
            .first()
            .and_then(|r| r.answer.as_deref())
            .filter(|a| is_meaningful(a))
    }

    /// Top-level `url`, else the first entry's `url`.
    pub fn primary_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .or_else(|| self.results.first().and_then(|r| r.url.as_deref()))
            .filter(|u| !u.trim().is_empty())
    }
}

/// Map responses: a flat list of discovered URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlListResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub results: Vec<String>,
}

impl UrlListResponse {
    /// Entries that look like URLs, in response order.
    pub fn http_urls(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|u| u.starts_with("http"))
            .cloned()
            .collect()
    }
}

/// A collaborator response, classified by shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceResponse {
    Text(TextResponse),
    UrlList(UrlListResponse),
}

impl ServiceResponse {
    /// Classify a raw response body.
    ///
    /// A non-empty `results` array made only of strings is a URL list;
    /// anything else is read as a text response.
    pub fn classify(value: Value) -> Result<Self, ServiceError> {
        let is_url_list = value
            .get("results")
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty() && items.iter().all(Value::is_string));

        let parsed = if is_url_list {
            serde_json::from_value(value).map(ServiceResponse::UrlList)
        } else {
            serde_json::from_value(value).map(ServiceResponse::Text)
        };

        parsed.map_err(|e| ServiceError::Parse(e.to_string()))
    }

    /// Number of entries in `results`, whatever their shape.
    pub fn result_count(&self) -> usize {
        match self {
            ServiceResponse::Text(text) => text.results.len(),
            ServiceResponse::UrlList(list) => list.results.len(),
        }
    }

    pub fn as_text(&self) -> Option<&TextResponse> {
        match self {
            ServiceResponse::Text(text) => Some(text),
            ServiceResponse::UrlList(_) => None,
        }
    }

    pub fn as_url_list(&self) -> Option<&UrlListResponse> {
        match self {
            ServiceResponse::UrlList(list) => Some(list),
            ServiceResponse::Text(_) => None,
        }
    }
}
