//! Node Executor
//!
//! Turns one node plus its propagated inputs into exactly one service call,
//! normalizes the response into the text shown on the node, and records the
//! outcome on the node. Failures never escape: they become `status = error`
//! with the error message as the node's result.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::error::NodeError;
use crate::graph::{GraphStore, Node, NodeKind, NodeStatus};
use crate::propagate::NodeInputs;
use crate::services::{
    is_meaningful, CrawlRequest, ExtractDepth, ExtractRequest, MapRequest, SearchRequest,
    ServiceResponse, WebIntelligence,
};

/// Default cap on URLs sent in one extract call.
pub const DEFAULT_MAX_EXTRACT_URLS: usize = 5;

/// Characters of raw page content shown when nothing better exists.
pub const RAW_CONTENT_PREVIEW_CHARS: usize = 500;

/// URLs listed under a map node's summary.
pub const MAP_PREVIEW_URLS: usize = 5;

const SEARCH_FALLBACK: &str = "Search completed, but no answer was generated.";
const EXTRACT_FALLBACK: &str = "Content extracted, but no readable text was found.";
const QA_FALLBACK: &str =
    "No specific answer could be determined from the provided question and context.";

/// What a successful node produced.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutcome {
    /// Text shown on the node.
    pub display: String,
    /// Full response, handed to downstream nodes.
    pub response: ServiceResponse,
}

/// Executes single nodes against a [`WebIntelligence`] backend.
#[derive(Clone)]
pub struct NodeExecutor {
    service: Arc<dyn WebIntelligence>,
    max_extract_urls: usize,
}

impl NodeExecutor {
    pub fn new(service: Arc<dyn WebIntelligence>) -> Self {
        Self {
            service,
            max_extract_urls: DEFAULT_MAX_EXTRACT_URLS,
        }
    }

    pub fn with_max_extract_urls(mut self, max_extract_urls: usize) -> Self {
        self.max_extract_urls = max_extract_urls.max(1);
        self
    }

    /// Run `node_id` once and record the outcome on the node.
    ///
    /// Returns the full response on success and `None` on any failure, including
    /// a node that is not idle (it has already run in this run).
    pub async fn execute(
        &self,
        store: &mut GraphStore,
        node_id: &str,
        inputs: &NodeInputs,
    ) -> Option<ServiceResponse> {
        let Some(node) = store.node(node_id).cloned() else {
            warn!(node_id, "Cannot execute unknown node");
            return None;
        };

        if let Err(e) = store.transition(node_id, NodeStatus::Running, None) {
            warn!(node_id, error = %e, "Node not runnable, skipping");
            return None;
        }
        info!(node_id, kind = %node.kind, "Executing node");

        let (status, display, response) = match self.call(&node, inputs).await {
            Ok(outcome) => {
                info!(node_id, "Node completed");
                (NodeStatus::Completed, outcome.display, Some(outcome.response))
            }
            Err(e) => {
                error!(node_id, kind = %node.kind, error = %e, "Node failed");
                (NodeStatus::Error, e.to_string(), None)
            }
        };

        if let Err(e) = store.transition(node_id, status, Some(display)) {
            warn!(node_id, error = %e, "Could not record node outcome");
        }
        response
    }

    /// Issue the node's call without touching any store.
    pub async fn call(&self, node: &Node, inputs: &NodeInputs) -> Result<NodeOutcome, NodeError> {
        match node.kind {
            NodeKind::Search => self.run_search(node, inputs).await,
            NodeKind::Extract => self.run_extract(node, inputs).await,
            NodeKind::Crawl => self.run_crawl(node, inputs).await,
            NodeKind::Map => self.run_map(node, inputs).await,
            NodeKind::Qa => self.run_qa(node, inputs).await,
        }
    }

    async fn run_search(&self, node: &Node, inputs: &NodeInputs) -> Result<NodeOutcome, NodeError> {
        let query = meaningful(&node.data.query)
            .or_else(|| meaningful(&inputs.query))
            .ok_or_else(|| missing(node, "query"))?;

        let query = match meaningful(&inputs.context) {
            Some(context) => search_with_context(query, context),
            None => query.to_string(),
        };

        let response = self.service.search(&SearchRequest::single(query)).await?;
        let display = response
            .as_text()
            .and_then(|r| r.answer().or_else(|| r.first_result_answer()))
            .unwrap_or(SEARCH_FALLBACK)
            .to_string();

        Ok(NodeOutcome { display, response })
    }

    async fn run_extract(&self, node: &Node, inputs: &NodeInputs) -> Result<NodeOutcome, NodeError> {
        let mut urls = match inputs.urls.as_ref().filter(|urls| !urls.is_empty()) {
            Some(urls) => urls.clone(),
            None => {
                let url = meaningful(&node.data.url)
                    .or_else(|| meaningful(&inputs.url))
                    .ok_or_else(|| missing(node, "url"))?;
                vec![url.to_string()]
            }
        };
        urls.truncate(self.max_extract_urls);

        let request = ExtractRequest {
            urls,
            query: guidance(node, inputs),
            include_answer: true,
            extract_depth: ExtractDepth::Advanced,
        };

        let response = self.service.extract(&request).await?;
        let display = extract_display(&response);

        Ok(NodeOutcome { display, response })
    }

    async fn run_crawl(&self, node: &Node, inputs: &NodeInputs) -> Result<NodeOutcome, NodeError> {
        let request = CrawlRequest {
            url: target_url(node, inputs)?,
            query: guidance(node, inputs),
        };

        let response = self.service.crawl(&request).await?;
        let display = format!(
            "Crawl complete. Discovered and analyzed {} nested pages/resources.",
            response.result_count()
        );

        Ok(NodeOutcome { display, response })
    }

    async fn run_map(&self, node: &Node, inputs: &NodeInputs) -> Result<NodeOutcome, NodeError> {
        let request = MapRequest {
            url: target_url(node, inputs)?,
        };

        let response = self.service.map(&request).await?;
        let display = map_display(&response);

        Ok(NodeOutcome { display, response })
    }

    async fn run_qa(&self, node: &Node, inputs: &NodeInputs) -> Result<NodeOutcome, NodeError> {
        let question = meaningful(&node.data.question).ok_or_else(|| missing(node, "question"))?;

        let question = match meaningful(&node.data.context).or_else(|| meaningful(&inputs.context)) {
            Some(context) => qa_with_context(question, context),
            None => question.to_string(),
        };

        let response = self.service.search(&SearchRequest::single(question)).await?;
        let display = response
            .as_text()
            .and_then(|r| r.first_result_answer().or_else(|| r.answer()))
            .unwrap_or(QA_FALLBACK)
            .to_string();

        Ok(NodeOutcome { display, response })
    }
}

/// Search query rewritten to use upstream context as reference material.
pub fn search_with_context(query: &str, context: &str) -> String {
    format!(
        "Question: {query}\n\nContext for reference:\n{context}\n\n\
         Instructions: Answer the question precisely. Use the context if it is relevant; \
         otherwise search the web."
    )
}

/// QA question rewritten to be answered strictly from upstream context.
pub fn qa_with_context(question: &str, context: &str) -> String {
    format!(
        "Question: {question}\n\nContext to analyze:\n{context}\n\n\
         Instructions: Answer strictly from the context above. If the context is \
         insufficient, say that the answer is unknown."
    )
}

fn meaningful(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|v| is_meaningful(v))
}

fn missing(node: &Node, field: &'static str) -> NodeError {
    NodeError::MissingInput {
        node_id: node.id.clone(),
        field,
    }
}

/// Node URL first, then the propagated one.
fn target_url(node: &Node, inputs: &NodeInputs) -> Result<String, NodeError> {
    meaningful(&node.data.url)
        .or_else(|| meaningful(&inputs.url))
        .map(str::to_string)
        .ok_or_else(|| missing(node, "url"))
}

/// Upstream context first, then the node's own query.
fn guidance(node: &Node, inputs: &NodeInputs) -> Option<String> {
    meaningful(&inputs.context)
        .or_else(|| meaningful(&node.data.query))
        .map(str::to_string)
}

fn extract_display(response: &ServiceResponse) -> String {
    let Some(text) = response.as_text() else {
        return EXTRACT_FALLBACK.to_string();
    };

    if let Some(answer) = text.answer() {
        return answer.to_string();
    }

    let first = text.results.first();
    if let Some(content) = first.and_then(|r| r.content.as_deref()).filter(|c| is_meaningful(c)) {
        return content.to_string();
    }
    if let Some(raw) = first.and_then(|r| r.raw_content.as_deref()).filter(|c| is_meaningful(c)) {
        return truncate(raw, RAW_CONTENT_PREVIEW_CHARS);
    }

    EXTRACT_FALLBACK.to_string()
}

fn map_display(response: &ServiceResponse) -> String {
    let listed: Vec<&str> = match response {
        ServiceResponse::UrlList(list) => list.results.iter().map(String::as_str).collect(),
        ServiceResponse::Text(text) => text.results.iter().filter_map(|r| r.url.as_deref()).collect(),
    };

    let mut display = format!("Map complete. Found {} URLs.", response.result_count());
    for url in listed.iter().take(MAP_PREVIEW_URLS) {
        display.push_str("\n- ");
        display.push_str(url);
    }
    display
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
