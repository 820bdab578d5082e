//! Input Propagator
//!
//! Harvests reusable context from a node's finished parents. Parents are folded
//! in parent order:
//!
//! 1. A URL-list parent (a map) sets `urls` to its http entries and `url` to the
//!    first of them. Its text is not harvested.
//! 2. Any other parent contributes text: its top-level answer, or else the best
//!    text of up to [`MAX_RESULTS_HARVESTED`] entries (distinct, blank-line
//!    joined). Contributions from several parents are concatenated in order.
//! 3. A parent exposing a top-level or first-entry `url` sets `url`; the last
//!    parent to supply one wins.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::services::{ServiceResponse, TextResponse, UrlListResponse};

/// Entries inspected per parent when no top-level answer exists.
pub const MAX_RESULTS_HARVESTED: usize = 10;

const SEPARATOR: &str = "\n\n";

/// Values handed from parents to a node before it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl NodeInputs {
    pub fn is_empty(&self) -> bool {
        self.context.is_none() && self.url.is_none() && self.urls.is_none() && self.query.is_none()
    }

    fn append_context(&mut self, text: String) {
        match self.context.as_mut() {
            Some(existing) => {
                existing.push_str(SEPARATOR);
                existing.push_str(&text);
            }
            None => self.context = Some(text),
        }
    }
}

/// Build the inputs for a node from its parents' raw results.
///
/// `parents` yields one entry per parent in parent order; `None` marks a parent
/// that produced nothing usable (for example because it failed).
pub fn propagate<'a, I>(parents: I) -> NodeInputs
where
    I: IntoIterator<Item = Option<&'a ServiceResponse>>,
{
    let mut inputs = NodeInputs::default();

    for response in parents.into_iter().flatten() {
        match response {
            ServiceResponse::UrlList(list) => absorb_url_list(&mut inputs, list),
            ServiceResponse::Text(text) => absorb_text(&mut inputs, text),
        }
    }

    debug!(
        has_context = inputs.context.is_some(),
        url = ?inputs.url,
        url_count = inputs.urls.as_ref().map_or(0, Vec::len),
        "Inputs propagated"
    );
    inputs
}

fn absorb_url_list(inputs: &mut NodeInputs, list: &UrlListResponse) {
    let urls = list.http_urls();
    if let Some(first) = urls.first() {
        inputs.url = Some(first.clone());
        inputs.urls = Some(urls);
    }
}

fn absorb_text(inputs: &mut NodeInputs, response: &TextResponse) {
    if let Some(text) = harvest_text(response) {
        inputs.append_context(text);
    }
    if let Some(url) = response.primary_url() {
        inputs.url = Some(url.to_string());
    }
}

/// Best-effort text from one parent's response.
pub fn harvest_text(response: &TextResponse) -> Option<String> {
    if let Some(answer) = response.answer() {
        return Some(answer.to_string());
    }

    let mut pieces: Vec<&str> = Vec::new();
    for text in response
        .results
        .iter()
        .take(MAX_RESULTS_HARVESTED)
        .filter_map(|item| item.best_text())
    {
        if !pieces.contains(&text) {
            pieces.push(text);
        }
    }

    if pieces.is_empty() {
        None
    } else {
        Some(pieces.join(SEPARATOR))
    }
}
