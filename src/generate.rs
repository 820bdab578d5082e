//! Flow seeding from natural-language prompts.
//!
//! The generation service is asked first. When it fails, returns nothing, or
//! returns a graph that does not validate, a local keyword heuristic builds a
//! small linear flow instead, so a prompt always yields something runnable.

use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::GraphError;
use crate::graph::{Edge, FlowDefinition, GraphStore, Node, NodeKind, Position};
use crate::services::FlowGenerator;

const NODE_SPACING_X: f64 = 300.0;
const ORIGIN_X: f64 = 100.0;
const ORIGIN_Y: f64 = 100.0;

const SUMMARY_KEYWORDS: &[&str] = &["summarize", "summarise", "summary", "digest", "top ", "news"];
const ANALYSIS_KEYWORDS: &[&str] = &[
    "compare", "analyze", "analyse", "summarize", "summarise", "summary", "explain",
];
const QUESTION_WORDS: &[&str] = &[
    "what", "who", "when", "where", "why", "how", "which", "search", "find",
];
const MAP_KEYWORDS: &[&str] = &["map", "urls", "links", "sitemap"];

/// Build a graph for `prompt`, preferring the generation service.
pub async fn generate_graph(generator: &dyn FlowGenerator, prompt: &str) -> Result<GraphStore, GraphError> {
    match generator.generate(prompt).await {
        Ok(definition) if !definition.nodes.is_empty() => {
            match GraphStore::from_definition(definition) {
                Ok(store) => {
                    info!(nodes = store.len(), "Flow generated by service");
                    return Ok(store);
                }
                Err(e) => warn!(error = %e, "Generated flow rejected, using heuristic flow"),
            }
        }
        Ok(_) => warn!("Generated flow was empty, using heuristic flow"),
        Err(e) => warn!(error = %e, "Flow generation failed, using heuristic flow"),
    }

    GraphStore::from_definition(heuristic_flow(prompt))
}

fn url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"https?://[^\s]+").ok())
        .as_ref()
}

/// First http(s) URL in `text`, without trailing punctuation.
pub fn extract_url(text: &str) -> Option<String> {
    let found = url_pattern()?.find(text)?.as_str();
    let trimmed = found.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', ']', '"', '\'']);
    Some(trimmed.to_string())
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

fn starts_with_any(text: &str, words: &[&str]) -> bool {
    let first = text.split_whitespace().next().unwrap_or_default();
    words.contains(&first)
}

/// Keyword-driven flow for `prompt`; no network involved.
pub fn heuristic_flow(prompt: &str) -> FlowDefinition {
    let lower = prompt.to_lowercase();
    let mut chain = Chain::default();

    match extract_url(prompt) {
        Some(url) if contains_any(&lower, SUMMARY_KEYWORDS) => {
            chain.push(Node::with_id("node_1", NodeKind::Map, Position::default()).with_url(&url));
            chain.push(Node::with_id("node_2", NodeKind::Extract, Position::default()).with_query(prompt));
            chain.push(Node::with_id("node_3", NodeKind::Qa, Position::default()).with_question(prompt));
        }
        Some(url) if lower.contains("crawl") => {
            chain.push(
                Node::with_id("node_1", NodeKind::Crawl, Position::default())
                    .with_url(&url)
                    .with_query(prompt),
            );
        }
        Some(url) if lower.contains("extract") => {
            chain.push(
                Node::with_id("node_1", NodeKind::Extract, Position::default())
                    .with_url(&url)
                    .with_query(prompt),
            );
        }
        Some(url) if contains_any(&lower, MAP_KEYWORDS) => {
            chain.push(Node::with_id("node_1", NodeKind::Map, Position::default()).with_url(&url));
        }
        Some(url) => {
            chain.push(
                Node::with_id("node_1", NodeKind::Extract, Position::default())
                    .with_url(&url)
                    .with_query(prompt),
            );
            chain.push(Node::with_id("node_2", NodeKind::Qa, Position::default()).with_question(prompt));
        }
        None if contains_any(&lower, ANALYSIS_KEYWORDS) => {
            chain.push(Node::with_id("node_1", NodeKind::Search, Position::default()).with_query(prompt));
            chain.push(Node::with_id("node_2", NodeKind::Qa, Position::default()).with_question(prompt));
        }
        None if starts_with_any(&lower, QUESTION_WORDS) => {
            chain.push(Node::with_id("node_1", NodeKind::Search, Position::default()).with_query(prompt));
        }
        None => {
            chain.push(Node::with_id("node_1", NodeKind::Search, Position::default()).with_query(prompt));
            chain.push(Node::with_id("node_2", NodeKind::Qa, Position::default()).with_question(prompt));
        }
    }

    chain.finish()
}

/// Linear flow laid out left to right.
#[derive(Default)]
struct Chain {
    nodes: Vec<Node>,
}

impl Chain {
    fn push(&mut self, mut node: Node) {
        node.position = Position::new(ORIGIN_X + NODE_SPACING_X * self.nodes.len() as f64, ORIGIN_Y);
        self.nodes.push(node);
    }

    fn finish(self) -> FlowDefinition {
        let edges = self
            .nodes
            .windows(2)
            .map(|pair| Edge {
                id: Some(format!("edge_{}_{}", pair[0].id, pair[1].id)),
                source: pair[0].id.clone(),
                target: pair[1].id.clone(),
            })
            .collect();

        FlowDefinition {
            nodes: self.nodes,
            edges,
        }
    }
}
