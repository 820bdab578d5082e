//! End-to-end runs against a mocked HTTP backend.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use webflow::{
    generate_graph, FlowScheduler, GraphStore, HttpServiceClient, Node, NodeExecutor, NodeKind,
    NodeStatus, Position,
};

fn node(id: &str, kind: NodeKind) -> Node {
    Node::with_id(id, kind, Position::default())
}

#[tokio::test]
async fn test_map_extract_qa_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/map/"))
        .and(body_json(json!({"url": "https://example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base_url": "https://example.com",
            "results": ["https://example.com/news", "https://example.com/about"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/extract/"))
        .and(body_partial_json(json!({
            "urls": ["https://example.com/news", "https://example.com/about"],
            "include_answer": true,
            "extract_depth": "advanced"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "answer": "No AI answer provided",
            "results": [
                {"url": "https://example.com/news", "raw_content": "Rust 2.0 announced."},
                {"url": "https://example.com/about", "raw_content": "We write about Rust."}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/web_search/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"query": "q", "answer": "Rust 2.0 was announced."}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut graph = GraphStore::new();
    graph
        .add_node(node("map", NodeKind::Map).with_url("https://example.com"))
        .unwrap();
    graph.add_node(node("extract", NodeKind::Extract)).unwrap();
    graph
        .add_node(node("qa", NodeKind::Qa).with_question("What was announced?"))
        .unwrap();
    graph.connect("map", "extract").unwrap();
    graph.connect("extract", "qa").unwrap();

    let client = Arc::new(HttpServiceClient::new(mock_server.uri()));
    let report = FlowScheduler::new(NodeExecutor::new(client))
        .run(&mut graph)
        .await;

    assert_eq!(report.completed, vec!["map", "extract", "qa"]);
    assert_eq!(
        graph.node("extract").unwrap().data.result.as_deref(),
        Some("Rust 2.0 announced.")
    );
    assert_eq!(
        graph.node("qa").unwrap().data.result.as_deref(),
        Some("Rust 2.0 was announced.")
    );
}

#[tokio::test]
async fn test_backend_error_body_becomes_node_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/crawl/"))
        .respond_with(ResponseTemplate::new(502).set_body_string("crawler unavailable"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut graph = GraphStore::new();
    graph
        .add_node(node("crawl", NodeKind::Crawl).with_url("https://example.com"))
        .unwrap();

    let client = Arc::new(HttpServiceClient::new(mock_server.uri()));
    let report = FlowScheduler::new(NodeExecutor::new(client))
        .run(&mut graph)
        .await;

    let crawl = graph.node("crawl").unwrap();
    assert_eq!(crawl.data.status, NodeStatus::Error);
    assert_eq!(crawl.data.result.as_deref(), Some("crawler unavailable"));
    assert_eq!(report.failed, vec!["crawl"]);
}

#[tokio::test]
async fn test_generate_uses_service_flow() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/flow/generate"))
        .and(body_json(json!({"prompt": "latest rust news"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [
                {"id": "s", "type": "search", "position": {"x": 0.0, "y": 0.0},
                 "data": {"label": "", "status": "completed", "query": "latest rust news"}}
            ],
            "edges": []
        })))
        .mount(&mock_server)
        .await;

    let client = HttpServiceClient::new(mock_server.uri());
    let graph = generate_graph(&client, "latest rust news").await.unwrap();

    assert_eq!(graph.len(), 1);
    let search = graph.node("s").unwrap();
    assert_eq!(search.data.status, NodeStatus::Idle);
    assert_eq!(search.data.label, "search node");
}

#[tokio::test]
async fn test_generate_falls_back_when_service_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/flow/generate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model offline"))
        .mount(&mock_server)
        .await;

    let client = HttpServiceClient::new(mock_server.uri());
    let graph = generate_graph(&client, "summarize https://example.com")
        .await
        .unwrap();

    let kinds: Vec<NodeKind> = graph.nodes().iter().map(|n| n.kind).collect();
    assert_eq!(kinds, vec![NodeKind::Map, NodeKind::Extract, NodeKind::Qa]);
    assert_eq!(graph.edges().len(), 2);
}

#[tokio::test]
async fn test_generate_falls_back_on_dangling_edge() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/flow/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [{"id": "a", "type": "search", "position": {"x": 0.0, "y": 0.0}, "data": {}}],
            "edges": [{"source": "a", "target": "ghost"}]
        })))
        .mount(&mock_server)
        .await;

    let client = HttpServiceClient::new(mock_server.uri());
    let graph = generate_graph(&client, "what is rust").await.unwrap();

    assert!(!graph.contains("ghost"));
    assert_eq!(graph.nodes()[0].kind, NodeKind::Search);
    assert_eq!(graph.nodes()[0].id, "node_1");
}
