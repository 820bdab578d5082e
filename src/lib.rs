//! # webflow
//!
//! Execution engine for small directed graphs of web-intelligence operations.
//!
//! A flow is a graph of nodes (search, crawl, extract, map, qa). Running it
//! executes every node once in dependency order, feeding each node the text,
//! URL or URL list its parents produced.
//!
//! ```text
//!  search ──┐
//!           ├──► qa          map ──► extract ──► qa
//!  crawl ───┘
//! ```
//!
//! ## Quick Start
//! ```ignore
//! use std::sync::Arc;
//! use webflow::{FlowScheduler, GraphStore, HttpServiceClient, Node, NodeExecutor, NodeKind, Position};
//!
//! let mut graph = GraphStore::new();
//! graph.add_node(Node::with_id("s", NodeKind::Search, Position::default()).with_query("capital of France"))?;
//! graph.add_node(Node::with_id("q", NodeKind::Qa, Position::default()).with_question("Which river runs through it?"))?;
//! graph.connect("s", "q")?;
//!
//! let executor = NodeExecutor::new(Arc::new(HttpServiceClient::new("http://127.0.0.1:8000")));
//! let report = FlowScheduler::new(executor).run(&mut graph).await;
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod generate;
pub mod graph;
pub mod propagate;
pub mod scheduler;
pub mod services;

pub use config::Config;
pub use error::{GraphError, NodeError, ServiceError};
pub use executor::{NodeExecutor, NodeOutcome};
pub use generate::{generate_graph, heuristic_flow};
pub use graph::{
    Edge, FlowDefinition, GraphStore, Node, NodeCommand, NodeData, NodeKind, NodeStatus,
    NodeUpdate, Position,
};
pub use propagate::{propagate, NodeInputs};
pub use scheduler::{FlowScheduler, RunEvent, RunReport};
pub use services::{FlowGenerator, HttpServiceClient, ServiceResponse, WebIntelligence};
