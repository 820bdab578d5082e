//! Graph Store
//!
//! Holds nodes and edges in insertion order and answers structural queries.
//! Adjacency is recomputed from the edge list on every query.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GraphError;
use crate::graph::node::{Node, NodeCommand, NodeKind, NodeStatus, NodeUpdate, Position};

/// Directed dependency: `source`'s output feeds `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: None,
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Serialized flow: what the generation service returns and what flow files contain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowDefinition {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowDefinition {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), GraphError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Mutable collection of nodes and edges.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from an externally produced definition.
    ///
    /// Every node is normalized before it is accepted: runtime state is cleared
    /// and missing labels are filled in, since the producer knows nothing about
    /// how this engine tracks execution. Edges are validated like [`add_edge`].
    ///
    /// [`add_edge`]: GraphStore::add_edge
    pub fn from_definition(definition: FlowDefinition) -> Result<Self, GraphError> {
        let mut store = Self::new();

        for mut node in definition.nodes {
            node.reset_runtime();
            if node.data.label.trim().is_empty() {
                node.data.label = node.kind.default_label();
            }
            store.add_node(node)?;
        }

        for edge in definition.edges {
            store.add_edge(edge)?;
        }

        debug!(
            nodes = store.nodes.len(),
            edges = store.edges.len(),
            "Graph loaded from definition"
        );
        Ok(store)
    }

    pub fn to_definition(&self) -> FlowDefinition {
        FlowDefinition {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Create an idle node of `kind` and add it; returns the new id.
    pub fn create_node(&mut self, kind: NodeKind, position: Position) -> String {
        let node = Node::create(kind, position);
        let id = node.id.clone();
        self.nodes.push(node);
        id
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Add an edge. Both endpoints must already exist.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if !self.contains(&edge.source) || !self.contains(&edge.target) {
            return Err(GraphError::InvalidEdge {
                from: edge.source,
                to: edge.target,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    pub fn connect(
        &mut self,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<(), GraphError> {
        self.add_edge(Edge::new(source, target))
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == node_id)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == node_id)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Merge `update` into the node's data. Returns `false` if the node does not exist.
    pub fn update(&mut self, node_id: &str, update: NodeUpdate) -> bool {
        match self.node_mut(node_id) {
            Some(node) => {
                node.apply(update);
                true
            }
            None => false,
        }
    }

    pub fn dispatch(&mut self, command: NodeCommand) -> bool {
        let (node_id, update) = command.into_update();
        self.update(&node_id, update)
    }

    /// Nodes with an edge into `node_id`, in edge insertion order, each once.
    pub fn parents_of(&self, node_id: &str) -> Vec<&Node> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter(|e| e.target == node_id)
            .filter(|e| seen.insert(e.source.as_str()))
            .filter_map(|e| self.node(&e.source))
            .collect()
    }

    /// Nodes with an edge out of `node_id`, in edge insertion order, each once.
    pub fn children_of(&self, node_id: &str) -> Vec<&Node> {
        let mut seen = HashSet::new();
        self.edges
            .iter()
            .filter(|e| e.source == node_id)
            .filter(|e| seen.insert(e.target.as_str()))
            .filter_map(|e| self.node(&e.target))
            .collect()
    }

    /// Nodes without parents, in node insertion order.
    pub fn roots(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.target == n.id))
            .collect()
    }

    /// Move a node to `to`, replacing its displayed result.
    pub fn transition(
        &mut self,
        node_id: &str,
        to: NodeStatus,
        result: Option<String>,
    ) -> Result<(), GraphError> {
        let node = self
            .node_mut(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;

        let from = node.data.status;
        if !from.can_transition_to(to) {
            return Err(GraphError::InvalidTransition {
                node_id: node_id.to_string(),
                from,
                to,
            });
        }

        node.data.status = to;
        node.data.result = result;
        Ok(())
    }

    /// Put every node back to idle before a new run.
    pub fn reset_runtime(&mut self) {
        for node in &mut self.nodes {
            node.reset_runtime();
        }
    }
}
