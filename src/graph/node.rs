//! Node Model
//!
//! A node is one configured operation in the flow (search, crawl, extract, map
//! or qa). Identity and kind are fixed at creation; the editable inputs, the
//! runtime status and the displayed result change in place.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The operation a node performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Search,
    Crawl,
    Extract,
    Map,
    Qa,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Search => "search",
            NodeKind::Crawl => "crawl",
            NodeKind::Extract => "extract",
            NodeKind::Map => "map",
            NodeKind::Qa => "qa",
        }
    }

    /// Label given to freshly created nodes.
    pub fn default_label(&self) -> String {
        format!("{} node", self.as_str())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime status of a node within one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Error,
}

impl NodeStatus {
    /// Statuses only move forward: idle -> running -> {completed, error}.
    pub fn can_transition_to(&self, next: NodeStatus) -> bool {
        matches!(
            (self, next),
            (NodeStatus::Idle, NodeStatus::Running)
                | (NodeStatus::Running, NodeStatus::Completed)
                | (NodeStatus::Running, NodeStatus::Error)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Completed | NodeStatus::Error)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Idle => "idle",
            NodeStatus::Running => "running",
            NodeStatus::Completed => "completed",
            NodeStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Canvas coordinate. Carried through untouched; no layout happens here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Mutable payload of a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub status: NodeStatus,

    /// Human-readable outcome: the answer text on success, the error message on failure.
    #[serde(default)]
    pub result: Option<String>,

    /// Free text for search and extract nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Target for crawl, extract and map nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// One unit of work in the flow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    /// Create an idle node of the given kind with a fresh id.
    pub fn create(kind: NodeKind, position: Position) -> Self {
        Self::with_id(format!("node_{}", Uuid::new_v4()), kind, position)
    }

    /// Create an idle node with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, kind: NodeKind, position: Position) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            data: NodeData {
                label: kind.default_label(),
                ..NodeData::default()
            },
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.data.query = Some(query.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.data.url = Some(url.into());
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.data.question = Some(question.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.data.context = Some(context.into());
        self
    }

    /// Apply a partial update. Status and result are not editable this way.
    pub fn apply(&mut self, update: NodeUpdate) {
        let NodeUpdate {
            label,
            query,
            url,
            question,
            context,
        } = update;

        if let Some(label) = label {
            self.data.label = label;
        }
        if let Some(query) = query {
            self.data.query = Some(query);
        }
        if let Some(url) = url {
            self.data.url = Some(url);
        }
        if let Some(question) = question {
            self.data.question = Some(question);
        }
        if let Some(context) = context {
            self.data.context = Some(context);
        }
    }

    /// Drop any runtime state left over from a previous run.
    pub(crate) fn reset_runtime(&mut self) {
        self.data.status = NodeStatus::Idle;
        self.data.result = None;
    }
}

/// Partial update of a node's editable fields; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub query: Option<String>,
    pub url: Option<String>,
    pub question: Option<String>,
    pub context: Option<String>,
}

/// Edit messages dispatched to the graph store by whoever owns the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeCommand {
    SetLabel { node_id: String, value: String },
    SetQuery { node_id: String, value: String },
    SetUrl { node_id: String, value: String },
    SetQuestion { node_id: String, value: String },
    SetContext { node_id: String, value: String },
}

impl NodeCommand {
    pub fn node_id(&self) -> &str {
        match self {
            NodeCommand::SetLabel { node_id, .. }
            | NodeCommand::SetQuery { node_id, .. }
            | NodeCommand::SetUrl { node_id, .. }
            | NodeCommand::SetQuestion { node_id, .. }
            | NodeCommand::SetContext { node_id, .. } => node_id,
        }
    }

    pub fn into_update(self) -> (String, NodeUpdate) {
        match self {
            NodeCommand::SetLabel { node_id, value } => (
                node_id,
                NodeUpdate {
                    label: Some(value),
                    ..Default::default()
                },
            ),
            NodeCommand::SetQuery { node_id, value } => (
                node_id,
                NodeUpdate {
                    query: Some(value),
                    ..Default::default()
                },
            ),
            NodeCommand::SetUrl { node_id, value } => (
                node_id,
                NodeUpdate {
                    url: Some(value),
                    ..Default::default()
                },
            ),
            NodeCommand::SetQuestion { node_id, value } => (
                node_id,
                NodeUpdate {
                    question: Some(value),
                    ..Default::default()
                },
            ),
            NodeCommand::SetContext { node_id, value } => (
                node_id,
                NodeUpdate {
                    context: Some(value),
                    ..Default::default()
                },
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sets_idle_defaults() {
        let node = Node::create(NodeKind::Map, Position::new(10.0, 20.0));

        assert!(node.id.starts_with("node_"));
        assert_eq!(node.data.label, "map node");
        assert_eq!(node.data.status, NodeStatus::Idle);
        assert!(node.data.result.is_none());
        assert_eq!(node.position, Position::new(10.0, 20.0));
    }

    #[test]
    fn test_create_ids_are_unique() {
        let a = Node::create(NodeKind::Search, Position::default());
        let b = Node::create(NodeKind::Search, Position::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_apply_merges_only_given_fields() {
        let mut node = Node::with_id("n1", NodeKind::Extract, Position::default())
            .with_query("pricing")
            .with_url("https://example.com");

        node.apply(NodeUpdate {
            url: Some("https://example.org".to_string()),
            ..Default::default()
        });

        assert_eq!(node.data.url.as_deref(), Some("https://example.org"));
        assert_eq!(node.data.query.as_deref(), Some("pricing"));
        assert_eq!(node.data.label, "extract node");
    }

    #[test]
    fn test_status_transitions_only_move_forward() {
        use NodeStatus::*;

        assert!(Idle.can_transition_to(Running));
        assert!(Running.can_transition_to(Completed));
        assert!(Running.can_transition_to(Error));

        assert!(!Idle.can_transition_to(Completed));
        assert!(!Running.can_transition_to(Running));
        assert!(!Completed.can_transition_to(Running));
        assert!(!Error.can_transition_to(Idle));
    }

    #[test]
    fn test_command_into_update() {
        let command = NodeCommand::SetQuestion {
            node_id: "qa_1".to_string(),
            value: "Why?".to_string(),
        };
        assert_eq!(command.node_id(), "qa_1");

        let (id, update) = command.into_update();
        assert_eq!(id, "qa_1");
        assert_eq!(update.question.as_deref(), Some("Why?"));
        assert!(update.query.is_none());
    }

    #[test]
    fn test_node_json_shape() {
        let json = serde_json::json!({
            "id": "node_1",
            "type": "qa",
            "position": {"x": 100, "y": 50},
            "data": {"question": "What changed?"}
        });

        let node: Node = serde_json::from_value(json).unwrap();
        assert_eq!(node.kind, NodeKind::Qa);
        assert_eq!(node.position.x, 100.0);
        assert_eq!(node.data.question.as_deref(), Some("What changed?"));
        assert_eq!(node.data.status, NodeStatus::Idle);
    }
}
