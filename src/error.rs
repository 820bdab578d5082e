//! Error types for the flow engine
//!
//! Three layers, matching where things can go wrong:
//! - [`GraphError`]: structural problems with the node/edge collections
//! - [`ServiceError`]: transport or status failures talking to a collaborator service
//! - [`NodeError`]: everything that can fail a single node; the executor turns
//!   these into `status = error` on the node instead of propagating them

use thiserror::Error;

use crate::graph::NodeStatus;

/// Errors raised by the graph store.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("edge references unknown node: from={from}, to={to}")]
    InvalidEdge { from: String, to: String },

    #[error("invalid status transition for {node_id}: {from} -> {to}")]
    InvalidTransition {
        node_id: String,
        from: NodeStatus,
        to: NodeStatus,
    },

    #[error("failed to read or write flow file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid flow definition: {0}")]
    Json(#[from] serde_json::Error),
}

/// Typed errors for collaborator service calls.
///
/// A non-success response surfaces its body verbatim, so the failing node shows
/// exactly what the service said.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("{body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl ServiceError {
    /// HTTP status of the failed call, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout
        } else if e.is_connect() {
            ServiceError::Connection(e.to_string())
        } else if e.is_decode() {
            ServiceError::Parse(e.to_string())
        } else {
            ServiceError::Network(e.to_string())
        }
    }
}

/// Failure of one node's execution.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("{node_id}: missing required input '{field}'")]
    MissingInput { node_id: String, field: &'static str },

    #[error(transparent)]
    UpstreamCallFailure(#[from] ServiceError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}
