//! Flow graph: node model and the store that owns nodes and edges.

pub mod node;
pub mod store;

pub use node::{Node, NodeCommand, NodeData, NodeKind, NodeStatus, NodeUpdate, Position};
pub use store::{Edge, FlowDefinition, GraphStore};
