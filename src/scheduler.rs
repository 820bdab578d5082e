//! Flow Scheduler
//!
//! Drives a whole graph to completion in dependency order.
//!
//! Each node carries a counter of distinct parents still outstanding. Roots
//! start in the queue; when a node finishes, completed or failed, every child's
//! counter drops by one and a child whose counter reaches zero is queued. Nodes
//! run one at a time, so sibling branches never overlap.
//!
//! A node whose counter never reaches zero (it sits on or behind a cycle) is
//! not executed. It is reported in [`RunReport::skipped`].

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::executor::NodeExecutor;
use crate::graph::{GraphStore, NodeKind, NodeStatus};
use crate::propagate::{propagate, NodeInputs};
use crate::services::ServiceResponse;

/// Progress notifications emitted while a run is in flight.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStarted {
        node_count: usize,
    },
    NodeStarted {
        node_id: String,
        kind: NodeKind,
        inputs: NodeInputs,
    },
    NodeFinished {
        node_id: String,
        status: NodeStatus,
        result: Option<String>,
    },
    RunFinished(RunReport),
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Every executed node, in execution order.
    pub order: Vec<String>,
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    /// Nodes never unlocked, in node order.
    pub skipped: Vec<String>,
}

impl RunReport {
    pub fn executed(&self) -> usize {
        self.order.len()
    }
}

pub struct FlowScheduler {
    executor: NodeExecutor,
    events: Option<UnboundedSender<RunEvent>>,
}

impl FlowScheduler {
    pub fn new(executor: NodeExecutor) -> Self {
        Self {
            executor,
            events: None,
        }
    }

    /// Send [`RunEvent`]s to `events` during runs.
    pub fn with_events(mut self, events: UnboundedSender<RunEvent>) -> Self {
        self.events = Some(events);
        self
    }

    fn emit(&self, event: RunEvent) {
        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = events.send(event);
        }
    }

    /// Execute every reachable node of `store` once.
    ///
    /// All nodes are reset to idle first. Holding `&mut GraphStore` for the whole
    /// run keeps a second run from starting on the same graph.
    pub async fn run(&self, store: &mut GraphStore) -> RunReport {
        store.reset_runtime();
        info!(nodes = store.len(), edges = store.edges().len(), "Flow run started");
        self.emit(RunEvent::RunStarted {
            node_count: store.len(),
        });

        let mut pending: HashMap<String, usize> = store
            .nodes()
            .iter()
            .map(|n| (n.id.clone(), store.parents_of(&n.id).len()))
            .collect();
        let mut queue: VecDeque<String> = store.roots().iter().map(|n| n.id.clone()).collect();
        let mut visited: HashSet<String> = HashSet::new();
        let mut results: HashMap<String, Option<ServiceResponse>> = HashMap::new();
        let mut report = RunReport::default();

        while let Some(node_id) = queue.pop_front() {
            if !visited.insert(node_id.clone()) {
                continue;
            }

            let parent_ids: Vec<String> = store
                .parents_of(&node_id)
                .iter()
                .map(|p| p.id.clone())
                .collect();
            let inputs = propagate(
                parent_ids
                    .iter()
                    .map(|id| results.get(id).and_then(Option::as_ref)),
            );

            let Some(kind) = store.node(&node_id).map(|n| n.kind) else {
                continue;
            };
            self.emit(RunEvent::NodeStarted {
                node_id: node_id.clone(),
                kind,
                inputs: inputs.clone(),
            });

            let response = self.executor.execute(store, &node_id, &inputs).await;

            let (status, result) = store
                .node(&node_id)
                .map(|n| (n.data.status, n.data.result.clone()))
                .unwrap_or((NodeStatus::Error, None));
            match status {
                NodeStatus::Completed => report.completed.push(node_id.clone()),
                _ => report.failed.push(node_id.clone()),
            }
            report.order.push(node_id.clone());
            self.emit(RunEvent::NodeFinished {
                node_id: node_id.clone(),
                status,
                result,
            });

            results.insert(node_id.clone(), response);

            let children: Vec<String> = store
                .children_of(&node_id)
                .iter()
                .map(|c| c.id.clone())
                .collect();
            for child in children {
                if let Some(count) = pending.get_mut(&child) {
                    *count = count.saturating_sub(1);
                    if *count == 0 && !visited.contains(&child) {
                        queue.push_back(child);
                    }
                }
            }
        }

        report.skipped = store
            .nodes()
            .iter()
            .filter(|n| !visited.contains(&n.id))
            .map(|n| n.id.clone())
            .collect();
        if !report.skipped.is_empty() {
            warn!(skipped = ?report.skipped, "Nodes never became ready (cycle or unreachable)");
        }

        info!(
            executed = report.executed(),
            completed = report.completed.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "Flow run finished"
        );
        self.emit(RunEvent::RunFinished(report.clone()));
        report
    }
}
