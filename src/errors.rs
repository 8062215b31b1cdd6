//! The scheduler's error taxonomy.
//!
//! Construction-time errors (`CycleDetected`, `DuplicateEdge`) abort
//! `Graph::build` synchronously. Phase-scoped errors are either folded into
//! a node's [`crate::outcome::Outcome::Failure`] (`OperationFailed`,
//! `PredecessorFailed`, `Cancelled`) or, for `MissingResult` alone, propagated
//! out of the whole run, since it signals a mismatch between what an
//! operation promised to produce and what it actually produced.

use std::sync::Arc;

use crate::node::{NodeId, ResultId};

#[derive(Debug, Clone, thiserror::Error)]
pub enum SchedulerError {
    #[error("cycle detected among nodes: {0:?}")]
    CycleDetected(Vec<NodeId>),

    #[error("duplicate edge {from} -> {to} (result '{result_id}')")]
    DuplicateEdge {
        from: NodeId,
        to: NodeId,
        result_id: ResultId,
    },

    #[error("node id '{node}' is used by more than one node in the graph")]
    DuplicateNodeId { node: NodeId },

    #[error("edge {from} -> {to} references unknown node '{missing}'")]
    UnknownNode {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },

    #[error("node '{producer}' did not produce a result for '{result_id}'")]
    MissingResult {
        producer: NodeId,
        result_id: ResultId,
    },

    #[error("operation failed for node '{node}': {cause}")]
    OperationFailed {
        node: NodeId,
        #[source]
        cause: Arc<anyhow::Error>,
    },

    #[error("node '{node}' skipped: predecessor '{}' failed", .root.failed_node())]
    PredecessorFailed {
        node: NodeId,
        root: Arc<SchedulerError>,
    },

    #[error("node '{0}' cancelled")]
    Cancelled(NodeId),
}

impl SchedulerError {
    /// The node id this error is ultimately "about" — the node whose
    /// operation actually failed or was cancelled, walking through any
    /// chain of `PredecessorFailed` wrappers.
    pub fn failed_node(&self) -> &NodeId {
        match self {
            SchedulerError::CycleDetected(_) => unreachable!("construction-time error has no single node"),
            SchedulerError::DuplicateEdge { .. } => unreachable!("construction-time error has no single node"),
            SchedulerError::DuplicateNodeId { .. } => unreachable!("construction-time error has no single node"),
            SchedulerError::UnknownNode { .. } => unreachable!("construction-time error has no single node"),
            SchedulerError::MissingResult { producer, .. } => producer,
            SchedulerError::OperationFailed { node, .. } => node,
            SchedulerError::PredecessorFailed { root, .. } => root.failed_node(),
            SchedulerError::Cancelled(node) => node,
        }
    }
}
