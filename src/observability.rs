//! Structured log message types for the scheduler's logging surface:
//! sorted-order summary, per-phase result-class summary, cancellation
//! signal, per-node failure with cause, skipped-due-to-predecessor-failure,
//! and skipped-due-to-cancellation.
//!
//! Message structs implementing `Display` keep the log vocabulary in one
//! place instead of scattered format strings, without the extra weight of
//! a `StructuredLog`/OpenTelemetry-span trait — that fits a multi-backend
//! production service, not a scheduler library. Plain `Display` plus
//! `tracing::info!/warn!/error!` is enough to keep the vocabulary stable
//! for test assertions.

use std::fmt::{self, Display, Formatter};

use crate::errors::SchedulerError;
use crate::node::NodeId;

/// Emitted once per phase run, after C1's topological sort, before any
/// node operation is invoked.
pub struct SortedOrder<'a> {
    pub phase: &'a str,
    pub order: &'a [NodeId],
}

impl Display for SortedOrder<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.order.iter().map(|id| id.as_str()).collect();
        write!(
            f,
            "phase '{}' sorted order ({} nodes): {}",
            self.phase,
            self.order.len(),
            ids.join(" -> ")
        )
    }
}

/// Emitted once per phase run, after all end-node outcomes resolve.
pub struct PhaseSummary<'a> {
    pub phase: &'a str,
    pub success_count: usize,
    pub failure_count: usize,
}

impl Display for PhaseSummary<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "phase '{}' complete: {} succeeded, {} failed",
            self.phase, self.success_count, self.failure_count
        )
    }
}

/// Emitted once, the first time a run's cancellation flag is set.
pub struct CancellationRequested<'a> {
    pub phase: &'a str,
}

impl Display for CancellationRequested<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "phase '{}' cancellation requested", self.phase)
    }
}

/// Emitted when a node's operation fails (`OperationFailed`).
pub struct NodeFailed<'a> {
    pub node: &'a NodeId,
    pub cause: &'a SchedulerError,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "node '{}' failed: {}", self.node, self.cause)
    }
}

/// Emitted when a node is skipped because a predecessor failed.
pub struct NodeSkippedPredecessorFailed<'a> {
    pub node: &'a NodeId,
    pub cause: &'a SchedulerError,
}

impl Display for NodeSkippedPredecessorFailed<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "node '{}' skipped: predecessor failure ({})",
            self.node, self.cause
        )
    }
}

/// Emitted when a node is skipped because the run was cancelled.
pub struct NodeSkippedCancelled<'a> {
    pub node: &'a NodeId,
}

impl Display for NodeSkippedCancelled<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "node '{}' skipped: run cancelled", self.node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_order_lists_every_node() {
        let order = vec![NodeId::new("a"), NodeId::new("b")];
        let msg = SortedOrder { phase: "exec", order: &order };
        let rendered = msg.to_string();
        assert!(rendered.contains('a'));
        assert!(rendered.contains('b'));
        assert!(rendered.contains("exec"));
    }

    #[test]
    fn phase_summary_reports_both_counts() {
        let msg = PhaseSummary { phase: "init", success_count: 3, failure_count: 1 };
        let rendered = msg.to_string();
        assert!(rendered.contains('3'));
        assert!(rendered.contains('1'));
    }
}
