//! Result Lookup (C2): resolves an edge's declared `resultId` against a
//! producer's completed outcome.

use crate::errors::SchedulerError;
use crate::graph::Edge;
use crate::node::Output;
use crate::outcome::Outcome;

/// What an edge resolved to once its producer's outcome is known.
pub enum Resolved<T> {
    /// The producer succeeded and the requested result was found.
    Ready(Output<T>),
    /// The producer failed; the failure is passed through unchanged for the
    /// caller (C3) to fold into a `PredecessorFailed`.
    ProducerFailed(SchedulerError),
}

/// Extracts the result named by `edge.result_id` from `producer_outcome`.
///
/// A missing result on an otherwise-successful producer is a programming
/// error (the operation promised an output it didn't return) and is
/// returned as `Err`, not folded into the edge's own `Resolved` value — per
/// spec this aborts the whole run rather than being swallowed as a per-node
/// failure.
pub fn resolve<T: Clone>(
    producer_outcome: &Outcome<T>,
    edge: &Edge,
) -> Result<Resolved<T>, SchedulerError> {
    match producer_outcome {
        Outcome::Failure(e) => Ok(Resolved::ProducerFailed(e.clone())),
        Outcome::Success(results) => results
            .iter()
            .find(|r| r.result_id == edge.result_id)
            .map(|r| Resolved::Ready(r.clone()))
            .ok_or_else(|| SchedulerError::MissingResult {
                producer: edge.from.clone(),
                result_id: edge.result_id.clone(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeId, ResultId};

    fn edge() -> Edge {
        Edge::new("p", "c", "r1")
    }

    #[test]
    fn finds_matching_result() {
        let outcome = Outcome::Success(vec![Output::new(ResultId::new("r1"), 42)]);
        match resolve(&outcome, &edge()).unwrap() {
            Resolved::Ready(out) => assert_eq!(out.value, 42),
            Resolved::ProducerFailed(_) => panic!("expected Ready"),
        }
    }

    #[test]
    fn missing_result_is_structural_error() {
        let outcome: Outcome<i32> = Outcome::Success(vec![Output::new(ResultId::new("other"), 1)]);
        let err = resolve(&outcome, &edge()).unwrap_err();
        match err {
            SchedulerError::MissingResult { producer, result_id } => {
                assert_eq!(producer, NodeId::new("p"));
                assert_eq!(result_id, ResultId::new("r1"));
            }
            other => panic!("expected MissingResult, got {other:?}"),
        }
    }

    #[test]
    fn producer_failure_passes_through() {
        let outcome: Outcome<i32> = Outcome::Failure(SchedulerError::Cancelled(NodeId::new("p")));
        match resolve(&outcome, &edge()).unwrap() {
            Resolved::ProducerFailed(SchedulerError::Cancelled(id)) => {
                assert_eq!(id, NodeId::new("p"))
            }
            Resolved::ProducerFailed(other) => panic!("expected Cancelled, got {other:?}"),
            Resolved::Ready(_) => panic!("expected ProducerFailed"),
        }
    }
}
