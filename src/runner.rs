//! Runner (C4): a bounded worker pool that drives one phase's [`Run`] to
//! completion.
//!
//! Builds a fresh `tokio::sync::Semaphore` on every spawn rather than
//! reusing one across invocations: each phase creates a fresh pool, and
//! pools are never reused across phases.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::errors::SchedulerError;
use crate::graph::Graph;
use crate::observability::{PhaseSummary, SortedOrder};
use crate::outcome::Outcome;
use crate::task::{NodeOperation, Run};

/// Bounded worker pool. `parallelism` caps how many node operations may be
/// running concurrently in a phase; it does not cap how many node
/// computations may be in-flight awaiting their predecessors.
pub struct Runner {
    parallelism: usize,
}

impl Runner {
    /// `parallelism` of `0` is treated as `1`, the documented default,
    /// since a pool with zero workers can never invoke an operation.
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
        }
    }

    /// Builds and spawns one phase's computations over `graph`, returning a
    /// handle the caller can cancel and must join.
    pub fn spawn<P, T>(
        &self,
        graph: Arc<Graph<P>>,
        op: Arc<dyn NodeOperation<P, T>>,
        phase: &'static str,
    ) -> RunHandle<T>
    where
        P: Clone + Send + Sync + 'static,
        T: Clone + Send + Sync + 'static,
    {
        tracing::info!("{}", SortedOrder { phase, order: graph.order() });
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let run = Arc::new(Run::spawn(graph, op, semaphore, phase));
        RunHandle { run, phase }
    }
}

/// A running (or completed) phase. `join` blocks with no internal timeout —
/// callers wrap their own timeout if they want one.
pub struct RunHandle<T> {
    run: Arc<Run<T>>,
    phase: &'static str,
}

impl<T: Clone + Send + Sync + 'static> RunHandle<T> {
    /// Sets the run's cancellation flag. Safe to call concurrently with
    /// `join` or from any thread.
    pub fn cancel(&self) {
        self.run.cancel();
    }

    /// Awaits every end node and returns the flattened outcome vector.
    /// `Err` is reserved for the structural `MissingResult` case — a
    /// per-node failure is represented inside the returned vector, not as
    /// an `Err` here.
    pub async fn join(&self) -> Result<Vec<Outcome<T>>, SchedulerError> {
        let outcomes = self.run.join().await?;
        let failure_count = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::info!(
            "{}",
            PhaseSummary {
                phase: self.phase,
                success_count: outcomes.len() - failure_count,
                failure_count,
            }
        );
        Ok(outcomes)
    }
}

/// Convenience used by integration tests and `RunOrchestrator`: spawn and
/// immediately join a phase, one call.
pub async fn run_to_completion<P, T>(
    runner: &Runner,
    graph: Arc<Graph<P>>,
    op: Arc<dyn NodeOperation<P, T>>,
    phase: &'static str,
) -> Result<Vec<Outcome<T>>, SchedulerError>
where
    P: Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    runner.spawn(graph, op, phase).join().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Edge;
    use crate::node::{Node, NodeKind, Output, ResultId};
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl NodeOperation<(), i32> for Echo {
        async fn call(&self, node: &Node<()>, inputs: Vec<Output<i32>>) -> anyhow::Result<Vec<Output<i32>>> {
            match &node.kind {
                NodeKind::Init(ids) => Ok(ids.iter().map(|r| Output::new(r.clone(), 0)).collect()),
                NodeKind::User(_) => {
                    let total: i32 = inputs.iter().map(|o| o.value).sum();
                    Ok(vec![Output::new(ResultId::new("r"), total + 1)])
                }
            }
        }
    }

    #[tokio::test]
    async fn linear_chain_produces_final_value() {
        let nodes = vec![Node::user("a", ()), Node::user("b", ()), Node::user("c", ())];
        let edges = vec![Edge::new("a", "b", "r"), Edge::new("b", "c", "r")];
        let graph = Arc::new(Graph::build(nodes, edges).unwrap());
        let runner = Runner::new(2);
        let outcomes = run_to_completion(&runner, graph, Arc::new(Echo), "exec").await.unwrap();
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            Outcome::Success(results) => assert_eq!(results[0].value, 3),
            Outcome::Failure(e) => panic!("expected success, got {e}"),
        }
    }

    #[tokio::test]
    async fn parallelism_of_zero_is_treated_as_one() {
        let runner = Runner::new(0);
        let nodes = vec![Node::user("a", ())];
        let graph = Arc::new(Graph::build(nodes, vec![]).unwrap());
        let outcomes = run_to_completion(&runner, graph, Arc::new(Echo), "exec").await.unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
    }
}
