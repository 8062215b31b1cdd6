//! Task Graph Builder (C3): turns a sorted [`Graph`] into a lazy, memoized,
//! concurrent computation per node.
//!
//! Eager `tokio::spawn` plus `futures::future::Shared`: each node's task
//! starts running the moment its dependencies are spawned (true sibling
//! parallelism, no notification plumbing to maintain), and `Shared` gives
//! every consumer of a fan-out node the same memoized result without
//! re-invoking its operation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::errors::SchedulerError;
use crate::graph::Graph;
use crate::lookup::{self, Resolved};
use crate::node::{Node, Output};
use crate::observability::{CancellationRequested, NodeFailed, NodeSkippedCancelled, NodeSkippedPredecessorFailed};
use crate::outcome::Outcome;

/// The node operation callback consumed by C3.
///
/// Implementations dispatch on `node.kind`: the synthetic `Init` node
/// receives no predecessor results and must return one placeholder per
/// declared result id; a user node receives its predecessor results in
/// incoming-edge declaration order.
#[async_trait]
pub trait NodeOperation<P, T>: Send + Sync {
    async fn call(&self, node: &Node<P>, inputs: Vec<Output<T>>) -> anyhow::Result<Vec<Output<T>>>;
}

type NodeResult<T> = Result<Outcome<T>, SchedulerError>;
type SharedNodeFuture<T> = Shared<BoxFuture<'static, NodeResult<T>>>;

/// One phase's worth of lazy per-node computations over an immutable
/// [`Graph`]. Created fresh per phase; discarded when the phase completes
/// or is cancelled.
pub struct Run<T> {
    cancel: CancellationToken,
    handles: HashMap<crate::node::NodeId, SharedNodeFuture<T>>,
    end_ids: Vec<crate::node::NodeId>,
    phase: &'static str,
}

impl<T> Run<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Builds the per-node computations for every node in `graph`, in
    /// topological order, and eagerly spawns each as its own task.
    pub fn spawn<P>(
        graph: Arc<Graph<P>>,
        op: Arc<dyn NodeOperation<P, T>>,
        semaphore: Arc<Semaphore>,
        phase: &'static str,
    ) -> Self
    where
        P: Clone + Send + Sync + 'static,
    {
        let cancel = CancellationToken::new();
        let mut handles: HashMap<crate::node::NodeId, SharedNodeFuture<T>> = HashMap::with_capacity(graph.len());

        for id in graph.order() {
            let node = graph
                .node(id)
                .cloned()
                .expect("graph order only contains ids present in the graph");
            let edges = graph.incoming(id).to_vec();
            let producer_futures: Vec<(crate::graph::Edge, SharedNodeFuture<T>)> = edges
                .into_iter()
                .map(|edge| {
                    let producer = handles
                        .get(&edge.from)
                        .cloned()
                        .expect("topological order guarantees a producer's future exists first");
                    (edge, producer)
                })
                .collect();

            let op = op.clone();
            let cancel_for_node = cancel.clone();
            let semaphore = semaphore.clone();
            let node_id = node.id.clone();
            let node_id_for_panic = node.id.clone();

            let body: BoxFuture<'static, NodeResult<T>> = async move {
                let producer_outcomes =
                    futures::future::join_all(producer_futures.iter().map(|(_, f)| f.clone())).await;

                let mut inputs = Vec::with_capacity(producer_outcomes.len());
                let mut first_failure: Option<SchedulerError> = None;
                for ((edge, _), outcome) in producer_futures.iter().zip(producer_outcomes.into_iter()) {
                    let outcome = outcome?;
                    match lookup::resolve(&outcome, edge)? {
                        Resolved::Ready(output) => inputs.push(output),
                        Resolved::ProducerFailed(e) => {
                            if first_failure.is_none() {
                                first_failure = Some(e);
                            }
                        }
                    }
                }

                if cancel_for_node.is_cancelled() {
                    tracing::warn!("{}", NodeSkippedCancelled { node: &node_id });
                    return Ok(Outcome::Failure(SchedulerError::Cancelled(node_id)));
                }

                if let Some(first) = first_failure {
                    let err = SchedulerError::PredecessorFailed {
                        node: node_id.clone(),
                        root: Arc::new(first),
                    };
                    tracing::warn!("{}", NodeSkippedPredecessorFailed { node: &node_id, cause: &err });
                    return Ok(Outcome::Failure(err));
                }

                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed during a run");

                match op.call(&node, inputs).await {
                    Ok(results) => Ok(Outcome::Success(results)),
                    Err(cause) => {
                        let err = SchedulerError::OperationFailed {
                            node: node_id.clone(),
                            cause: Arc::new(cause),
                        };
                        tracing::error!("{}", NodeFailed { node: &node_id, cause: &err });
                        Ok(Outcome::Failure(err))
                    }
                }
            }
            .boxed();

            let join_handle = tokio::spawn(body);
            let shared: SharedNodeFuture<T> = async move {
                match join_handle.await {
                    Ok(result) => result,
                    Err(join_err) => Ok(Outcome::Failure(SchedulerError::OperationFailed {
                        node: node_id_for_panic,
                        cause: Arc::new(anyhow::anyhow!("node task panicked: {join_err}")),
                    })),
                }
            }
            .boxed()
            .shared();

            handles.insert(id.clone(), shared);
        }

        Run {
            cancel,
            handles,
            end_ids: graph.end_ids().to_vec(),
            phase,
        }
    }

    /// Sets the run's cancellation flag. Nodes already past their fan-in
    /// barrier (mid-`op`) are not interrupted; only nodes that have not yet
    /// resolved all predecessors will observe it.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!("{}", CancellationRequested { phase: self.phase });
        }
        self.cancel.cancel();
    }

    /// Awaits every end node in parallel and flattens the result into the
    /// per-result outcome sequence, ordered by end-node declaration order.
    pub async fn join(&self) -> Result<Vec<Outcome<T>>, SchedulerError> {
        let end_futures: Vec<_> = self
            .end_ids
            .iter()
            .map(|id| self.handles.get(id).cloned().expect("end id is always a known node"))
            .collect();

        let outcomes = futures::future::join_all(end_futures).await;
        let mut flattened = Vec::new();
        for outcome in outcomes {
            flattened.extend(outcome?.flatten());
        }
        Ok(flattened)
    }
}
