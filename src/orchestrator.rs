//! Run Orchestrator (C5): the thin driver callers use directly. Accepts a
//! set of work units, computes their edge set, builds the [`Graph`] once
//! via C1, and exposes `prepare`/`init`/`exec` as independent phase runs
//! over that same topology.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::SchedulerError;
use crate::graph::{Edge, Graph};
use crate::node::{Node, NodeId, Output, ResultId};
use crate::outcome::Outcome;
use crate::registry::{RegistryError, WorkUnitSet};
use crate::runner::Runner;
use crate::task::NodeOperation;
use crate::work_unit::{Phase, WorkUnit};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Graph(#[from] SchedulerError),
}

type UnitNode<T> = Arc<dyn WorkUnit<T>>;

/// Drives `prepare`/`init`/`exec` phases for a fixed set of work units.
///
/// `partition_values` seeds the synthetic `Init` node: any declared input
/// with no producing unit is satisfied from this map if present, or from
/// `T::default()` otherwise — the partition key/value pairs available to
/// every entry point of a run.
pub struct RunOrchestrator<T> {
    units: WorkUnitSet<T>,
    graph: Arc<Graph<UnitNode<T>>>,
    run_id: String,
    partition_values: HashMap<ResultId, T>,
    parallelism: usize,
}

impl<T> RunOrchestrator<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    pub fn new(
        units: Vec<Arc<dyn WorkUnit<T>>>,
        run_id: impl Into<String>,
        partition_values: HashMap<ResultId, T>,
        parallelism: usize,
    ) -> Result<Self, OrchestratorError> {
        let units = WorkUnitSet::new(units)?;
        let edges = Self::build_edges(&units);
        let nodes = Self::build_nodes(&units, &edges);
        let graph = Graph::build(nodes, edges)?;
        Ok(Self {
            units,
            graph: Arc::new(graph),
            run_id: run_id.into(),
            partition_values,
            parallelism,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Read-only textual rendering of the built graph, for logging.
    pub fn render(&self) -> String {
        self.graph.render()
    }

    fn build_edges(units: &WorkUnitSet<T>) -> Vec<Edge> {
        let mut edges = Vec::new();
        for unit in units.ordered() {
            for input_id in unit.input_ids() {
                let from = units
                    .producer_of(input_id)
                    .cloned()
                    .unwrap_or_else(NodeId::init);
                edges.push(Edge::new(from, unit.id().clone(), input_id.clone()));
            }
        }
        edges
    }

    fn build_nodes(units: &WorkUnitSet<T>, edges: &[Edge]) -> Vec<Node<UnitNode<T>>> {
        let mut nodes = Vec::with_capacity(units.len() + 1);
        let init_id = NodeId::init();
        let mut init_result_ids = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for edge in edges {
            if edge.from == init_id && seen.insert(edge.result_id.clone()) {
                init_result_ids.push(edge.result_id.clone());
            }
        }
        if !init_result_ids.is_empty() {
            nodes.push(Node::init(init_result_ids));
        }
        for unit in units.ordered() {
            nodes.push(Node::user(unit.id().clone(), unit.clone()));
        }
        nodes
    }

    async fn run_phase(&self, phase: Phase) -> Result<Vec<Outcome<T>>, SchedulerError> {
        let runner = Runner::new(self.parallelism);
        let op: Arc<dyn NodeOperation<UnitNode<T>, T>> = Arc::new(PhaseOperation {
            phase,
            partition_values: self.partition_values.clone(),
        });
        runner.spawn(self.graph.clone(), op, phase.name()).join().await
    }

    pub async fn prepare(&self) -> Result<Vec<Outcome<T>>, SchedulerError> {
        self.run_phase(Phase::Prepare).await
    }

    pub async fn init(&self) -> Result<Vec<Outcome<T>>, SchedulerError> {
        self.run_phase(Phase::Init).await
    }

    pub async fn exec(&self) -> Result<Vec<Outcome<T>>, SchedulerError> {
        self.run_phase(Phase::Exec).await
    }
}

/// The node-operation callback C3 invokes, generalized over one of the
/// three phases. Dispatches `Init` to placeholder synthesis and `User` to
/// the wrapped work unit's matching lifecycle method.
struct PhaseOperation<T> {
    phase: Phase,
    partition_values: HashMap<ResultId, T>,
}

#[async_trait]
impl<T> NodeOperation<UnitNode<T>, T> for PhaseOperation<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    async fn call(&self, node: &Node<UnitNode<T>>, inputs: Vec<Output<T>>) -> anyhow::Result<Vec<Output<T>>> {
        match &node.kind {
            crate::node::NodeKind::Init(result_ids) => Ok(result_ids
                .iter()
                .map(|id| {
                    let value = self.partition_values.get(id).cloned().unwrap_or_default();
                    Output::new(id.clone(), value)
                })
                .collect()),
            crate::node::NodeKind::User(unit) => unit.run_phase(self.phase, inputs).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Add1 {
        id: NodeId,
        inputs: Vec<ResultId>,
        outputs: Vec<ResultId>,
    }

    #[async_trait]
    impl WorkUnit<i32> for Add1 {
        fn id(&self) -> &NodeId {
            &self.id
        }
        fn input_ids(&self) -> &[ResultId] {
            &self.inputs
        }
        fn output_ids(&self) -> &[ResultId] {
            &self.outputs
        }
        async fn prepare(&self, inputs: Vec<Output<i32>>) -> anyhow::Result<Vec<Output<i32>>> {
            self.exec(inputs).await
        }
        async fn init(&self, inputs: Vec<Output<i32>>) -> anyhow::Result<Vec<Output<i32>>> {
            self.exec(inputs).await
        }
        async fn exec(&self, inputs: Vec<Output<i32>>) -> anyhow::Result<Vec<Output<i32>>> {
            let sum: i32 = inputs.iter().map(|o| o.value).sum();
            Ok(self.outputs.iter().map(|id| Output::new(id.clone(), sum + 1)).collect())
        }
    }

    fn unit(id: &str, inputs: &[&str], outputs: &[&str]) -> Arc<dyn WorkUnit<i32>> {
        Arc::new(Add1 {
            id: NodeId::new(id),
            inputs: inputs.iter().map(|s| ResultId::new(*s)).collect(),
            outputs: outputs.iter().map(|s| ResultId::new(*s)).collect(),
        })
    }

    #[tokio::test]
    async fn dangling_input_is_sourced_from_init() {
        let units = vec![unit("a", &["seed"], &["out"])];
        let mut seeds = HashMap::new();
        seeds.insert(ResultId::new("seed"), 10);
        let orchestrator = RunOrchestrator::new(units, "run-1", seeds, 2).unwrap();
        let outcomes = orchestrator.exec().await.unwrap();
        assert_eq!(outcomes.len(), 1);
        match &outcomes[0] {
            Outcome::Success(results) => assert_eq!(results[0].value, 11),
            Outcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[tokio::test]
    async fn phases_are_independent_runs() {
        let units = vec![unit("a", &[], &["out"])];
        let orchestrator = RunOrchestrator::new(units, "run-2", HashMap::new(), 1).unwrap();
        let prepare_outcomes = orchestrator.prepare().await.unwrap();
        let exec_outcomes = orchestrator.exec().await.unwrap();
        assert_eq!(prepare_outcomes.len(), exec_outcomes.len());
    }

    #[tokio::test]
    async fn duplicate_output_rejected_before_graph_build() {
        let units = vec![unit("a", &[], &["x"]), unit("b", &[], &["x"])];
        let err = RunOrchestrator::new(units, "run-3", HashMap::new(), 1).unwrap_err();
        assert!(matches!(err, OrchestratorError::Registry(RegistryError::DuplicateOutput { .. })));
    }
}
