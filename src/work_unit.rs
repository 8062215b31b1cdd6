//! Work-unit descriptors consumed by the run orchestrator (C5): one
//! `process`-shaped method generalized to the three lifecycle phases a
//! run orchestrator needs.

use async_trait::async_trait;

use crate::node::{NodeId, Output, ResultId};

/// One of the three independent phases a [`crate::orchestrator::RunOrchestrator`]
/// can run over the same topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Prepare,
    Init,
    Exec,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Prepare => "prepare",
            Phase::Init => "init",
            Phase::Exec => "exec",
        }
    }
}

/// A unit of work: a stable id, its declared inputs/outputs, and the three
/// phase operations. `input_ids`/`output_ids` form the edge set the
/// orchestrator builds; declared outputs must be locally unique across
/// units in a [`crate::registry::WorkUnitSet`].
#[async_trait]
pub trait WorkUnit<T>: Send + Sync {
    fn id(&self) -> &NodeId;
    fn input_ids(&self) -> &[ResultId];
    fn output_ids(&self) -> &[ResultId];

    async fn prepare(&self, inputs: Vec<Output<T>>) -> anyhow::Result<Vec<Output<T>>>;
    async fn init(&self, inputs: Vec<Output<T>>) -> anyhow::Result<Vec<Output<T>>>;
    async fn exec(&self, inputs: Vec<Output<T>>) -> anyhow::Result<Vec<Output<T>>>;

    /// Dispatch helper so callers (and [`crate::orchestrator`]) don't need
    /// a match arm per phase at every call site.
    async fn run_phase(&self, phase: Phase, inputs: Vec<Output<T>>) -> anyhow::Result<Vec<Output<T>>> {
        match phase {
            Phase::Prepare => self.prepare(inputs).await,
            Phase::Init => self.init(inputs).await,
            Phase::Exec => self.exec(inputs).await,
        }
    }
}
