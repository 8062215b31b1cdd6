//! In-memory work-unit registry and pre-graph validation — the ambient
//! "configuration" surface this crate carries instead of a file parser.
//! Configuration *file* parsing and instance registration from a file are
//! out of scope; the in-memory registry shape itself is not.
//!
//! A typed `id -> Arc<dyn _>` registry, with uniqueness checks staged
//! before cycle detection ever runs.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::node::{NodeId, ResultId};
use crate::work_unit::WorkUnit;

/// Construction-time problems with a work-unit set, surfaced before C1 ever
/// runs. Distinct from [`crate::errors::SchedulerError`]: these are
/// registry-shape problems (duplicate ids, to local output conflicts), not
/// graph-shape problems.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("work unit id '{0}' is used by more than one unit")]
    DuplicateUnitId(NodeId),

    #[error("work unit id '{0}' collides with the reserved synthetic Init node")]
    ReservedUnitId(NodeId),

    #[error("output '{result_id}' is declared by both '{first}' and '{second}'")]
    DuplicateOutput {
        result_id: ResultId,
        first: NodeId,
        second: NodeId,
    },
}

/// A type-safe registry mapping work-unit ids to their implementations,
/// validated for id and declared-output uniqueness at construction time.
pub struct WorkUnitSet<T> {
    units: HashMap<NodeId, Arc<dyn WorkUnit<T>>>,
    /// order of insertion, preserved for deterministic edge/graph
    /// construction regardless of `HashMap` iteration order.
    order: Vec<NodeId>,
    /// output_id -> producing unit id, built once at construction.
    producers: HashMap<ResultId, NodeId>,
}

impl<T> WorkUnitSet<T> {
    pub fn new(units: Vec<Arc<dyn WorkUnit<T>>>) -> Result<Self, RegistryError> {
        let mut by_id = HashMap::with_capacity(units.len());
        let mut order = Vec::with_capacity(units.len());
        let mut producers: HashMap<ResultId, NodeId> = HashMap::new();

        for unit in units {
            let id = unit.id().clone();
            if id.is_init() {
                return Err(RegistryError::ReservedUnitId(id));
            }
            if by_id.contains_key(&id) {
                return Err(RegistryError::DuplicateUnitId(id));
            }
            for output in unit.output_ids() {
                if let Some(existing) = producers.get(output) {
                    return Err(RegistryError::DuplicateOutput {
                        result_id: output.clone(),
                        first: existing.clone(),
                        second: id.clone(),
                    });
                }
                producers.insert(output.clone(), id.clone());
            }
            order.push(id.clone());
            by_id.insert(id, unit);
        }

        Ok(Self { units: by_id, order, producers })
    }

    pub fn get(&self, id: &NodeId) -> Option<&Arc<dyn WorkUnit<T>>> {
        self.units.get(id)
    }

    /// Unit id that declares `result_id` as one of its outputs, if any.
    pub fn producer_of(&self, result_id: &ResultId) -> Option<&NodeId> {
        self.producers.get(result_id)
    }

    /// Units in insertion order — the order the orchestrator enumerates
    /// nodes and, transitively, end-node declaration order.
    pub fn ordered(&self) -> impl Iterator<Item = &Arc<dyn WorkUnit<T>>> {
        self.order.iter().map(move |id| &self.units[id])
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
