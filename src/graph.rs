//! Graph Builder (C1): turns a flat node/edge list into an immutable,
//! topologically-sorted [`Graph`].
//!
//! Kahn's algorithm by repeated source-peeling, with validation staged
//! "uniqueness, then references, then cycles" before the sort ever runs.

use std::collections::{HashMap, HashSet};

use crate::errors::SchedulerError;
use crate::node::{Node, NodeId, NodeKind, ResultId};

/// A declared dependency: node `to` reads result `result_id` of node `from`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub result_id: ResultId,
}

impl Edge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>, result_id: impl Into<ResultId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            result_id: result_id.into(),
        }
    }
}

/// The immutable product of C1: topological order, per-node incoming edges
/// in declaration order, and the start/end node sets.
#[derive(Debug, Clone)]
pub struct Graph<P> {
    nodes: HashMap<NodeId, Node<P>>,
    order: Vec<NodeId>,
    incoming: HashMap<NodeId, Vec<Edge>>,
    start_ids: Vec<NodeId>,
    end_ids: Vec<NodeId>,
}

impl<P> Graph<P> {
    /// Builds a graph from a flat node and edge list.
    ///
    /// Any synthetic `Init` node must already be present in `nodes` if the
    /// caller's edges reference it — C1 is total over whatever node list it
    /// is handed; synthesizing `Init` from dangling inputs is the run
    /// orchestrator's job (C5), not this one's.
    pub fn build(nodes: Vec<Node<P>>, edges: Vec<Edge>) -> Result<Self, SchedulerError> {
        // Uniqueness validation: every node id, not just the synthetic
        // `Init`'s, must be unique within the graph.
        let mut by_id: HashMap<NodeId, Node<P>> = HashMap::with_capacity(nodes.len());
        let declared_order: Vec<NodeId> = nodes.iter().map(|n| n.id.clone()).collect();
        for node in nodes {
            if by_id.contains_key(&node.id) {
                return Err(SchedulerError::DuplicateNodeId { node: node.id.clone() });
            }
            by_id.insert(node.id.clone(), node);
        }

        // Duplicate-edge check: (from, to, result_id) must be unique.
        let mut seen_triples: HashSet<(NodeId, NodeId, ResultId)> = HashSet::with_capacity(edges.len());
        for edge in &edges {
            let triple = (edge.from.clone(), edge.to.clone(), edge.result_id.clone());
            if !seen_triples.insert(triple) {
                return Err(SchedulerError::DuplicateEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    result_id: edge.result_id.clone(),
                });
            }
        }

        // Reference validation: every edge endpoint must name a node
        // actually present in `nodes` (the synthetic `Init` node included —
        // it must already be in `nodes` if any edge references it). Without
        // this, a dangling `to` would otherwise surface as a false-positive
        // `CycleDetected` out of `topological_sort` below, since that id
        // would never appear in any node's declared order to be peeled.
        for edge in &edges {
            if !by_id.contains_key(&edge.from) {
                return Err(SchedulerError::UnknownNode {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: edge.from.clone(),
                });
            }
            if !by_id.contains_key(&edge.to) {
                return Err(SchedulerError::UnknownNode {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    missing: edge.to.clone(),
                });
            }
        }

        // incoming[id]: edges in declaration order, for both lookup (C2/C3)
        // and the reducible in-degree map Kahn's algorithm consumes.
        let mut incoming: HashMap<NodeId, Vec<Edge>> = HashMap::with_capacity(by_id.len());
        let mut outgoing_count: HashMap<NodeId, usize> = HashMap::with_capacity(by_id.len());
        for id in by_id.keys() {
            incoming.entry(id.clone()).or_default();
            outgoing_count.entry(id.clone()).or_insert(0);
        }
        for edge in &edges {
            incoming.entry(edge.to.clone()).or_default().push(edge.clone());
            *outgoing_count.entry(edge.from.clone()).or_insert(0) += 1;
        }

        let order = topological_sort(&by_id, &incoming)?;

        let start_ids: Vec<NodeId> = declared_order
            .iter()
            .filter(|id| incoming.get(*id).map(|v| v.is_empty()).unwrap_or(true))
            .cloned()
            .collect();
        let end_ids: Vec<NodeId> = declared_order
            .iter()
            .filter(|id| outgoing_count.get(*id).copied().unwrap_or(0) == 0)
            .cloned()
            .collect();

        Ok(Graph {
            nodes: by_id,
            order,
            incoming,
            start_ids,
            end_ids,
        })
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node<P>> {
        self.nodes.get(id)
    }

    /// Topological order of every node in the graph.
    pub fn order(&self) -> &[NodeId] {
        &self.order
    }

    /// Incoming edges for `id`, in declaration order. Empty for a start node.
    pub fn incoming(&self, id: &NodeId) -> &[Edge] {
        self.incoming.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn start_ids(&self) -> &[NodeId] {
        &self.start_ids
    }

    /// End nodes (no outgoing edges), in declaration order. These are the
    /// nodes the top-level run awaits.
    pub fn end_ids(&self) -> &[NodeId] {
        &self.end_ids
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deterministic textual rendering for logging: every node id in
    /// topological order, followed by every edge. Layout is not a contract,
    /// only completeness is.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("nodes: ");
        let node_list: Vec<&str> = self.order.iter().map(|id| id.as_str()).collect();
        out.push_str(&node_list.join(", "));
        out.push_str("\nedges:");
        for id in &self.order {
            for edge in self.incoming(id) {
                out.push_str(&format!("\n  {} -> {} [{}]", edge.from, edge.to, edge.result_id));
            }
        }
        out
    }
}

/// Kahn-style topological sort by repeated source-peeling: partition the
/// remaining node set into a "front" of zero-incoming nodes, append it,
/// remove it from the others' incoming lists, and repeat until the
/// remaining set is empty. An empty front with a non-empty remaining set is
/// a cycle.
fn topological_sort<P>(
    by_id: &HashMap<NodeId, Node<P>>,
    incoming: &HashMap<NodeId, Vec<Edge>>,
) -> Result<Vec<NodeId>, SchedulerError> {
    // Every edge endpoint was already validated against `by_id` before this
    // is called, so `incoming` has exactly one entry per node — no
    // dangling-reference ids can leak into `remaining` and masquerade as an
    // unresolved cycle member.
    let mut remaining: HashMap<NodeId, usize> = incoming
        .iter()
        .map(|(id, edges)| (id.clone(), edges.len()))
        .collect();

    // Stable peeling order: always walk candidates in the node's declared
    // key order so repeated builds of the same input are deterministic.
    let mut declared_order: Vec<NodeId> = by_id.keys().cloned().collect();
    declared_order.sort();

    let mut order = Vec::with_capacity(remaining.len());
    let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for edges in incoming.values() {
        for edge in edges {
            successors.entry(edge.from.clone()).or_default().push(edge.to.clone());
        }
    }

    while !remaining.is_empty() {
        let front: Vec<NodeId> = declared_order
            .iter()
            .filter(|id| remaining.get(*id) == Some(&0))
            .cloned()
            .collect();

        if front.is_empty() {
            let mut left: Vec<NodeId> = remaining.keys().cloned().collect();
            left.sort();
            return Err(SchedulerError::CycleDetected(left));
        }

        for id in &front {
            remaining.remove(id);
            declared_order.retain(|x| x != id);
            order.push(id.clone());
            if let Some(succs) = successors.get(id) {
                for succ in succs {
                    if let Some(count) = remaining.get_mut(succ) {
                        *count = count.saturating_sub(1);
                    }
                }
            }
        }
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> Node<()> {
        Node::user(id, ())
    }

    #[test]
    fn topological_soundness_linear_chain() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![Edge::new("a", "b", "r1"), Edge::new("b", "c", "r2")];
        let graph = Graph::build(nodes, edges).unwrap();
        let order = graph.order();
        let pos = |id: &str| order.iter().position(|n| n.as_str() == id).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("b") < pos("c"));
    }

    #[test]
    fn cycle_is_rejected() {
        let nodes = vec![node("a"), node("b"), node("c")];
        let edges = vec![
            Edge::new("a", "b", "r"),
            Edge::new("b", "c", "r"),
            Edge::new("c", "a", "r"),
        ];
        let err = Graph::build(nodes, edges).unwrap_err();
        match err {
            SchedulerError::CycleDetected(mut ids) => {
                ids.sort();
                assert_eq!(
                    ids,
                    vec![NodeId::new("a"), NodeId::new("b"), NodeId::new("c")]
                );
            }
            other => panic!("expected CycleDetected, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_edge_is_rejected() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![Edge::new("a", "b", "r"), Edge::new("a", "b", "r")];
        let err = Graph::build(nodes, edges).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateEdge { .. }));
    }

    #[test]
    fn disconnected_components_both_present() {
        let nodes = vec![node("a"), node("b"), node("x"), node("y")];
        let edges = vec![Edge::new("a", "b", "r"), Edge::new("x", "y", "r")];
        let graph = Graph::build(nodes, edges).unwrap();
        assert_eq!(graph.len(), 4);
        let mut ends = graph.end_ids().iter().map(|i| i.as_str()).collect::<Vec<_>>();
        ends.sort();
        assert_eq!(ends, vec!["b", "y"]);
    }

    #[test]
    fn empty_graph_builds_with_empty_order() {
        let graph: Graph<()> = Graph::build(vec![], vec![]).unwrap();
        assert!(graph.is_empty());
        assert!(graph.order().is_empty());
        assert!(graph.end_ids().is_empty());
        assert!(graph.start_ids().is_empty());
    }

    #[test]
    fn diamond_start_and_end_sets() {
        let nodes = vec![node("a"), node("b"), node("c"), node("d")];
        let edges = vec![
            Edge::new("a", "b", "r"),
            Edge::new("a", "c", "r"),
            Edge::new("b", "d", "rb"),
            Edge::new("c", "d", "rc"),
        ];
        let graph = Graph::build(nodes, edges).unwrap();
        assert_eq!(graph.start_ids(), &[NodeId::new("a")]);
        assert_eq!(graph.end_ids(), &[NodeId::new("d")]);
        assert_eq!(graph.incoming(&NodeId::new("d")).len(), 2);
    }

    #[test]
    fn render_includes_every_node_and_edge() {
        let nodes = vec![node("a"), node("b")];
        let edges = vec![Edge::new("a", "b", "r")];
        let graph = Graph::build(nodes, edges).unwrap();
        let rendered = graph.render();
        assert!(rendered.contains('a'));
        assert!(rendered.contains('b'));
        assert!(rendered.contains("a -> b"));
    }

    #[test]
    fn duplicate_init_node_is_rejected() {
        let nodes = vec![
            Node::init(vec![ResultId::new("seed")]),
            Node::init(vec![ResultId::new("other")]),
        ];
        let err = Graph::build(nodes, vec![]).unwrap_err();
        assert!(matches!(err, SchedulerError::DuplicateNodeId { .. }));
    }

    #[test]
    fn duplicate_user_node_id_is_rejected() {
        let nodes = vec![Node::user("a", ()), Node::user("a", ())];
        let err = Graph::build(nodes, vec![]).unwrap_err();
        match err {
            SchedulerError::DuplicateNodeId { node } => assert_eq!(node, NodeId::new("a")),
            other => panic!("expected DuplicateNodeId, got {other:?}"),
        }
    }

    #[test]
    fn dangling_edge_target_is_rejected_not_misreported_as_cycle() {
        let nodes = vec![node("a")];
        let edges = vec![Edge::new("a", "ghost", "r")];
        let err = Graph::build(nodes, edges).unwrap_err();
        match err {
            SchedulerError::UnknownNode { missing, .. } => assert_eq!(missing, NodeId::new("ghost")),
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn dangling_edge_source_is_rejected() {
        let nodes = vec![node("b")];
        let edges = vec![Edge::new("ghost", "b", "r")];
        let err = Graph::build(nodes, edges).unwrap_err();
        match err {
            SchedulerError::UnknownNode { missing, .. } => assert_eq!(missing, NodeId::new("ghost")),
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn init_node_must_already_be_present() {
        // C1 does not synthesize Init; an edge from it with no matching node
        // is simply an edge with no effect on in-degree tracking of a real
        // producer and the consumer still resolves fine structurally.
        let nodes = vec![Node::init(vec![ResultId::new("seed")]), node("b")];
        let edges = vec![Edge::new(NodeId::init(), "b", "seed")];
        let graph = Graph::build(nodes, edges).unwrap();
        assert_eq!(graph.start_ids(), &[NodeId::init()]);
    }
}
