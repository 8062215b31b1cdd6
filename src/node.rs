//! Core identity and value types: node/result identifiers, nodes, and
//! the typed results a node produces.

use std::fmt;

/// Stable identifier for a node, unique within a single [`crate::graph::Graph`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier reserved for the synthetic source node. No user-supplied
    /// node may use this id; [`crate::graph::Graph::build`] rejects collisions.
    pub fn init() -> Self {
        Self("Init".to_string())
    }

    pub fn is_init(&self) -> bool {
        self.0 == "Init"
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Names which of a producer's possibly-many outputs a consumer wants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultId(String);

impl ResultId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ResultId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ResultId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// A single typed result, tagged with the id downstream edges address it by.
#[derive(Debug, Clone)]
pub struct Output<T> {
    pub result_id: ResultId,
    pub value: T,
}

impl<T> Output<T> {
    pub fn new(result_id: impl Into<ResultId>, value: T) -> Self {
        Self {
            result_id: result_id.into(),
            value,
        }
    }
}

/// Distinguishes the synthetic `Init` source from ordinary, caller-supplied
/// nodes. The scheduler dispatches on this variant only; the payload itself
/// is opaque.
#[derive(Debug, Clone)]
pub enum NodeKind<P> {
    /// The synthetic source. Carries the result ids it must synthesize
    /// one placeholder output for.
    Init(Vec<ResultId>),
    User(P),
}

/// An identity plus a user payload. The scheduler never inspects `P`.
#[derive(Debug, Clone)]
pub struct Node<P> {
    pub id: NodeId,
    pub kind: NodeKind<P>,
}

impl<P> Node<P> {
    pub fn user(id: impl Into<NodeId>, payload: P) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::User(payload),
        }
    }

    pub fn init(result_ids: Vec<ResultId>) -> Self {
        Self {
            id: NodeId::init(),
            kind: NodeKind::Init(result_ids),
        }
    }

    pub fn is_init(&self) -> bool {
        matches!(self.kind, NodeKind::Init(_))
    }
}
