//! Identifiers and arena handles
//!
//! Every back-reference in the graph is one of these handles. `NodeId` is the
//! stable external identifier supplied by importers; the index types address
//! the graph's dense stores.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable external identifier of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Create a new node ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<NodeId> for u64 {
    fn from(node_id: NodeId) -> Self {
        node_id.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense position of a node (base node or group) in the graph's node store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIndex(pub usize);

impl NodeIndex {
    /// Raw position
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Dense position of a base edge in the graph's edge store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeIndex(pub usize);

impl EdgeIndex {
    /// Raw position
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for EdgeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Arena slot of a synthesized summary edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SummaryEdgeId(pub usize);

impl SummaryEdgeId {
    /// Raw arena slot
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Identity of a logical edge: a base edge or a synthesized summary edge.
///
/// Two equal handles denote the same edge instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EdgeHandle {
    /// An edge inserted through `add_edge`
    Base(EdgeIndex),
    /// An edge coalescing one or more base edges between grouped endpoints
    Summary(SummaryEdgeId),
}

impl EdgeHandle {
    /// True for synthesized summary edges
    pub fn is_summary(&self) -> bool {
        matches!(self, Self::Summary(_))
    }

    /// Base edge index, if this handle is one
    pub fn as_base(&self) -> Option<EdgeIndex> {
        match self {
            Self::Base(e) => Some(*e),
            Self::Summary(_) => None,
        }
    }
}

impl fmt::Display for EdgeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(e) => write!(f, "{}", e),
            Self::Summary(s) => write!(f, "s{}", s.0),
        }
    }
}

/// Which way edges are followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Follow outgoing edges (descendants)
    Outgoing,
    /// Follow incoming edges (ancestors)
    Incoming,
}

impl Direction {
    /// The opposite direction
    pub fn reverse(self) -> Self {
        match self {
            Self::Outgoing => Self::Incoming,
            Self::Incoming => Self::Outgoing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_conversions() {
        let id = NodeId::from(42u64);
        assert_eq!(id.value(), 42);
        assert_eq!(u64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_edge_handle_identity() {
        let a = EdgeHandle::Summary(SummaryEdgeId(3));
        let b = EdgeHandle::Summary(SummaryEdgeId(3));
        assert_eq!(a, b);
        assert!(a.is_summary());
        assert_eq!(a.as_base(), None);
        assert_eq!(EdgeHandle::Base(EdgeIndex(1)).as_base(), Some(EdgeIndex(1)));
    }

    #[test]
    fn test_direction_reverse() {
        assert_eq!(Direction::Outgoing.reverse(), Direction::Incoming);
        assert_eq!(Direction::Incoming.reverse(), Direction::Outgoing);
    }
}
