//! Node and edge records stored in the graph arena

use super::ids::{Direction, EdgeIndex, NodeId, NodeIndex, SummaryEdgeId};
use std::collections::{BTreeMap, BTreeSet};

/// What kind of node a record is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// A node inserted through `add_node`
    Base,
    /// A summary node owning a set of children
    Group {
        /// Immediate children (base nodes or nested groups)
        children: BTreeSet<NodeIndex>,
    },
}

/// A node in the provenance graph.
///
/// For base nodes `incoming`/`outgoing` hold the node's own incident edges.
/// For groups they hold the base edges crossing the group boundary: exactly
/// one endpoint inside the group's closure.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) index: NodeIndex,
    pub(crate) id: NodeId,
    pub(crate) label: String,
    pub(crate) visible: bool,
    pub(crate) parent: Option<NodeIndex>,
    pub(crate) depth: u32,
    pub(crate) incoming: BTreeSet<EdgeIndex>,
    pub(crate) outgoing: BTreeSet<EdgeIndex>,
    pub(crate) attributes: BTreeMap<String, String>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn new_base(index: NodeIndex, id: NodeId, label: String) -> Self {
        Self {
            index,
            id,
            label,
            visible: true,
            parent: None,
            depth: 0,
            incoming: BTreeSet::new(),
            outgoing: BTreeSet::new(),
            attributes: BTreeMap::new(),
            kind: NodeKind::Base,
        }
    }

    pub(crate) fn new_group(index: NodeIndex, id: NodeId, label: String) -> Self {
        Self {
            kind: NodeKind::Group {
                children: BTreeSet::new(),
            },
            ..Self::new_base(index, id, label)
        }
    }

    /// Dense index in the owning graph
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    /// Stable external id
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Visibility flag
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Parent group, `None` at the top of the tree
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Distance from the root group
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Incoming edge set (own edges for base nodes, crossing edges for groups)
    pub fn incoming(&self) -> &BTreeSet<EdgeIndex> {
        &self.incoming
    }

    /// Outgoing edge set (own edges for base nodes, crossing edges for groups)
    pub fn outgoing(&self) -> &BTreeSet<EdgeIndex> {
        &self.outgoing
    }

    /// Edge set for one direction
    pub fn edges(&self, direction: Direction) -> &BTreeSet<EdgeIndex> {
        match direction {
            Direction::Outgoing => &self.outgoing,
            Direction::Incoming => &self.incoming,
        }
    }

    pub(crate) fn edges_mut(&mut self, direction: Direction) -> &mut BTreeSet<EdgeIndex> {
        match direction {
            Direction::Outgoing => &mut self.outgoing,
            Direction::Incoming => &mut self.incoming,
        }
    }

    /// All attributes ingested for this node
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// A single attribute value
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// True for summary nodes
    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group { .. })
    }

    /// Kind of this node
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Immediate children, `None` for base nodes
    pub fn children(&self) -> Option<&BTreeSet<NodeIndex>> {
        match &self.kind {
            NodeKind::Group { children } => Some(children),
            NodeKind::Base => None,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut BTreeSet<NodeIndex>> {
        match &mut self.kind {
            NodeKind::Group { children } => Some(children),
            NodeKind::Base => None,
        }
    }
}

/// A base edge between two base nodes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub(crate) index: EdgeIndex,
    pub(crate) from: NodeIndex,
    pub(crate) to: NodeIndex,
    pub(crate) label: Option<String>,
}

impl Edge {
    /// Dense index in the owning graph
    pub fn index(&self) -> EdgeIndex {
        self.index
    }

    /// Source node
    pub fn from(&self) -> NodeIndex {
        self.from
    }

    /// Target node
    pub fn to(&self) -> NodeIndex {
        self.to
    }

    /// Optional edge label
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Endpoint on the far side when leaving in `direction`
    pub fn endpoint(&self, direction: Direction) -> NodeIndex {
        match direction {
            Direction::Outgoing => self.to,
            Direction::Incoming => self.from,
        }
    }

    /// Get the other end of this edge given one node
    pub fn other_end(&self, node: NodeIndex) -> Option<NodeIndex> {
        if self.from == node {
            Some(self.to)
        } else if self.to == node {
            Some(self.from)
        } else {
            None
        }
    }
}

/// One logical edge standing for one or more base edges between two
/// (possibly grouped) endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEdge {
    pub(crate) id: SummaryEdgeId,
    pub(crate) from: NodeIndex,
    pub(crate) to: NodeIndex,
    pub(crate) members: Vec<EdgeIndex>,
    pub(crate) label: Option<String>,
}

impl SummaryEdge {
    /// Arena slot
    pub fn id(&self) -> SummaryEdgeId {
        self.id
    }

    /// Source endpoint
    pub fn from(&self) -> NodeIndex {
        self.from
    }

    /// Target endpoint
    pub fn to(&self) -> NodeIndex {
        self.to
    }

    /// Underlying base edges, in index order
    pub fn members(&self) -> &[EdgeIndex] {
        &self.members
    }

    /// Shared label of all members, if they agree
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Number of base edges coalesced into this one
    pub fn multiplicity(&self) -> usize {
        self.members.len()
    }
}
