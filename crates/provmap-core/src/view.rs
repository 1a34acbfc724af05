//! Read-only adjacency views
//!
//! Traversal and the graph algorithms never touch the store directly; they
//! run over a [`GraphView`]. Three views are provided:
//!
//! - [`BaseView`]: base nodes and base edges
//! - [`SummaryView`]: a cut through the summary tree; edges between cut nodes
//!   come from [`BaseGraph::get_edge_ext`] and are summary edges where groups
//!   are involved
//! - [`Subgraph`]: any view restricted to a node set, such as a traversal
//!   result

use crate::error::{Error, Result};
use crate::graph::{BaseGraph, Direction, EdgeHandle, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Adjacency over a node collection. Enumeration order is canonical
/// (ascending index) so that results depending on it are reproducible.
pub trait GraphView {
    /// Graph the handles refer to
    fn graph(&self) -> &BaseGraph;

    /// Nodes of the view in ascending index order
    fn nodes(&self) -> Vec<NodeIndex>;

    /// True when `node` is part of the view
    fn contains_node(&self, node: NodeIndex) -> bool;

    /// Edges leaving `node` in `direction`, with the node at the far end
    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<(EdgeHandle, NodeIndex)>;
}

impl<V: GraphView + ?Sized> GraphView for &V {
    fn graph(&self) -> &BaseGraph {
        (**self).graph()
    }

    fn nodes(&self) -> Vec<NodeIndex> {
        (**self).nodes()
    }

    fn contains_node(&self, node: NodeIndex) -> bool {
        (**self).contains_node(node)
    }

    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<(EdgeHandle, NodeIndex)> {
        (**self).neighbors(node, direction)
    }
}

/// How edges of a view are followed by path algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeOrientation {
    /// Along edge direction
    #[default]
    Directed,
    /// Against edge direction
    Inverted,
    /// Either way
    Undirected,
}

impl EdgeOrientation {
    /// Neighbors of `node` under this orientation
    pub fn neighbors<V: GraphView + ?Sized>(self, view: &V, node: NodeIndex) -> Vec<(EdgeHandle, NodeIndex)> {
        match self {
            Self::Directed => view.neighbors(node, Direction::Outgoing),
            Self::Inverted => view.neighbors(node, Direction::Incoming),
            Self::Undirected => {
                let mut both = view.neighbors(node, Direction::Outgoing);
                both.extend(view.neighbors(node, Direction::Incoming));
                both
            }
        }
    }
}

impl fmt::Display for EdgeOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Directed => "directed",
            Self::Inverted => "inverted",
            Self::Undirected => "undirected",
        };
        f.write_str(name)
    }
}

impl FromStr for EdgeOrientation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "directed" => Ok(Self::Directed),
            "inverted" => Ok(Self::Inverted),
            "undirected" => Ok(Self::Undirected),
            other => Err(Error::config(format!("unknown edge orientation '{}'", other))),
        }
    }
}

/// Base nodes and base edges
#[derive(Debug, Clone, Copy)]
pub struct BaseView<'g> {
    graph: &'g BaseGraph,
}

impl<'g> BaseView<'g> {
    /// View over the whole base graph
    pub fn new(graph: &'g BaseGraph) -> Self {
        Self { graph }
    }
}

impl GraphView for BaseView<'_> {
    fn graph(&self) -> &BaseGraph {
        self.graph
    }

    fn nodes(&self) -> Vec<NodeIndex> {
        self.graph.base_nodes().map(|n| n.index()).collect()
    }

    fn contains_node(&self, node: NodeIndex) -> bool {
        self.graph.node(node).is_some_and(|n| !n.is_group())
    }

    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<(EdgeHandle, NodeIndex)> {
        let Some(entry) = self.graph.node(node).filter(|n| !n.is_group()) else {
            return Vec::new();
        };
        entry
            .edges(direction)
            .iter()
            .filter_map(|e| self.graph.edge(*e))
            .map(|e| (EdgeHandle::Base(e.index()), e.endpoint(direction)))
            .collect()
    }
}

/// A cut through the summary tree.
///
/// Expanded groups are replaced by their children; every other node reached
/// from the root is visible as a single vertex. The root is always expanded.
#[derive(Debug, Clone)]
pub struct SummaryView<'g> {
    graph: &'g BaseGraph,
    visible: BTreeSet<NodeIndex>,
}

impl<'g> SummaryView<'g> {
    /// Cut produced by expanding `expanded` (plus the root)
    pub fn new(graph: &'g BaseGraph, expanded: impl IntoIterator<Item = NodeIndex>) -> Result<Self> {
        let root = graph
            .root()
            .ok_or_else(|| Error::state("summary view requires an active summary tree"))?;
        let mut expanded: BTreeSet<NodeIndex> = expanded.into_iter().collect();
        expanded.insert(root);

        let mut visible = BTreeSet::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            match graph.node(current).and_then(|n| n.children()) {
                Some(children) if expanded.contains(&current) && !children.is_empty() => {
                    stack.extend(children.iter().copied())
                }
                _ => {
                    visible.insert(current);
                }
            }
        }
        Ok(Self { graph, visible })
    }

    /// Only the root expanded: its immediate children are the vertices
    pub fn top_level(graph: &'g BaseGraph) -> Result<Self> {
        Self::new(graph, std::iter::empty())
    }

    /// Every group expanded; groups that are empty still show up as vertices
    pub fn fully_expanded(graph: &'g BaseGraph) -> Result<Self> {
        Self::new(graph, graph.groups().iter().copied())
    }

    /// Visible node standing for `node`
    pub fn representative(&self, node: NodeIndex) -> Option<NodeIndex> {
        let mut current = node;
        loop {
            if self.visible.contains(&current) {
                return Some(current);
            }
            current = self.graph.node(current)?.parent()?;
        }
    }
}

impl GraphView for SummaryView<'_> {
    fn graph(&self) -> &BaseGraph {
        self.graph
    }

    fn nodes(&self) -> Vec<NodeIndex> {
        self.visible.iter().copied().collect()
    }

    fn contains_node(&self, node: NodeIndex) -> bool {
        self.visible.contains(&node)
    }

    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<(EdgeHandle, NodeIndex)> {
        if !self.visible.contains(&node) {
            return Vec::new();
        }
        let Some(entry) = self.graph.node(node) else {
            return Vec::new();
        };

        let reps: BTreeSet<NodeIndex> = entry
            .edges(direction)
            .iter()
            .filter_map(|e| self.graph.edge(*e))
            .filter_map(|e| self.representative(e.endpoint(direction)))
            .filter(|rep| *rep != node || !entry.is_group())
            .collect();

        reps.into_iter()
            .filter_map(|rep| {
                let handle = match direction {
                    Direction::Outgoing => self.graph.get_edge_ext(node, rep),
                    Direction::Incoming => self.graph.get_edge_ext(rep, node),
                };
                handle.map(|h| (h, rep))
            })
            .collect()
    }
}

/// A view restricted to a node set
#[derive(Debug, Clone)]
pub struct Subgraph<V> {
    inner: V,
    nodes: BTreeSet<NodeIndex>,
}

impl<V: GraphView> Subgraph<V> {
    /// Restrict `inner` to the given nodes; nodes outside `inner` are dropped
    pub fn new(inner: V, nodes: impl IntoIterator<Item = NodeIndex>) -> Self {
        let nodes = nodes
            .into_iter()
            .filter(|n| inner.contains_node(*n))
            .collect();
        Self { inner, nodes }
    }
}

impl<V: GraphView> GraphView for Subgraph<V> {
    fn graph(&self) -> &BaseGraph {
        self.inner.graph()
    }

    fn nodes(&self) -> Vec<NodeIndex> {
        self.nodes.iter().copied().collect()
    }

    fn contains_node(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }

    fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<(EdgeHandle, NodeIndex)> {
        if !self.nodes.contains(&node) {
            return Vec::new();
        }
        self.inner
            .neighbors(node, direction)
            .into_iter()
            .filter(|(_, n)| self.nodes.contains(n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> (BaseGraph, Vec<NodeIndex>) {
        let mut graph = BaseGraph::new();
        let n: Vec<_> = (1..=4u64).map(|i| graph.add_node(i, "").unwrap()).collect();
        graph.add_edge(n[0], n[1], None).unwrap();
        graph.add_edge(n[0], n[2], None).unwrap();
        graph.add_edge(n[1], n[3], None).unwrap();
        graph.add_edge(n[2], n[3], None).unwrap();
        (graph, n)
    }

    #[test]
    fn test_base_view() {
        let (graph, n) = diamond();
        let view = BaseView::new(&graph);
        assert_eq!(view.nodes(), n);
        let out: Vec<_> = view
            .neighbors(n[0], Direction::Outgoing)
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(out, vec![n[1], n[2]]);
        assert_eq!(view.neighbors(n[3], Direction::Incoming).len(), 2);
    }

    #[test]
    fn test_orientation_parse() {
        assert_eq!("Undirected".parse::<EdgeOrientation>().unwrap(), EdgeOrientation::Undirected);
        assert!("sideways".parse::<EdgeOrientation>().is_err());
        assert_eq!(EdgeOrientation::Inverted.to_string(), "inverted");
    }

    #[test]
    fn test_summary_view_collapses_group() {
        let (mut graph, n) = diamond();
        let root = graph.summarization_begin().unwrap();
        let s = graph.create_group(root, "s").unwrap();
        graph.move_node_from_parent(n[1], s).unwrap();
        graph.move_node_from_parent(n[2], s).unwrap();

        let view = SummaryView::top_level(&graph).unwrap();
        assert_eq!(view.nodes(), vec![n[0], n[3], s]);

        let out = view.neighbors(n[0], Direction::Outgoing);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].1, s);
        assert!(out[0].0.is_summary());
        assert_eq!(Some(out[0].0), graph.get_edge_ext(n[0], s));

        let into_d = view.neighbors(n[3], Direction::Incoming);
        assert_eq!(into_d.len(), 1);
        assert_eq!(into_d[0].1, s);

        let expanded = SummaryView::fully_expanded(&graph).unwrap();
        assert_eq!(expanded.nodes(), n);
        assert_eq!(expanded.neighbors(n[0], Direction::Outgoing).len(), 2);
    }

    #[test]
    fn test_summary_view_requires_tree() {
        let (graph, _) = diamond();
        assert!(matches!(SummaryView::top_level(&graph), Err(Error::State(_))));
    }

    #[test]
    fn test_subgraph_filters_edges() {
        let (graph, n) = diamond();
        let sub = Subgraph::new(BaseView::new(&graph), [n[0], n[1], n[3]]);
        assert_eq!(sub.nodes(), vec![n[0], n[1], n[3]]);
        assert_eq!(sub.neighbors(n[0], Direction::Outgoing).len(), 1);
        assert_eq!(sub.neighbors(n[3], Direction::Incoming).len(), 1);
        assert!(sub.neighbors(n[2], Direction::Outgoing).is_empty());
    }

    #[test]
    fn test_undirected_merges_both_sides() {
        let (graph, n) = diamond();
        let view = BaseView::new(&graph);
        assert_eq!(EdgeOrientation::Undirected.neighbors(&view, n[1]).len(), 2);
        assert_eq!(EdgeOrientation::Inverted.neighbors(&view, n[0]).len(), 0);
    }
}
