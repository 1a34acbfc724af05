//! All-pairs shortest paths
//!
//! One BFS per source over a view under an [`EdgeOrientation`]. Distances and
//! BFS-tree predecessors are kept in dense `n * n` matrices indexed by the
//! position of each node in the view's canonical node order.

use crate::error::Result;
use crate::graph::NodeIndex;
use crate::job::JobContext;
use crate::view::{EdgeOrientation, GraphView};
use std::collections::{HashMap, VecDeque};

/// Hop distances and predecessors between every ordered pair of view nodes
#[derive(Debug, Clone)]
pub struct AllPairs {
    nodes: Vec<NodeIndex>,
    positions: HashMap<NodeIndex, usize>,
    distances: Vec<Option<u32>>,
    predecessors: Vec<Option<usize>>,
    orientation: EdgeOrientation,
}

impl AllPairs {
    /// Run one BFS per source node.
    ///
    /// Checks cancellation before each source and reports one progress tick
    /// after it, over the range `0..n`.
    pub fn compute<V: GraphView + ?Sized>(view: &V, orientation: EdgeOrientation, ctx: &JobContext) -> Result<Self> {
        let nodes = view.nodes();
        let n = nodes.len();
        let positions: HashMap<NodeIndex, usize> = nodes.iter().enumerate().map(|(i, node)| (*node, i)).collect();

        let mut distances = vec![None; n * n];
        let mut predecessors = vec![None; n * n];

        ctx.set_range(0, n as u64);
        ctx.set_progress(0);

        for source in 0..n {
            ctx.check_cancelled()?;

            let row = source * n;
            distances[row + source] = Some(0);
            let mut queue = VecDeque::from([source]);
            while let Some(current) = queue.pop_front() {
                let next_distance = distances[row + current].map_or(0, |d| d + 1);
                for (_, neighbor) in orientation.neighbors(view, nodes[current]) {
                    let Some(&target) = positions.get(&neighbor) else {
                        continue;
                    };
                    if distances[row + target].is_none() {
                        distances[row + target] = Some(next_distance);
                        predecessors[row + target] = Some(current);
                        queue.push_back(target);
                    }
                }
            }

            ctx.add_progress(1);
        }

        Ok(Self {
            nodes,
            positions,
            distances,
            predecessors,
            orientation,
        })
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True for an empty view
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Orientation the paths were computed under
    pub fn orientation(&self) -> EdgeOrientation {
        self.orientation
    }

    /// Nodes in matrix order
    pub fn nodes(&self) -> &[NodeIndex] {
        &self.nodes
    }

    /// Matrix position of a node
    pub fn position(&self, node: NodeIndex) -> Option<usize> {
        self.positions.get(&node).copied()
    }

    /// Hop distance by matrix position
    pub fn distance_at(&self, from: usize, to: usize) -> Option<u32> {
        let n = self.nodes.len();
        if from >= n || to >= n {
            return None;
        }
        self.distances[from * n + to]
    }

    /// Position of the node before `to` on the path from `from`
    pub fn predecessor_at(&self, from: usize, to: usize) -> Option<usize> {
        let n = self.nodes.len();
        if from >= n || to >= n {
            return None;
        }
        self.predecessors[from * n + to]
    }

    /// Hop distance between two nodes
    pub fn distance(&self, from: NodeIndex, to: NodeIndex) -> Option<u32> {
        self.distance_at(self.position(from)?, self.position(to)?)
    }

    /// Nodes on the recorded shortest path, both endpoints included
    pub fn path(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
        let source = self.position(from)?;
        let mut current = self.position(to)?;
        self.distance_at(source, current)?;

        let mut path = vec![self.nodes[current]];
        while current != source {
            current = self.predecessor_at(source, current)?;
            path.push(self.nodes[current]);
        }
        path.reverse();
        Some(path)
    }
}
