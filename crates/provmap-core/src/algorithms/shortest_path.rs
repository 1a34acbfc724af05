//! Point-to-point shortest paths

use crate::error::{Error, Result};
use crate::graph::{EdgeHandle, NodeIndex};
use crate::view::{EdgeOrientation, GraphView};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// Result of a path query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathOutcome {
    /// Edges from source to target, in order
    Found(Vec<EdgeHandle>),
    /// Target is not reachable
    NoPath,
}

impl PathOutcome {
    /// True when a path exists
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Path edges, if any
    pub fn edges(&self) -> Option<&[EdgeHandle]> {
        match self {
            Self::Found(edges) => Some(edges),
            Self::NoPath => None,
        }
    }

    /// Number of hops, if a path exists
    pub fn hops(&self) -> Option<usize> {
        self.edges().map(<[EdgeHandle]>::len)
    }
}

fn require_in_view<V: GraphView + ?Sized>(view: &V, node: NodeIndex, role: &str) -> Result<()> {
    if view.contains_node(node) {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!("{} node {} is not in the view", role, node)))
    }
}

fn unwind(
    parents: &HashMap<NodeIndex, (NodeIndex, EdgeHandle)>,
    source: NodeIndex,
    target: NodeIndex,
) -> PathOutcome {
    let mut edges = Vec::new();
    let mut current = target;
    while current != source {
        match parents.get(&current) {
            Some((previous, edge)) => {
                edges.push(*edge);
                current = *previous;
            }
            None => return PathOutcome::NoPath,
        }
    }
    edges.reverse();
    PathOutcome::Found(edges)
}

/// Fewest-hop path along edge direction
pub fn shortest_path<V: GraphView + ?Sized>(view: &V, source: NodeIndex, target: NodeIndex) -> Result<PathOutcome> {
    shortest_path_oriented(view, EdgeOrientation::Directed, source, target)
}

/// Fewest-hop path under the given orientation.
///
/// Ties go to the neighbor enumerated first by the view.
pub fn shortest_path_oriented<V: GraphView + ?Sized>(
    view: &V,
    orientation: EdgeOrientation,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<PathOutcome> {
    require_in_view(view, source, "source")?;
    require_in_view(view, target, "target")?;

    let mut parents: HashMap<NodeIndex, (NodeIndex, EdgeHandle)> = HashMap::new();
    let mut queue = VecDeque::from([source]);
    let mut seen = std::collections::HashSet::from([source]);

    while let Some(current) = queue.pop_front() {
        if current == target {
            break;
        }
        for (edge, next) in orientation.neighbors(view, current) {
            if seen.insert(next) {
                parents.insert(next, (current, edge));
                queue.push_back(next);
            }
        }
    }

    Ok(unwind(&parents, source, target))
}

#[derive(PartialEq)]
struct QueueItem(f64, NodeIndex);

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance, then lowest index first
        other
            .0
            .partial_cmp(&self.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.1.cmp(&self.1))
    }
}

/// Cheapest path along edge direction under `weight`.
///
/// Weights must be finite and non-negative.
pub fn weighted_shortest_path<V, W>(view: &V, source: NodeIndex, target: NodeIndex, weight: W) -> Result<PathOutcome>
where
    V: GraphView + ?Sized,
    W: Fn(EdgeHandle) -> f64,
{
    require_in_view(view, source, "source")?;
    require_in_view(view, target, "target")?;

    let mut distances: HashMap<NodeIndex, f64> = HashMap::from([(source, 0.0)]);
    let mut parents: HashMap<NodeIndex, (NodeIndex, EdgeHandle)> = HashMap::new();
    let mut heap = BinaryHeap::from([QueueItem(0.0, source)]);

    while let Some(QueueItem(dist, current)) = heap.pop() {
        if current == target {
            break;
        }
        if distances.get(&current).is_some_and(|best| dist > *best) {
            continue;
        }

        for (edge, next) in EdgeOrientation::Directed.neighbors(view, current) {
            let w = weight(edge);
            if !w.is_finite() || w < 0.0 {
                return Err(Error::invalid_argument(format!("edge {} has invalid weight {}", edge, w)));
            }
            let candidate = dist + w;
            if distances.get(&next).is_none_or(|best| candidate < *best) {
                distances.insert(next, candidate);
                parents.insert(next, (current, edge));
                heap.push(QueueItem(candidate, next));
            }
        }
    }

    Ok(unwind(&parents, source, target))
}
