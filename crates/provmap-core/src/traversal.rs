//! Ancestry and descendant traversal
//!
//! Breadth-first search from a start node along one edge direction, with an
//! optional stopping condition and result-size cap.
//!
//! A reached node that passes the condition is added and expanded. A node
//! that fails it is added only when stopping nodes are included, and is never
//! expanded. Once the cap is reached the search stops at the next insertion
//! attempt, so which nodes make it in depends on the canonical neighbor order
//! of the view.

use crate::config::TraversalConfig;
use crate::graph::{BaseGraph, Direction, NodeId, NodeIndex};
use crate::view::GraphView;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-node test that halts expansion through a node
pub trait StoppingCondition: Send + Sync {
    /// True when traversal may continue through `node`
    fn accept(&self, graph: &BaseGraph, node: NodeIndex) -> bool;

    /// Increases whenever `accept` may answer differently; never decreases
    fn revision(&self) -> u64 {
        0
    }
}

/// Built-in stopping conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeFilter {
    /// Accept every node
    All,
    /// Accept nodes whose visible flag is set
    Visible,
    /// Label contains the substring
    LabelContains(String),
    /// Attribute `key` equals `value`
    AttributeEquals {
        /// Attribute name
        key: String,
        /// Required value
        value: String,
    },
    /// External id is one of the set
    IdIn(BTreeSet<NodeId>),
    /// Negation
    Not(Box<NodeFilter>),
    /// All of the filters accept
    And(Vec<NodeFilter>),
    /// Any of the filters accepts
    Or(Vec<NodeFilter>),
}

impl StoppingCondition for NodeFilter {
    fn accept(&self, graph: &BaseGraph, node: NodeIndex) -> bool {
        let Some(entry) = graph.node(node) else {
            return false;
        };
        match self {
            Self::All => true,
            Self::Visible => entry.is_visible(),
            Self::LabelContains(needle) => entry.label().contains(needle.as_str()),
            Self::AttributeEquals { key, value } => entry.attribute(key) == Some(value.as_str()),
            Self::IdIn(ids) => ids.contains(&entry.id()),
            Self::Not(inner) => !inner.accept(graph, node),
            Self::And(all) => all.iter().all(|f| f.accept(graph, node)),
            Self::Or(any) => any.iter().any(|f| f.accept(graph, node)),
        }
    }
}

/// A replaceable condition shared between the code that edits it and the
/// traversals that use it.
///
/// The revision is the wrapped condition's revision plus an offset. Each
/// replacement moves the offset so the combined value ends one above where
/// it was, whatever revision the new condition starts at.
pub struct SharedCondition {
    inner: RwLock<Arc<dyn StoppingCondition>>,
    offset: AtomicU64,
}

impl SharedCondition {
    /// Wrap an initial condition
    pub fn new(condition: Arc<dyn StoppingCondition>) -> Self {
        Self {
            offset: AtomicU64::new(0u64.wrapping_sub(condition.revision())),
            inner: RwLock::new(condition),
        }
    }

    /// Swap in a new condition
    pub fn replace(&self, condition: Arc<dyn StoppingCondition>) {
        let mut inner = self.inner.write();
        let next = self
            .offset
            .load(Ordering::Acquire)
            .wrapping_add(inner.revision())
            .wrapping_add(1);
        self.offset
            .store(next.wrapping_sub(condition.revision()), Ordering::Release);
        *inner = condition;
    }
}

impl std::fmt::Debug for SharedCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCondition")
            .field("revision", &self.revision())
            .finish()
    }
}

impl StoppingCondition for SharedCondition {
    fn accept(&self, graph: &BaseGraph, node: NodeIndex) -> bool {
        self.inner.read().accept(graph, node)
    }

    fn revision(&self) -> u64 {
        // offset and condition are only changed together under the write lock
        let inner = self.inner.read();
        self.offset.load(Ordering::Acquire).wrapping_add(inner.revision())
    }
}

/// What to search for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversalQuery {
    /// Start node
    pub start: NodeId,
    /// `Outgoing` for descendants, `Incoming` for ancestors
    pub direction: Direction,
    /// Keep nodes that fail the stopping condition
    pub include_stopping_nodes: bool,
    /// Stop once this many nodes are in the result
    pub max_result_size: Option<usize>,
}

impl TraversalQuery {
    /// Everything reachable along outgoing edges
    pub fn descendants(start: impl Into<NodeId>) -> Self {
        Self {
            start: start.into(),
            direction: Direction::Outgoing,
            include_stopping_nodes: false,
            max_result_size: None,
        }
    }

    /// Everything reachable along incoming edges
    pub fn ancestors(start: impl Into<NodeId>) -> Self {
        Self {
            direction: Direction::Incoming,
            ..Self::descendants(start)
        }
    }

    /// Take policy and cap from configuration
    pub fn with_config(mut self, config: &TraversalConfig) -> Self {
        self.include_stopping_nodes = config.include_stopping_nodes;
        self.max_result_size = config.max_result_size;
        self
    }

    /// Set the result cap
    pub fn with_max_result_size(mut self, cap: Option<usize>) -> Self {
        self.max_result_size = cap;
        self
    }

    /// Set the stopping node policy
    pub fn with_include_stopping_nodes(mut self, include: bool) -> Self {
        self.include_stopping_nodes = include;
        self
    }
}

/// Nodes found by a traversal
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalResult {
    nodes: BTreeSet<NodeIndex>,
    order: Vec<NodeIndex>,
    truncated: bool,
}

impl TraversalResult {
    /// Result nodes in index order
    pub fn nodes(&self) -> &BTreeSet<NodeIndex> {
        &self.nodes
    }

    /// Result nodes in discovery order
    pub fn order(&self) -> &[NodeIndex] {
        &self.order
    }

    /// True when the cap stopped the search early
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Membership test
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.nodes.contains(&node)
    }

    /// Number of nodes found
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing was found
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// External ids of the result, in index order
    pub fn ids(&self, graph: &BaseGraph) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter_map(|n| graph.node(*n))
            .map(|n| n.id())
            .collect()
    }

    /// Insert unless the cap is already reached. Returns false on abort.
    fn try_insert(&mut self, node: NodeIndex, cap: Option<usize>) -> bool {
        if cap.is_some_and(|cap| self.nodes.len() >= cap) {
            self.truncated = true;
            return false;
        }
        self.nodes.insert(node);
        self.order.push(node);
        true
    }
}

/// Run one breadth-first traversal.
///
/// An unresolved start id, or a start that is not part of `view`, gives an
/// empty result.
pub fn traverse<V: GraphView + ?Sized>(
    view: &V,
    query: &TraversalQuery,
    condition: Option<&dyn StoppingCondition>,
) -> TraversalResult {
    let graph = view.graph();
    let mut result = TraversalResult::default();

    let Some(start) = graph.resolve(query.start).filter(|n| view.contains_node(*n)) else {
        tracing::debug!(start = %query.start, "traversal start does not resolve");
        return result;
    };

    if !result.try_insert(start, query.max_result_size) {
        return result;
    }

    let mut queue = VecDeque::from([start]);
    while let Some(current) = queue.pop_front() {
        for (_, next) in view.neighbors(current, query.direction) {
            if result.contains(next) {
                continue;
            }
            let accepted = condition.is_none_or(|c| c.accept(graph, next));
            if !accepted && !query.include_stopping_nodes {
                continue;
            }
            if !result.try_insert(next, query.max_result_size) {
                tracing::debug!(
                    start = %query.start,
                    cap = ?query.max_result_size,
                    "traversal truncated"
                );
                return result;
            }
            if accepted {
                queue.push_back(next);
            }
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RunKey {
    query: TraversalQuery,
    condition_generation: u64,
    condition_revision: u64,
}

/// A traversal whose inputs can be edited.
///
/// The result is recomputed from scratch whenever the start, direction,
/// policy, cap, or condition (including its revision) changed since the last
/// run. Graph mutations are not observed; call [`Traversal::invalidate`]
/// after changing the graph.
pub struct Traversal {
    query: TraversalQuery,
    condition: Option<Arc<dyn StoppingCondition>>,
    condition_generation: u64,
    cached: Option<(RunKey, TraversalResult)>,
    runs: u64,
}

impl std::fmt::Debug for Traversal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("query", &self.query)
            .field("has_condition", &self.condition.is_some())
            .field("runs", &self.runs)
            .finish()
    }
}

impl Traversal {
    /// New traversal without a stopping condition
    pub fn new(query: TraversalQuery) -> Self {
        Self {
            query,
            condition: None,
            condition_generation: 0,
            cached: None,
            runs: 0,
        }
    }

    /// Current query
    pub fn query(&self) -> &TraversalQuery {
        &self.query
    }

    /// Change the start node
    pub fn set_start(&mut self, start: impl Into<NodeId>) {
        self.query.start = start.into();
    }

    /// Change the direction
    pub fn set_direction(&mut self, direction: Direction) {
        self.query.direction = direction;
    }

    /// Change the stopping node policy
    pub fn set_include_stopping_nodes(&mut self, include: bool) {
        self.query.include_stopping_nodes = include;
    }

    /// Change the cap
    pub fn set_max_result_size(&mut self, cap: Option<usize>) {
        self.query.max_result_size = cap;
    }

    /// Install or clear the stopping condition
    pub fn set_condition(&mut self, condition: Option<Arc<dyn StoppingCondition>>) {
        self.condition = condition;
        self.condition_generation += 1;
    }

    /// Forget the cached result
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Number of times the BFS actually ran
    pub fn runs(&self) -> u64 {
        self.runs
    }

    /// Current result, recomputed if any input changed
    pub fn result<V: GraphView + ?Sized>(&mut self, view: &V) -> &TraversalResult {
        let key = RunKey {
            query: self.query,
            condition_generation: self.condition_generation,
            condition_revision: self.condition.as_ref().map_or(0, |c| c.revision()),
        };

        if self.cached.as_ref().is_some_and(|(cached, _)| *cached != key) {
            self.cached = None;
        }

        let (_, result) = self.cached.get_or_insert_with(|| {
            self.runs += 1;
            (key, traverse(view, &self.query, self.condition.as_deref()))
        });
        result
    }
}
