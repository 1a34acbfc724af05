//! BaseGraph - node/edge store and summarization controller
//!
//! The graph owns every node, edge, group, and summary edge. All references
//! between them are index handles into these stores, so the parent/child and
//! node/edge back-references never form ownership cycles.
//!
//! Lifecycle:
//! 1. bulk insert with [`BaseGraph::add_node`] / [`BaseGraph::add_edge`]
//! 2. [`BaseGraph::summarization_begin`] creates the root group
//! 3. groups are created and nodes moved between them
//! 4. [`BaseGraph::summarization_end`] freezes the tree and assigns final
//!    indices to the internal summary edges synthesized while grouping

use super::cache::{CacheStats, SummaryCache};
use super::ids::{Direction, EdgeHandle, EdgeIndex, NodeId, NodeIndex, SummaryEdgeId};
use super::node::{Edge, Node, SummaryEdge};
use crate::config::SummaryConfig;
use crate::error::{Error, Result};
use crate::overlay::OverlayRegistry;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// A provenance graph with an optional summary tree over its nodes
#[derive(Debug, Default)]
pub struct BaseGraph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) groups: Vec<NodeIndex>,
    pub(crate) ids: HashMap<NodeId, NodeIndex>,
    pub(crate) root: Option<NodeIndex>,
    pub(crate) summarizing: bool,
    pub(crate) next_group_id: u64,
    pub(crate) cache: RwLock<SummaryCache>,
    pub(crate) overlays: OverlayRegistry,
    pub(crate) config: SummaryConfig,
}

impl BaseGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with summary maintenance settings
    pub fn with_config(config: SummaryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Summary maintenance settings
    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Insertion
    // ---------------------------------------------------------------------

    /// Append a base node, returning its dense index
    pub fn add_node(&mut self, id: impl Into<NodeId>, label: impl Into<String>) -> Result<NodeIndex> {
        self.ensure_unsummarized("add a node")?;
        let id = id.into();
        if self.ids.contains_key(&id) {
            return Err(Error::invalid_argument(format!("duplicate node id {}", id)));
        }

        let index = NodeIndex(self.nodes.len());
        self.nodes.push(Node::new_base(index, id, label.into()));
        self.ids.insert(id, index);
        self.next_group_id = self.next_group_id.max(id.0.saturating_add(1));
        Ok(index)
    }

    /// Append a base edge between two base nodes of this graph
    pub fn add_edge(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        label: Option<String>,
    ) -> Result<EdgeIndex> {
        self.ensure_unsummarized("add an edge")?;
        for endpoint in [from, to] {
            if endpoint.0 >= self.nodes.len() {
                return Err(Error::invalid_argument(format!(
                    "edge endpoint {} does not belong to this graph",
                    endpoint
                )));
            }
        }

        let index = EdgeIndex(self.edges.len());
        self.edges.push(Edge {
            index,
            from,
            to,
            label,
        });
        self.nodes[from.0].outgoing.insert(index);
        self.nodes[to.0].incoming.insert(index);
        Ok(index)
    }

    /// Set a string attribute on a node
    pub fn set_attribute(
        &mut self,
        node: NodeIndex,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        self.require_node_mut(node)?
            .attributes
            .insert(key.into(), value.into());
        Ok(())
    }

    /// Replace a node's label
    pub fn set_label(&mut self, node: NodeIndex, label: impl Into<String>) -> Result<()> {
        self.require_node_mut(node)?.label = label.into();
        Ok(())
    }

    /// Show or hide a node
    pub fn set_visible(&mut self, node: NodeIndex, visible: bool) -> Result<()> {
        self.require_node_mut(node)?.visible = visible;
        Ok(())
    }

    fn ensure_unsummarized(&self, what: &str) -> Result<()> {
        if self.groups.is_empty() {
            Ok(())
        } else {
            Err(Error::state(format!(
                "cannot {} after summarization has begun",
                what
            )))
        }
    }

    pub(crate) fn ensure_summarizing(&self, what: &str) -> Result<()> {
        if self.summarizing {
            Ok(())
        } else {
            Err(Error::state(format!(
                "cannot {} while summarization is not active",
                what
            )))
        }
    }

    // ---------------------------------------------------------------------
    // Lookup
    // ---------------------------------------------------------------------

    /// Node by index
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.0)
    }

    /// Node by external id
    pub fn node_by_id(&self, id: NodeId) -> Option<&Node> {
        self.resolve(id).and_then(|index| self.node(index))
    }

    /// Dense index for an external id
    pub fn resolve(&self, id: NodeId) -> Option<NodeIndex> {
        self.ids.get(&id).copied()
    }

    /// Base edge by index
    pub fn edge(&self, index: EdgeIndex) -> Option<&Edge> {
        self.edges.get(index.0)
    }

    /// Every node (base nodes first, then groups) in index order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Base nodes in index order
    pub fn base_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| !n.is_group())
    }

    /// Every base edge in index order
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Number of nodes including groups
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of base nodes
    pub fn base_node_count(&self) -> usize {
        self.nodes.len() - self.groups.len()
    }

    /// Number of base edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Groups in creation order
    pub fn groups(&self) -> &[NodeIndex] {
        &self.groups
    }

    /// Root group, once summarization has begun
    pub fn root(&self) -> Option<NodeIndex> {
        self.root
    }

    /// True between `summarization_begin` and `summarization_end`
    pub fn is_summarizing(&self) -> bool {
        self.summarizing
    }

    /// Named numeric overlays
    pub fn overlays(&self) -> &OverlayRegistry {
        &self.overlays
    }

    /// Named numeric overlays for writing
    pub fn overlays_mut(&mut self) -> &mut OverlayRegistry {
        &mut self.overlays
    }

    pub(crate) fn require_node(&self, index: NodeIndex) -> Result<&Node> {
        self.nodes
            .get(index.0)
            .ok_or_else(|| Error::invalid_argument(format!("node {} does not belong to this graph", index)))
    }

    fn require_node_mut(&mut self, index: NodeIndex) -> Result<&mut Node> {
        self.nodes
            .get_mut(index.0)
            .ok_or_else(|| Error::invalid_argument(format!("node {} does not belong to this graph", index)))
    }

    pub(crate) fn require_group(&self, index: NodeIndex) -> Result<&Node> {
        let node = self.require_node(index)?;
        if node.is_group() {
            Ok(node)
        } else {
            Err(Error::invalid_argument(format!("node {} is not a group", index)))
        }
    }

    // ---------------------------------------------------------------------
    // Summarization lifecycle
    // ---------------------------------------------------------------------

    /// Group every base node under a freshly created root.
    ///
    /// One-time bootstrap; fails if a root already exists.
    pub fn create_root_summary_node(&mut self) -> Result<NodeIndex> {
        if self.root.is_some() {
            return Err(Error::state("root summary node already exists"));
        }

        let base: Vec<NodeIndex> = (0..self.nodes.len()).map(NodeIndex).collect();
        let root = self.push_group("root".to_string())?;
        for child in base {
            let node = &mut self.nodes[child.0];
            node.parent = Some(root);
            node.depth = 1;
        }
        if let Some(children) = self.nodes[root.0].children_mut() {
            children.extend((0..root.0).map(NodeIndex));
        }
        self.root = Some(root);
        Ok(root)
    }

    /// Start (or resume) summarization. Idempotent.
    pub fn summarization_begin(&mut self) -> Result<NodeIndex> {
        let root = match self.root {
            Some(root) => root,
            None => self.create_root_summary_node()?,
        };
        if !self.summarizing {
            self.summarizing = true;
            tracing::info!(
                nodes = self.base_node_count(),
                edges = self.edges.len(),
                groups = self.groups.len(),
                "summarization started"
            );
        }
        Ok(root)
    }

    /// Freeze the tree and register the internal summary edges of every
    /// group, in pre-order of the groups.
    ///
    /// Registered edges get final indices `edge_count() + position`.
    /// Returns the number of registered summary edges.
    pub fn summarization_end(&mut self) -> Result<usize> {
        let root = self
            .root
            .ok_or_else(|| Error::state("summarization was never started"))?;
        // fills the per-group memo, reusing pair edges synthesized by lookups
        let internal = self
            .groups_preorder(root)
            .into_iter()
            .map(|group| self.internal_edges(group))
            .collect::<Result<Vec<_>>>()?;
        let base_edges = self.edges.len();

        let cache = self.cache.get_mut();
        cache.registered.clear();
        cache.final_index.clear();
        for handles in internal {
            for handle in handles.iter() {
                if let EdgeHandle::Summary(id) = handle {
                    if !cache.final_index.contains_key(id) {
                        cache.final_index.insert(*id, base_edges + cache.registered.len());
                        cache.registered.push(*id);
                    }
                }
            }
        }
        let registered = cache.registered.len();

        self.summarizing = false;
        tracing::info!(
            groups = self.groups.len(),
            summary_edges = registered,
            "summarization ended"
        );
        Ok(registered)
    }

    /// Group ids continue above the largest base id and stop at `u64::MAX`
    fn push_group(&mut self, label: String) -> Result<NodeIndex> {
        let id = NodeId(self.next_group_id);
        if self.ids.contains_key(&id) {
            return Err(Error::state(format!(
                "no group id left above node id {}",
                id
            )));
        }
        self.next_group_id = self.next_group_id.saturating_add(1);

        let index = NodeIndex(self.nodes.len());
        self.nodes.push(Node::new_group(index, id, label));
        self.ids.insert(id, index);
        self.groups.push(index);
        Ok(index)
    }

    /// Create an empty group under `parent`
    pub fn create_group(&mut self, parent: NodeIndex, label: impl Into<String>) -> Result<NodeIndex> {
        self.ensure_summarizing("create a group")?;
        self.require_group(parent)?;
        let group = self.push_group(label.into())?;
        self.add_child(parent, group)?;
        Ok(group)
    }

    // ---------------------------------------------------------------------
    // Moves
    // ---------------------------------------------------------------------

    /// Move `node` from its parent into `to`, a sibling group
    pub fn move_node_from_parent(&mut self, node: NodeIndex, to: NodeIndex) -> Result<()> {
        self.ensure_summarizing("move a node")?;
        let from = self
            .require_node(node)?
            .parent
            .ok_or_else(|| Error::invalid_argument(format!("node {} has no parent", node)))?;
        self.require_group(to)?;
        if to == node || self.nodes[to.0].parent != Some(from) {
            return Err(Error::invalid_argument(format!(
                "group {} is not a sibling of node {}",
                to, node
            )));
        }
        self.move_node(node, from, to)
    }

    /// Move `node` from `from` down into `to`, which lies inside `from`
    pub fn move_node_from_ancestor(
        &mut self,
        node: NodeIndex,
        from: NodeIndex,
        to: NodeIndex,
    ) -> Result<()> {
        self.ensure_summarizing("move a node")?;
        self.check_source(node, from)?;
        self.require_group(to)?;
        if !self.contains(from, to) {
            return Err(Error::invalid_argument(format!(
                "group {} is not inside group {}",
                to, from
            )));
        }
        if self.contained_in(to, node) {
            return Err(Error::invalid_argument(format!(
                "cannot move node {} into its own subtree",
                node
            )));
        }
        self.move_node(node, from, to)
    }

    /// Move `node` from `from` up into `to`, an ancestor of `from`
    pub fn move_node_from_child(
        &mut self,
        node: NodeIndex,
        from: NodeIndex,
        to: NodeIndex,
    ) -> Result<()> {
        self.ensure_summarizing("move a node")?;
        self.check_source(node, from)?;
        self.require_group(to)?;
        if !self.contains(to, from) {
            return Err(Error::invalid_argument(format!(
                "group {} is not an ancestor of group {}",
                to, from
            )));
        }
        self.move_node(node, from, to)
    }

    fn check_source(&self, node: NodeIndex, from: NodeIndex) -> Result<()> {
        self.require_group(from)?;
        if self.require_node(node)?.parent != Some(from) {
            return Err(Error::invalid_argument(format!(
                "node {} is not a child of group {}",
                node, from
            )));
        }
        Ok(())
    }

    /// Re-parent `node` and reclassify each of its crossing edges on every
    /// group whose closure lost or gained it.
    fn move_node(&mut self, node: NodeIndex, from: NodeIndex, to: NodeIndex) -> Result<()> {
        let lca = self
            .lowest_common_ancestor(from, to)
            .ok_or_else(|| Error::corrupt(format!("groups {} and {} share no root", from, to)))?;
        let losing = self.chain_below(from, lca);
        let gaining = self.chain_below(to, lca);

        for direction in [Direction::Outgoing, Direction::Incoming] {
            let crossing: Vec<EdgeIndex> = self.nodes[node.0].edges(direction).iter().copied().collect();
            for edge in crossing {
                let other = self.edges[edge.0].endpoint(direction);
                if self.contained_in(other, node) {
                    continue;
                }
                for &group in &losing {
                    if self.contained_in(other, group) {
                        // now enters/leaves the group from outside
                        self.nodes[group.0].edges_mut(direction.reverse()).insert(edge);
                    } else {
                        self.nodes[group.0].edges_mut(direction).remove(&edge);
                    }
                }
                for &group in &gaining {
                    if self.contained_in(other, group) {
                        // both endpoints inside now
                        self.nodes[group.0].edges_mut(direction.reverse()).remove(&edge);
                    } else {
                        self.nodes[group.0].edges_mut(direction).insert(edge);
                    }
                }
            }
        }

        self.remove_child(from, node)?;
        self.add_child(to, node)?;
        self.refresh_depths(node);

        let closure_changed: HashSet<NodeIndex> = losing.iter().chain(gaining.iter()).copied().collect();
        let mut children_changed = closure_changed.clone();
        children_changed.extend([from, to, lca]);
        self.cache
            .get_mut()
            .invalidate(&closure_changed, &children_changed);

        tracing::debug!(
            node = node.0,
            from = from.0,
            to = to.0,
            levels = losing.len() + gaining.len(),
            "moved node"
        );

        if self.config.verify_after_mutation {
            self.check_consistency()?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Edge lookup
    // ---------------------------------------------------------------------

    /// Logical edge from `from` to `to`.
    ///
    /// Between two base nodes this is a base edge. Otherwise it is the
    /// memoized summary edge for the pair, synthesized on first request from
    /// every base edge leading from `from`'s closure into `to`'s closure.
    /// Returns `None` when no underlying edge exists.
    pub fn get_edge_ext(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeHandle> {
        let from_node = self.nodes.get(from.0)?;
        let to_node = self.nodes.get(to.0)?;
        if !from_node.is_group() && !to_node.is_group() {
            return self.find_base_edge(from, to).map(EdgeHandle::Base);
        }

        {
            let cache = self.cache.read();
            if let Some(id) = cache.pairs.get(&(from, to)).copied() {
                cache.pair_hits.fetch_add(1, Ordering::Relaxed);
                return Some(EdgeHandle::Summary(id));
            }
        }

        let members = self.fan_in(from, to);
        if members.is_empty() {
            return None;
        }
        let label = self.shared_label(&members);
        let id = self.cache.write().intern(from, to, members, label);
        Some(EdgeHandle::Summary(id))
    }

    fn find_base_edge(&self, from: NodeIndex, to: NodeIndex) -> Option<EdgeIndex> {
        let outgoing = &self.nodes[from.0].outgoing;
        let incoming = &self.nodes[to.0].incoming;
        if outgoing.len() <= incoming.len() {
            outgoing.iter().find(|e| self.edges[e.0].to == to).copied()
        } else {
            incoming.iter().find(|e| self.edges[e.0].from == from).copied()
        }
    }

    /// Every base edge from `from`'s closure into `to`'s closure
    fn fan_in(&self, from: NodeIndex, to: NodeIndex) -> Vec<EdgeIndex> {
        let mut members: Vec<EdgeIndex> = self
            .leaves(from)
            .into_iter()
            .flat_map(|leaf| self.nodes[leaf.0].outgoing.iter().copied())
            .filter(|e| self.contained_in(self.edges[e.0].to, to))
            .collect();
        members.sort_unstable();
        members.dedup();
        members
    }

    pub(crate) fn shared_label(&self, members: &[EdgeIndex]) -> Option<String> {
        let (first, rest) = members.split_first()?;
        let label = self.edges[first.0].label.as_ref()?;
        rest.iter()
            .all(|e| self.edges[e.0].label.as_ref() == Some(label))
            .then(|| label.clone())
    }

    /// Endpoints of a logical edge
    pub fn edge_endpoints(&self, handle: EdgeHandle) -> Option<(NodeIndex, NodeIndex)> {
        match handle {
            EdgeHandle::Base(e) => self.edge(e).map(|e| (e.from, e.to)),
            EdgeHandle::Summary(s) => self.summary_edge(s).map(|s| (s.from, s.to)),
        }
    }

    /// Base edges behind a logical edge
    pub fn underlying_edges(&self, handle: EdgeHandle) -> Vec<EdgeIndex> {
        match handle {
            EdgeHandle::Base(e) if e.0 < self.edges.len() => vec![e],
            EdgeHandle::Base(_) => Vec::new(),
            EdgeHandle::Summary(s) => self
                .summary_edge(s)
                .map(|s| s.members.clone())
                .unwrap_or_default(),
        }
    }

    /// Synthesized summary edge by arena slot
    pub fn summary_edge(&self, id: SummaryEdgeId) -> Option<Arc<SummaryEdge>> {
        self.cache.read().get(id)
    }

    /// Final index assigned by the last `summarization_end`
    pub fn summary_edge_index(&self, id: SummaryEdgeId) -> Option<usize> {
        self.cache.read().final_index.get(&id).copied()
    }

    /// Summary edges registered by the last `summarization_end`, in final order
    pub fn registered_summary_edges(&self) -> Vec<SummaryEdgeId> {
        self.cache.read().registered.clone()
    }

    /// Cache usage counters
    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read();
        CacheStats {
            pair_hits: cache.pair_hits.load(Ordering::Relaxed),
            ..cache.stats
        }
    }

    // ---------------------------------------------------------------------
    // Structure checks
    // ---------------------------------------------------------------------

    /// Root of the base graph if it is a tree in the given orientation.
    ///
    /// With `Direction::Outgoing` parents point at their children. Requires
    /// `|nodes| == |edges| + 1`, exactly one node without a parent edge, no
    /// node with more than one, and every node reachable exactly once.
    pub fn find_tree_root(&self, direction: Direction) -> Option<NodeIndex> {
        let count = self.base_node_count();
        if count == 0 || count != self.edges.len() + 1 {
            return None;
        }

        let parent_side = direction.reverse();
        let mut root = None;
        for node in self.base_nodes() {
            match node.edges(parent_side).len() {
                0 => {
                    if root.replace(node.index).is_some() {
                        return None;
                    }
                }
                1 => {}
                _ => return None,
            }
        }
        let root = root?;

        let mut visited = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([root]);
        visited[root.0] = true;
        let mut reached = 1;
        while let Some(current) = queue.pop_front() {
            for edge in self.nodes[current.0].edges(direction) {
                let next = self.edges[edge.0].endpoint(direction);
                if visited[next.0] {
                    return None;
                }
                visited[next.0] = true;
                reached += 1;
                queue.push_back(next);
            }
        }

        (reached == count).then_some(root)
    }

    /// Tree root in either orientation, trying parent-to-child edges first
    pub fn find_tree_root_any(&self) -> Option<(NodeIndex, Direction)> {
        [Direction::Outgoing, Direction::Incoming]
            .into_iter()
            .find_map(|d| self.find_tree_root(d).map(|root| (root, d)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: u64) -> (BaseGraph, Vec<NodeIndex>) {
        let mut graph = BaseGraph::new();
        let nodes: Vec<_> = (0..n)
            .map(|i| graph.add_node(i + 1, format!("n{}", i + 1)).unwrap())
            .collect();
        for pair in nodes.windows(2) {
            graph.add_edge(pair[0], pair[1], None).unwrap();
        }
        (graph, nodes)
    }

    #[test]
    fn test_sequential_indices() {
        let (graph, nodes) = chain(3);
        assert_eq!(nodes, vec![NodeIndex(0), NodeIndex(1), NodeIndex(2)]);
        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.resolve(NodeId(2)), Some(NodeIndex(1)));
        assert_eq!(graph.node_by_id(NodeId(3)).map(|n| n.label()), Some("n3"));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut graph = BaseGraph::new();
        graph.add_node(7u64, "a").unwrap();
        let err = graph.add_node(7u64, "b").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_foreign_endpoint_rejected() {
        let (mut graph, _) = chain(2);
        let err = graph.add_edge(NodeIndex(0), NodeIndex(9), None).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_insert_after_summarization_fails() {
        let (mut graph, nodes) = chain(2);
        graph.summarization_begin().unwrap();
        assert!(matches!(graph.add_node(99u64, "late"), Err(Error::State(_))));
        assert!(matches!(
            graph.add_edge(nodes[1], nodes[0], None),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn test_root_groups_all_base_nodes() {
        let (mut graph, nodes) = chain(3);
        let root = graph.summarization_begin().unwrap();
        assert_eq!(root, NodeIndex(3));
        let root_node = graph.node(root).unwrap();
        assert_eq!(root_node.depth(), 0);
        assert_eq!(root_node.children().unwrap().len(), 3);
        for n in nodes {
            assert_eq!(graph.node(n).unwrap().parent(), Some(root));
            assert_eq!(graph.node(n).unwrap().depth(), 1);
        }
        // group ids never collide with base ids
        assert!(root_node.id().value() > 3);
    }

    #[test]
    fn test_group_ids_exhausted_at_max_base_id() {
        let mut graph = BaseGraph::new();
        let first = graph.add_node(1u64, "first").unwrap();
        let last = graph.add_node(u64::MAX, "last").unwrap();
        graph.add_edge(first, last, None).unwrap();

        let err = graph.summarization_begin().unwrap_err();
        assert!(matches!(err, Error::State(_)));
        assert_eq!(graph.root(), None);
        assert!(graph.groups().is_empty());
        assert_eq!(graph.resolve(NodeId(u64::MAX)), Some(last));
    }

    #[test]
    fn test_last_group_id_is_max() {
        let mut graph = BaseGraph::new();
        graph.add_node(u64::MAX - 1, "a").unwrap();
        let root = graph.summarization_begin().unwrap();
        assert_eq!(graph.node(root).unwrap().id(), NodeId(u64::MAX));

        let err = graph.create_group(root, "g").unwrap_err();
        assert!(matches!(err, Error::State(_)));
        assert_eq!(graph.groups(), &[root]);
        assert_eq!(graph.resolve(NodeId(u64::MAX)), Some(root));
        graph.check_consistency().unwrap();
    }

    #[test]
    fn test_memo_hit_under_shared_access() {
        let (mut graph, nodes) = chain(3);
        let root = graph.summarization_begin().unwrap();
        let group = graph.create_group(root, "g").unwrap();
        graph.move_node_from_parent(nodes[1], group).unwrap();
        graph.summarization_end().unwrap();
        let handle = graph.get_edge_ext(nodes[0], group).unwrap();
        let hits = graph.cache_stats().pair_hits;

        // a concurrent reader holding the cache does not block memo hits
        let reader = graph.cache.read();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| assert_eq!(graph.get_edge_ext(nodes[0], group), Some(handle)));
            }
        });
        drop(reader);
        assert_eq!(graph.cache_stats().pair_hits, hits + 4);
    }

    #[test]
    fn test_begin_is_idempotent() {
        let (mut graph, _) = chain(2);
        let first = graph.summarization_begin().unwrap();
        let second = graph.summarization_begin().unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.groups().len(), 1);
        assert!(matches!(
            graph.create_root_summary_node(),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn test_move_requires_active_summarization() {
        let (mut graph, nodes) = chain(2);
        let root = graph.summarization_begin().unwrap();
        let group = graph.create_group(root, "g").unwrap();
        graph.summarization_end().unwrap();
        assert!(matches!(
            graph.move_node_from_parent(nodes[0], group),
            Err(Error::State(_))
        ));
    }

    #[test]
    fn test_move_from_wrong_source_fails() {
        let (mut graph, nodes) = chain(3);
        let root = graph.summarization_begin().unwrap();
        let g1 = graph.create_group(root, "g1").unwrap();
        let g2 = graph.create_group(root, "g2").unwrap();
        graph.move_node_from_parent(nodes[0], g1).unwrap();

        // nodes[1] is a child of root, not g1
        let err = graph.move_node_from_ancestor(nodes[1], g1, g2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        // g2 is not inside g1
        let err = graph.move_node_from_ancestor(nodes[0], g1, g2).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_get_edge_ext_between_base_nodes() {
        let (graph, nodes) = chain(3);
        assert_eq!(
            graph.get_edge_ext(nodes[0], nodes[1]),
            Some(EdgeHandle::Base(EdgeIndex(0)))
        );
        assert_eq!(graph.get_edge_ext(nodes[0], nodes[2]), None);
        assert_eq!(graph.get_edge_ext(nodes[1], nodes[0]), None);
    }

    #[test]
    fn test_find_tree_root() {
        // 1 -> 2, 1 -> 3, 3 -> 4
        let mut graph = BaseGraph::new();
        let n: Vec<_> = (1..=4u64).map(|i| graph.add_node(i, "").unwrap()).collect();
        graph.add_edge(n[0], n[1], None).unwrap();
        graph.add_edge(n[0], n[2], None).unwrap();
        graph.add_edge(n[2], n[3], None).unwrap();

        assert_eq!(graph.find_tree_root(Direction::Outgoing), Some(n[0]));
        // reversed, node 1 would have two parents
        assert_eq!(graph.find_tree_root(Direction::Incoming), None);
        assert_eq!(
            graph.find_tree_root_any(),
            Some((n[0], Direction::Outgoing))
        );
    }

    #[test]
    fn test_find_tree_root_rejects_cycle_and_forest() {
        // 1 -> 2 -> 3 -> 2 plus isolated 4: edge count matches but no tree
        let mut graph = BaseGraph::new();
        let n: Vec<_> = (1..=4u64).map(|i| graph.add_node(i, "").unwrap()).collect();
        graph.add_edge(n[0], n[1], None).unwrap();
        graph.add_edge(n[1], n[2], None).unwrap();
        graph.add_edge(n[2], n[1], None).unwrap();
        assert_eq!(graph.find_tree_root(Direction::Outgoing), None);

        let (chain_graph, chain_nodes) = chain(4);
        assert_eq!(
            chain_graph.find_tree_root(Direction::Incoming),
            Some(chain_nodes[3])
        );
    }

    #[test]
    fn test_attributes_and_visibility() {
        let (mut graph, nodes) = chain(1);
        graph.set_attribute(nodes[0], "type", "process").unwrap();
        graph.set_visible(nodes[0], false).unwrap();
        let node = graph.node(nodes[0]).unwrap();
        assert_eq!(node.attribute("type"), Some("process"));
        assert!(!node.is_visible());
        assert!(graph.set_visible(NodeIndex(42), true).is_err());
    }
}
