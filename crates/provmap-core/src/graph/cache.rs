//! Memoized summary edges
//!
//! Lives behind a lock inside [`BaseGraph`](super::BaseGraph) so that lookups
//! through a shared reference can still synthesize and remember edges.

use super::ids::{EdgeHandle, EdgeIndex, NodeIndex, SummaryEdgeId};
use super::node::SummaryEdge;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

/// Counters describing how the summary caches have been used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Summary edges created
    pub summary_edges_synthesized: u64,
    /// `get_edge_ext` lookups answered from the pair memo
    pub pair_hits: u64,
    /// Internal-edge sets computed (first access or after invalidation)
    pub internal_recomputes: u64,
    /// Structural mutations that dropped cache entries
    pub invalidations: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SummaryCache {
    /// Arena of every summary edge ever synthesized; slots are never reused
    pub(crate) edges: Vec<Arc<SummaryEdge>>,
    pub(crate) pairs: HashMap<(NodeIndex, NodeIndex), SummaryEdgeId>,
    pub(crate) internal: HashMap<NodeIndex, Arc<[EdgeHandle]>>,
    /// Global order fixed by `summarization_end`
    pub(crate) registered: Vec<SummaryEdgeId>,
    pub(crate) final_index: HashMap<SummaryEdgeId, usize>,
    pub(crate) stats: CacheStats,
    /// Bumped under the read lock; `stats.pair_hits` stays zero
    pub(crate) pair_hits: AtomicU64,
}

impl SummaryCache {
    /// Memoized edge for a pair, creating it from `members` on a miss
    pub(crate) fn intern(
        &mut self,
        from: NodeIndex,
        to: NodeIndex,
        members: Vec<EdgeIndex>,
        label: Option<String>,
    ) -> SummaryEdgeId {
        if let Some(id) = self.pairs.get(&(from, to)) {
            return *id;
        }
        let id = SummaryEdgeId(self.edges.len());
        tracing::trace!(
            from = from.0,
            to = to.0,
            members = members.len(),
            "synthesized summary edge"
        );
        self.edges.push(Arc::new(SummaryEdge {
            id,
            from,
            to,
            members,
            label,
        }));
        self.pairs.insert((from, to), id);
        self.stats.summary_edges_synthesized += 1;
        id
    }

    /// Drop pair entries touching `closure_changed` and internal sets of
    /// `children_changed`
    pub(crate) fn invalidate(
        &mut self,
        closure_changed: &HashSet<NodeIndex>,
        children_changed: &HashSet<NodeIndex>,
    ) {
        self.pairs
            .retain(|(from, to), _| !closure_changed.contains(from) && !closure_changed.contains(to));
        self.internal
            .retain(|group, _| !children_changed.contains(group));
        self.stats.invalidations += 1;
    }

    pub(crate) fn invalidate_internal(&mut self, group: NodeIndex) {
        self.internal.remove(&group);
    }

    pub(crate) fn get(&self, id: SummaryEdgeId) -> Option<Arc<SummaryEdge>> {
        self.edges.get(id.0).cloned()
    }
}
