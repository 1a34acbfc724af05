//! Summary tree operations on [`BaseGraph`]
//!
//! Ancestor-chain walks, child bookkeeping, the lazily memoized internal-edge
//! sets of groups, and the structural consistency check.

use super::base::BaseGraph;
use super::ids::{EdgeHandle, EdgeIndex, NodeIndex};
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

impl BaseGraph {
    /// True when `node` lies strictly inside `group`
    pub fn contains(&self, group: NodeIndex, node: NodeIndex) -> bool {
        group != node && self.contained_in(node, group)
    }

    /// True when `node` is `group` or lies inside it
    pub fn contained_in(&self, node: NodeIndex, group: NodeIndex) -> bool {
        let mut current = Some(node);
        while let Some(index) = current {
            if index == group {
                return true;
            }
            current = self.nodes.get(index.0).and_then(|n| n.parent);
        }
        false
    }

    /// Ancestors of `node`, nearest first
    pub fn ancestors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = self.nodes.get(node.0).and_then(|n| n.parent);
        while let Some(index) = current {
            chain.push(index);
            current = self.nodes.get(index.0).and_then(|n| n.parent);
        }
        chain
    }

    /// Immediate child of `group` whose closure holds `node`
    pub fn child_toward(&self, group: NodeIndex, node: NodeIndex) -> Option<NodeIndex> {
        let mut current = node;
        loop {
            let parent = self.nodes.get(current.0)?.parent?;
            if parent == group {
                return Some(current);
            }
            current = parent;
        }
    }

    /// Base nodes in the closure of `node` (the node itself if it is base)
    pub fn leaves(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut leaves = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match self.nodes.get(current.0).and_then(|n| n.children()) {
                Some(children) => stack.extend(children.iter().copied()),
                None if current.0 < self.nodes.len() => leaves.push(current),
                None => {}
            }
        }
        leaves.sort_unstable();
        leaves
    }

    pub(crate) fn groups_preorder(&self, root: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if let Some(children) = self.nodes[current.0].children() {
                order.push(current);
                stack.extend(children.iter().rev().copied());
            }
        }
        order
    }

    pub(crate) fn lowest_common_ancestor(&self, a: NodeIndex, b: NodeIndex) -> Option<NodeIndex> {
        let mut above_a: HashSet<NodeIndex> = self.ancestors(a).into_iter().collect();
        above_a.insert(a);
        std::iter::once(b)
            .chain(self.ancestors(b))
            .find(|n| above_a.contains(n))
    }

    /// `start` and its ancestors up to, not including, `stop`
    pub(crate) fn chain_below(&self, start: NodeIndex, stop: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut current = Some(start);
        while let Some(index) = current {
            if index == stop {
                break;
            }
            chain.push(index);
            current = self.nodes[index.0].parent;
        }
        chain
    }

    pub(crate) fn refresh_depths(&mut self, node: NodeIndex) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let depth = self.nodes[current.0]
                .parent
                .map_or(0, |p| self.nodes[p.0].depth + 1);
            let entry = &mut self.nodes[current.0];
            entry.depth = depth;
            if let Some(children) = entry.children() {
                stack.extend(children.iter().copied());
            }
        }
    }

    /// Attach a detached node under `group`
    pub(crate) fn add_child(&mut self, group: NodeIndex, child: NodeIndex) -> Result<()> {
        self.ensure_summarizing("add a child")?;
        self.require_group(group)?;
        if let Some(parent) = self.require_node(child)?.parent {
            return Err(Error::invalid_argument(format!(
                "node {} already belongs to group {}",
                child, parent
            )));
        }

        let depth = self.nodes[group.0].depth + 1;
        if let Some(children) = self.nodes[group.0].children_mut() {
            children.insert(child);
        }
        let entry = &mut self.nodes[child.0];
        entry.parent = Some(group);
        entry.depth = depth;
        self.cache.get_mut().invalidate_internal(group);
        Ok(())
    }

    /// Detach `child` from `group`
    pub(crate) fn remove_child(&mut self, group: NodeIndex, child: NodeIndex) -> Result<()> {
        self.ensure_summarizing("remove a child")?;
        let removed = self
            .nodes
            .get_mut(group.0)
            .and_then(|g| g.children_mut())
            .is_some_and(|children| children.remove(&child));
        if !removed {
            return Err(Error::invalid_argument(format!(
                "node {} is not a child of group {}",
                child, group
            )));
        }
        self.nodes[child.0].parent = None;
        self.cache.get_mut().invalidate_internal(group);
        Ok(())
    }

    /// Edges between the immediate children of `group`.
    ///
    /// Underlying edges sharing a (child, child) pair are coalesced into one
    /// summary edge; a lone base edge between two base children is returned
    /// as itself. Memoized until a structural change touches the group.
    pub fn internal_edges(&self, group: NodeIndex) -> Result<Arc<[EdgeHandle]>> {
        let children = self
            .require_group(group)?
            .children()
            .ok_or_else(|| Error::invalid_argument(format!("node {} is not a group", group)))?;
        if let Some(cached) = self.cache.read().internal.get(&group) {
            return Ok(cached.clone());
        }

        let mut pairs: BTreeMap<(NodeIndex, NodeIndex), Vec<EdgeIndex>> = BTreeMap::new();
        for &child in children {
            for &edge in &self.nodes[child.0].outgoing {
                if let Some(target) = self.child_toward(group, self.edges[edge.0].to) {
                    pairs.entry((child, target)).or_default().push(edge);
                }
            }
        }

        let mut cache = self.cache.write();
        if let Some(cached) = cache.internal.get(&group) {
            return Ok(cached.clone());
        }
        let mut handles = Vec::with_capacity(pairs.len());
        for ((from, to), mut members) in pairs {
            members.sort_unstable();
            let both_base = !self.nodes[from.0].is_group() && !self.nodes[to.0].is_group();
            if both_base && members.len() == 1 {
                handles.push(EdgeHandle::Base(members[0]));
            } else {
                let label = self.shared_label(&members);
                handles.push(EdgeHandle::Summary(cache.intern(from, to, members, label)));
            }
        }
        let handles: Arc<[EdgeHandle]> = handles.into();
        cache.internal.insert(group, handles.clone());
        cache.stats.internal_recomputes += 1;
        Ok(handles)
    }

    /// Verify every structural invariant of the graph and its summary tree.
    ///
    /// A failure means the structure is already corrupt; callers must treat
    /// the returned [`Error::Corrupt`] as fatal.
    pub fn check_consistency(&self) -> Result<()> {
        let result = self.verify_structure();
        if let Err(e) = &result {
            tracing::warn!("consistency check failed: {}", e);
        }
        result
    }

    fn verify_structure(&self) -> Result<()> {
        for (position, edge) in self.edges.iter().enumerate() {
            if edge.index.0 != position {
                return Err(Error::corrupt(format!("edge at {} claims index {}", position, edge.index)));
            }
            for endpoint in [edge.from, edge.to] {
                let node = self.nodes.get(endpoint.0).ok_or_else(|| {
                    Error::corrupt(format!("edge {} points outside the graph", edge.index))
                })?;
                if node.is_group() {
                    return Err(Error::corrupt(format!("edge {} ends at group {}", edge.index, endpoint)));
                }
            }
            if !self.nodes[edge.from.0].outgoing.contains(&edge.index)
                || !self.nodes[edge.to.0].incoming.contains(&edge.index)
            {
                return Err(Error::corrupt(format!("edge {} missing from its endpoints", edge.index)));
            }
        }

        for (position, node) in self.nodes.iter().enumerate() {
            if node.index.0 != position {
                return Err(Error::corrupt(format!("node at {} claims index {}", position, node.index)));
            }
            if self.ids.get(&node.id) != Some(&node.index) {
                return Err(Error::corrupt(format!("id map disagrees for node {}", node.index)));
            }
            if node.is_group() {
                continue;
            }
            let own_out = node.outgoing.iter().all(|e| self.edges.get(e.0).is_some_and(|e| e.from == node.index));
            let own_in = node.incoming.iter().all(|e| self.edges.get(e.0).is_some_and(|e| e.to == node.index));
            if !own_out || !own_in {
                return Err(Error::corrupt(format!("node {} lists foreign edges", node.index)));
            }
        }

        let Some(root) = self.root else {
            if !self.groups.is_empty() {
                return Err(Error::corrupt("groups exist without a root"));
            }
            if let Some(node) = self.nodes.iter().find(|n| n.parent.is_some() || n.depth != 0) {
                return Err(Error::corrupt(format!("node {} placed in a tree that does not exist", node.index)));
            }
            return Ok(());
        };

        let root_node = self.require_group(root).map_err(|_| Error::corrupt("root is not a group"))?;
        if root_node.parent.is_some() || root_node.depth != 0 {
            return Err(Error::corrupt("root has a parent or non-zero depth"));
        }

        let mut seen = vec![false; self.nodes.len()];
        seen[root.0] = true;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let parent = &self.nodes[current.0];
            let Some(children) = parent.children() else {
                continue;
            };
            for &child in children {
                let node = self.nodes.get(child.0).ok_or_else(|| {
                    Error::corrupt(format!("group {} lists unknown child {}", current, child))
                })?;
                if node.parent != Some(current) {
                    return Err(Error::corrupt(format!(
                        "child {} of group {} points at parent {:?}",
                        child, current, node.parent
                    )));
                }
                if node.depth != parent.depth + 1 {
                    return Err(Error::corrupt(format!(
                        "node {} has depth {} under parent depth {}",
                        child, node.depth, parent.depth
                    )));
                }
                if seen[child.0] {
                    return Err(Error::corrupt(format!("node {} reachable twice", child)));
                }
                seen[child.0] = true;
                stack.push(child);
            }
        }
        if let Some(orphan) = seen.iter().position(|s| !s) {
            return Err(Error::corrupt(format!("node n{} not reachable from root", orphan)));
        }

        for &group in &self.groups {
            self.verify_crossing(group)?;
        }
        Ok(())
    }

    fn verify_crossing(&self, group: NodeIndex) -> Result<()> {
        let leaves: HashSet<NodeIndex> = self.leaves(group).into_iter().collect();
        let mut expected_out = BTreeSet::new();
        let mut expected_in = BTreeSet::new();
        for leaf in &leaves {
            let node = &self.nodes[leaf.0];
            expected_out.extend(
                node.outgoing
                    .iter()
                    .filter(|e| !leaves.contains(&self.edges[e.0].to))
                    .copied(),
            );
            expected_in.extend(
                node.incoming
                    .iter()
                    .filter(|e| !leaves.contains(&self.edges[e.0].from))
                    .copied(),
            );
        }

        let node = &self.nodes[group.0];
        if node.outgoing != expected_out || node.incoming != expected_in {
            return Err(Error::corrupt(format!(
                "crossing edges of group {} out of date",
                group
            )));
        }
        Ok(())
    }
}
