//! Per-node attribute overlays
//!
//! Dense, array-backed maps from [`NodeIndex`] to a value. Node indices in a
//! [`BaseGraph`](crate::graph::BaseGraph) are append-only and never reused, so
//! an overlay computed from a graph stays aligned with it for the graph's
//! lifetime. Overlays built against one graph must not be read against another.

use crate::graph::NodeIndex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Dense map from node index to value; `set` grows the backing store
#[derive(Debug, Clone)]
pub struct PerNodeAttribute<T> {
    values: Vec<Option<T>>,
    populated: usize,
}

impl<T> Default for PerNodeAttribute<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PerNodeAttribute<T> {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            populated: 0,
        }
    }

    /// Create an overlay with room for `nodes` entries
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            values: Vec::with_capacity(nodes),
            populated: 0,
        }
    }

    /// Value for a node
    pub fn get(&self, node: NodeIndex) -> Option<&T> {
        self.values.get(node.0).and_then(Option::as_ref)
    }

    /// Store a value, returning the previous one
    pub fn set(&mut self, node: NodeIndex, value: T) -> Option<T> {
        if node.0 >= self.values.len() {
            self.values.resize_with(node.0 + 1, || None);
        }
        let previous = self.values[node.0].replace(value);
        if previous.is_none() {
            self.populated += 1;
        }
        previous
    }

    /// Remove a value
    pub fn remove(&mut self, node: NodeIndex) -> Option<T> {
        let previous = self.values.get_mut(node.0).and_then(Option::take);
        if previous.is_some() {
            self.populated -= 1;
        }
        previous
    }

    /// True when a value is stored for `node`
    pub fn contains(&self, node: NodeIndex) -> bool {
        self.get(node).is_some()
    }

    /// Number of nodes with a value
    pub fn len(&self) -> usize {
        self.populated
    }

    /// True when no node has a value
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Length of the backing array (highest index + 1)
    pub fn extent(&self) -> usize {
        self.values.len()
    }

    /// Drop every value
    pub fn clear(&mut self) {
        self.values.clear();
        self.populated = 0;
    }

    /// Iterate `(node, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &T)> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (NodeIndex(i), v)))
    }
}

/// Overlay over a partially ordered value type with cached extrema.
///
/// The min/max pair is kept up to date when a write cannot move an extremum
/// inward, and otherwise dropped and recomputed by a full scan on the next
/// query. Values that do not compare with themselves (NaN) are ignored.
#[derive(Debug)]
pub struct PerNodeComparable<T> {
    inner: PerNodeAttribute<T>,
    extrema: OnceLock<Option<(T, T)>>,
    scans: AtomicU64,
}

impl<T: PartialOrd + Clone> Default for PerNodeComparable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PartialOrd + Clone> Clone for PerNodeComparable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            extrema: self.extrema.clone(),
            scans: AtomicU64::new(self.scans.load(Ordering::Relaxed)),
        }
    }
}

fn comparable<T: PartialOrd>(value: &T) -> bool {
    value.partial_cmp(value).is_some()
}

impl<T: PartialOrd + Clone> PerNodeComparable<T> {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self {
            inner: PerNodeAttribute::new(),
            extrema: OnceLock::new(),
            scans: AtomicU64::new(0),
        }
    }

    /// Value for a node
    pub fn get(&self, node: NodeIndex) -> Option<&T> {
        self.inner.get(node)
    }

    /// Store a value, returning the previous one
    pub fn set(&mut self, node: NodeIndex, value: T) -> Option<T> {
        let previous = self.inner.set(node, value.clone());
        let mut stale = false;
        if let Some(Some((min, max))) = self.extrema.get_mut() {
            let was_extreme = previous
                .as_ref()
                .is_some_and(|p| *p == *min || *p == *max || !comparable(p));
            if was_extreme {
                stale = true;
            } else if comparable(&value) {
                if value < *min {
                    *min = value.clone();
                }
                if value > *max {
                    *max = value;
                }
            }
        } else if self.extrema.get().is_some() {
            // cached as "no comparable values"; the first write decides
            stale = true;
        }
        if stale {
            self.extrema = OnceLock::new();
        }
        previous
    }

    /// Remove a value
    pub fn remove(&mut self, node: NodeIndex) -> Option<T> {
        let previous = self.inner.remove(node);
        if let (Some(p), Some(Some((min, max)))) = (&previous, self.extrema.get()) {
            if p == min || p == max {
                self.extrema = OnceLock::new();
            }
        }
        previous
    }

    /// Drop every value
    pub fn clear(&mut self) {
        self.inner.clear();
        self.extrema = OnceLock::new();
    }

    /// Smallest comparable value
    pub fn min(&self) -> Option<&T> {
        self.extrema().map(|(min, _)| min)
    }

    /// Largest comparable value
    pub fn max(&self) -> Option<&T> {
        self.extrema().map(|(_, max)| max)
    }

    fn extrema(&self) -> Option<&(T, T)> {
        self.extrema
            .get_or_init(|| {
                self.scans.fetch_add(1, Ordering::Relaxed);
                let mut values = self.inner.iter().map(|(_, v)| v).filter(|v| comparable(*v));
                let first = values.next()?;
                let (mut min, mut max) = (first, first);
                for value in values {
                    if value < min {
                        min = value;
                    }
                    if value > max {
                        max = value;
                    }
                }
                Some((min.clone(), max.clone()))
            })
            .as_ref()
    }

    /// How many full scans the extrema cache has needed so far
    pub fn extrema_scans(&self) -> u64 {
        self.scans.load(Ordering::Relaxed)
    }

    /// Number of nodes with a value
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when no node has a value
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate `(node, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &T)> {
        self.inner.iter()
    }

    /// Underlying dense map
    pub fn as_attribute(&self) -> &PerNodeAttribute<T> {
        &self.inner
    }
}

/// Numeric overlay, the shape centrality results take
pub type NumericOverlay = PerNodeComparable<f64>;

/// Named numeric overlays owned by a graph
#[derive(Debug, Clone, Default)]
pub struct OverlayRegistry {
    overlays: BTreeMap<String, NumericOverlay>,
}

impl OverlayRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an overlay under `name`, returning any overlay it replaced
    pub fn insert(&mut self, name: impl Into<String>, overlay: NumericOverlay) -> Option<NumericOverlay> {
        self.overlays.insert(name.into(), overlay)
    }

    /// Look up an overlay
    pub fn get(&self, name: &str) -> Option<&NumericOverlay> {
        self.overlays.get(name)
    }

    /// Look up an overlay for writing
    pub fn get_mut(&mut self, name: &str) -> Option<&mut NumericOverlay> {
        self.overlays.get_mut(name)
    }

    /// Drop an overlay
    pub fn remove(&mut self, name: &str) -> Option<NumericOverlay> {
        self.overlays.remove(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.overlays.keys().map(String::as_str)
    }

    /// Number of registered overlays
    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_grows_backing_store() {
        let mut overlay = PerNodeAttribute::new();
        assert_eq!(overlay.set(NodeIndex(5), "x"), None);
        assert_eq!(overlay.extent(), 6);
        assert_eq!(overlay.len(), 1);
        assert_eq!(overlay.get(NodeIndex(5)), Some(&"x"));
        assert_eq!(overlay.get(NodeIndex(2)), None);
        assert_eq!(overlay.get(NodeIndex(99)), None);
        assert_eq!(overlay.set(NodeIndex(5), "y"), Some("x"));
        assert_eq!(overlay.len(), 1);
    }

    #[test]
    fn test_remove_and_iter() {
        let mut overlay = PerNodeAttribute::new();
        overlay.set(NodeIndex(0), 1);
        overlay.set(NodeIndex(3), 3);
        overlay.set(NodeIndex(1), 2);
        assert_eq!(overlay.remove(NodeIndex(1)), Some(2));
        assert_eq!(overlay.remove(NodeIndex(1)), None);
        let collected: Vec<_> = overlay.iter().map(|(n, v)| (n.0, *v)).collect();
        assert_eq!(collected, vec![(0, 1), (3, 3)]);
    }

    #[test]
    fn test_extrema_cached_between_queries() {
        let mut overlay = PerNodeComparable::new();
        overlay.set(NodeIndex(0), 3.0);
        overlay.set(NodeIndex(1), -1.0);
        overlay.set(NodeIndex(2), 7.5);

        assert_eq!(overlay.min(), Some(&-1.0));
        assert_eq!(overlay.max(), Some(&7.5));
        assert_eq!(overlay.extrema_scans(), 1);

        // widening write keeps the cache
        overlay.set(NodeIndex(3), 10.0);
        assert_eq!(overlay.max(), Some(&10.0));
        assert_eq!(overlay.extrema_scans(), 1);
    }

    #[test]
    fn test_overwriting_extremum_forces_rescan() {
        let mut overlay = PerNodeComparable::new();
        overlay.set(NodeIndex(0), 1.0);
        overlay.set(NodeIndex(1), 5.0);
        assert_eq!(overlay.max(), Some(&5.0));

        overlay.set(NodeIndex(1), 2.0);
        assert_eq!(overlay.max(), Some(&2.0));
        assert_eq!(overlay.extrema_scans(), 2);

        overlay.remove(NodeIndex(0));
        assert_eq!(overlay.min(), Some(&2.0));
    }

    #[test]
    fn test_nan_is_ignored() {
        let mut overlay = PerNodeComparable::new();
        overlay.set(NodeIndex(0), f64::NAN);
        assert_eq!(overlay.min(), None);
        overlay.set(NodeIndex(1), 4.0);
        assert_eq!(overlay.min(), Some(&4.0));
        assert_eq!(overlay.max(), Some(&4.0));
    }

    #[test]
    fn test_registry() {
        let mut registry = OverlayRegistry::new();
        let mut overlay = NumericOverlay::new();
        overlay.set(NodeIndex(0), 0.5);
        assert!(registry.insert("closeness", overlay).is_none());
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["closeness"]);
        assert_eq!(
            registry.get("closeness").and_then(|o| o.get(NodeIndex(0))),
            Some(&0.5)
        );
        assert!(registry.remove("closeness").is_some());
        assert!(registry.is_empty());
    }
}
