//! Property tests for summary tree and traversal invariants
//!
//! Random graphs and random move sequences; after every sequence the tree
//! must satisfy the depth/parent rules, crossing sets must pass the
//! consistency check, and every logical edge must agree with a brute-force
//! scan of the base edges.

use proptest::prelude::*;
use provmap_core::traversal::traverse;
use provmap_core::{BaseGraph, BaseView, EdgeIndex, NodeIndex, TraversalQuery};
use std::collections::BTreeSet;

type Op = (u8, usize, usize);

fn build(nodes: usize, edges: &[(usize, usize)]) -> BaseGraph {
    let mut graph = BaseGraph::new();
    let index: Vec<_> = (0..nodes)
        .map(|i| graph.add_node(i as u64 * 10 + 1, format!("v{}", i)).unwrap())
        .collect();
    for &(from, to) in edges {
        graph.add_edge(index[from], index[to], None).unwrap();
    }
    graph
}

fn apply(graph: &mut BaseGraph, ops: &[Op]) {
    let root = graph.summarization_begin().unwrap();
    for &(op, a, b) in ops {
        let groups = graph.groups().to_vec();
        if op == 0 {
            let parent = groups[b % groups.len()];
            graph.create_group(parent, "g").unwrap();
            continue;
        }

        let node = NodeIndex(a % graph.node_count());
        if node == root {
            continue;
        }
        let Some(parent) = graph.node(node).and_then(|n| n.parent()) else {
            continue;
        };

        match op {
            1 => {
                let siblings: Vec<_> = groups
                    .iter()
                    .copied()
                    .filter(|g| *g != node && graph.node(*g).and_then(|n| n.parent()) == Some(parent))
                    .collect();
                if !siblings.is_empty() {
                    graph.move_node_from_parent(node, siblings[b % siblings.len()]).unwrap();
                }
            }
            2 => {
                let ancestors = graph.ancestors(parent);
                if !ancestors.is_empty() {
                    graph
                        .move_node_from_child(node, parent, ancestors[b % ancestors.len()])
                        .unwrap();
                }
            }
            _ => {
                let inside: Vec<_> = groups
                    .iter()
                    .copied()
                    .filter(|g| graph.contains(parent, *g) && !graph.contained_in(*g, node))
                    .collect();
                if !inside.is_empty() {
                    graph
                        .move_node_from_ancestor(node, parent, inside[b % inside.len()])
                        .unwrap();
                }
            }
        }
    }
}

fn brute_force_members(graph: &BaseGraph, from: NodeIndex, to: NodeIndex) -> Vec<EdgeIndex> {
    graph
        .edges()
        .filter(|e| graph.contained_in(e.from(), from) && graph.contained_in(e.to(), to))
        .map(|e| e.index())
        .collect()
}

fn reachable(graph: &BaseGraph, start: NodeIndex) -> BTreeSet<NodeIndex> {
    let mut seen = BTreeSet::from([start]);
    let mut stack = vec![start];
    while let Some(current) = stack.pop() {
        for edge in graph.edges().filter(|e| e.from() == current) {
            if seen.insert(edge.to()) {
                stack.push(edge.to());
            }
        }
    }
    seen
}

fn graph_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..10).prop_flat_map(|n| (Just(n), prop::collection::vec((0..n, 0..n), 0..24)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_moves_preserve_tree_invariants(
        (nodes, edges) in graph_strategy(),
        ops in prop::collection::vec((0u8..4, any::<usize>(), any::<usize>()), 0..40),
    ) {
        let mut graph = build(nodes, &edges);
        apply(&mut graph, &ops);

        prop_assert!(graph.check_consistency().is_ok());
        for node in graph.nodes() {
            match node.parent() {
                None => prop_assert_eq!(node.depth(), 0),
                Some(parent) => {
                    let parent = graph.node(parent).unwrap();
                    prop_assert_eq!(node.depth(), parent.depth() + 1);
                    prop_assert!(parent.children().unwrap().contains(&node.index()));
                }
            }
        }
        for &group in graph.groups() {
            for child in graph.node(group).unwrap().children().unwrap() {
                prop_assert_eq!(graph.node(*child).unwrap().parent(), Some(group));
            }
        }
    }

    #[test]
    fn prop_logical_edges_match_brute_force(
        (nodes, edges) in graph_strategy(),
        ops in prop::collection::vec((0u8..4, any::<usize>(), any::<usize>()), 0..40),
        probes in prop::collection::vec((any::<usize>(), any::<usize>()), 1..12),
    ) {
        let mut graph = build(nodes, &edges);
        apply(&mut graph, &ops[..ops.len() / 2]);

        // warm the caches, then mutate some more so invalidation is exercised
        for &group in graph.groups() {
            graph.internal_edges(group).unwrap();
        }
        for &(a, b) in &probes {
            let count = graph.node_count();
            graph.get_edge_ext(NodeIndex(a % count), NodeIndex(b % count));
        }
        apply(&mut graph, &ops[ops.len() / 2..]);

        let count = graph.node_count();
        for &(a, b) in &probes {
            let (from, to) = (NodeIndex(a % count), NodeIndex(b % count));
            let expected = brute_force_members(&graph, from, to);
            let both_base = !graph.node(from).unwrap().is_group() && !graph.node(to).unwrap().is_group();
            match graph.get_edge_ext(from, to) {
                None => prop_assert!(expected.is_empty()),
                Some(handle) if both_base => {
                    prop_assert!(expected.contains(&handle.as_base().unwrap()));
                }
                Some(handle) => {
                    let mut members = graph.underlying_edges(handle);
                    members.sort_unstable();
                    prop_assert_eq!(members, expected);
                }
            }
        }
    }

    #[test]
    fn prop_traversal_respects_cap(
        (nodes, edges) in graph_strategy(),
        start in any::<usize>(),
        cap in 1usize..6,
    ) {
        let graph = build(nodes, &edges);
        let view = BaseView::new(&graph);
        let start_id = (start % nodes) as u64 * 10 + 1;

        let capped = traverse(&view, &TraversalQuery::descendants(start_id).with_max_result_size(Some(cap)), None);
        prop_assert!(capped.len() <= cap);
        prop_assert!(!capped.is_empty());

        let full = traverse(&view, &TraversalQuery::descendants(start_id), None);
        let start_index = graph.resolve(start_id.into()).unwrap();
        prop_assert_eq!(full.nodes(), &reachable(&graph, start_index));
        prop_assert!(capped.nodes().is_subset(full.nodes()));
        prop_assert_eq!(capped.truncated(), full.len() > cap);
    }
}
