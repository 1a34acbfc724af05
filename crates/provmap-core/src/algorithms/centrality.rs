//! Closeness and betweenness centrality
//!
//! Both start from one [`AllPairs`] run and write a score for every node of
//! the view into a fresh [`NumericOverlay`].

use super::apsp::AllPairs;
use crate::error::Result;
use crate::job::JobContext;
use crate::overlay::NumericOverlay;
use crate::view::{EdgeOrientation, GraphView};

/// Dangalchev closeness: for every node, the sum of `2^-d` over each other
/// node at hop distance `d`. Unreachable nodes contribute nothing.
pub fn closeness<V: GraphView + ?Sized>(
    view: &V,
    orientation: EdgeOrientation,
    ctx: &JobContext,
) -> Result<NumericOverlay> {
    tracing::info!(%orientation, "closeness centrality started");
    let apsp = run_all_pairs(view, orientation, ctx, "closeness")?;
    let n = apsp.len();

    let mut scores = NumericOverlay::new();
    for (i, node) in apsp.nodes().iter().enumerate() {
        cancelled_check(ctx, "closeness")?;
        let score: f64 = (0..n)
            .filter(|j| *j != i)
            .filter_map(|j| apsp.distance_at(i, j))
            .map(|d| (-f64::from(d)).exp2())
            .sum();
        scores.set(*node, score);
    }

    tracing::info!(nodes = n, "closeness centrality finished");
    Ok(scores)
}

/// Approximate betweenness.
///
/// For every ordered pair with a path, the nodes strictly inside the single
/// recorded shortest path each gain `1 / ((n-1)(n-2))`, or half of that when
/// edges are undirected. Pairs joined by several equally short paths still
/// credit only one of them. Views with fewer than three nodes score zero.
pub fn betweenness<V: GraphView + ?Sized>(
    view: &V,
    orientation: EdgeOrientation,
    ctx: &JobContext,
) -> Result<NumericOverlay> {
    tracing::info!(%orientation, "betweenness centrality started");
    let apsp = run_all_pairs(view, orientation, ctx, "betweenness")?;
    let n = apsp.len();

    let mut totals = vec![0.0f64; n];
    if n >= 3 {
        let mut weight = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        if orientation == EdgeOrientation::Undirected {
            weight /= 2.0;
        }

        for source in 0..n {
            cancelled_check(ctx, "betweenness")?;
            for target in (0..n).filter(|t| *t != source) {
                if apsp.distance_at(source, target).is_none() {
                    continue;
                }
                let mut hop = apsp.predecessor_at(source, target);
                while let Some(inner) = hop.filter(|h| *h != source) {
                    totals[inner] += weight;
                    hop = apsp.predecessor_at(source, inner);
                }
            }
        }
    }

    let mut scores = NumericOverlay::new();
    for (node, total) in apsp.nodes().iter().zip(totals) {
        scores.set(*node, total);
    }

    tracing::info!(nodes = n, "betweenness centrality finished");
    Ok(scores)
}

fn run_all_pairs<V: GraphView + ?Sized>(
    view: &V,
    orientation: EdgeOrientation,
    ctx: &JobContext,
    algorithm: &str,
) -> Result<AllPairs> {
    AllPairs::compute(view, orientation, ctx).inspect_err(|e| {
        if e.is_cancelled() {
            tracing::info!(algorithm, "centrality cancelled");
        }
    })
}

fn cancelled_check(ctx: &JobContext, algorithm: &str) -> Result<()> {
    ctx.check_cancelled().inspect_err(|_| tracing::info!(algorithm, "centrality cancelled"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::graph::{BaseGraph, NodeIndex};
    use crate::view::BaseView;
    use approx::assert_relative_eq;

    fn chain(n: u64) -> (BaseGraph, Vec<NodeIndex>) {
        let mut graph = BaseGraph::new();
        let nodes: Vec<_> = (1..=n).map(|i| graph.add_node(i, "").unwrap()).collect();
        for pair in nodes.windows(2) {
            graph.add_edge(pair[0], pair[1], None).unwrap();
        }
        (graph, nodes)
    }

    #[test]
    fn test_closeness_chain() {
        let (graph, n) = chain(4);
        let view = BaseView::new(&graph);
        let scores = closeness(&view, EdgeOrientation::Directed, &JobContext::new()).unwrap();
        assert_relative_eq!(*scores.get(n[0]).unwrap(), 0.5 + 0.25 + 0.125);
        assert_relative_eq!(*scores.get(n[2]).unwrap(), 0.5);
        assert_relative_eq!(*scores.get(n[3]).unwrap(), 0.0);
        assert_relative_eq!(*scores.max().unwrap(), 0.875);
    }

    #[test]
    fn test_closeness_inverted() {
        let (graph, n) = chain(4);
        let view = BaseView::new(&graph);
        let scores = closeness(&view, EdgeOrientation::Inverted, &JobContext::new()).unwrap();
        assert_relative_eq!(*scores.get(n[0]).unwrap(), 0.0);
        assert_relative_eq!(*scores.get(n[3]).unwrap(), 0.875);
    }

    #[test]
    fn test_betweenness_chain() {
        let (graph, n) = chain(4);
        let view = BaseView::new(&graph);
        let scores = betweenness(&view, EdgeOrientation::Directed, &JobContext::new()).unwrap();
        // b sits inside a->c and a->d; weight is 1/6
        assert_relative_eq!(*scores.get(n[1]).unwrap(), 2.0 / 6.0);
        assert_relative_eq!(*scores.get(n[2]).unwrap(), 2.0 / 6.0);
        assert_relative_eq!(*scores.get(n[0]).unwrap(), 0.0);

        let undirected = betweenness(&view, EdgeOrientation::Undirected, &JobContext::new()).unwrap();
        assert_relative_eq!(*undirected.get(n[1]).unwrap(), 2.0 / 6.0);
    }

    #[test]
    fn test_betweenness_small_graph_is_zero() {
        let (graph, n) = chain(2);
        let view = BaseView::new(&graph);
        let scores = betweenness(&view, EdgeOrientation::Directed, &JobContext::new()).unwrap();
        assert_eq!(scores.get(n[0]), Some(&0.0));
        assert_eq!(scores.len(), 2);
    }

    #[test]
    fn test_betweenness_ignores_tied_paths() {
        let mut graph = BaseGraph::new();
        let n: Vec<_> = (1..=4u64).map(|i| graph.add_node(i, "").unwrap()).collect();
        graph.add_edge(n[0], n[1], None).unwrap();
        graph.add_edge(n[0], n[2], None).unwrap();
        graph.add_edge(n[1], n[3], None).unwrap();
        graph.add_edge(n[2], n[3], None).unwrap();
        let view = BaseView::new(&graph);
        let scores = betweenness(&view, EdgeOrientation::Directed, &JobContext::new()).unwrap();
        // a->d goes through b only; c gets nothing for it
        assert_relative_eq!(*scores.get(n[1]).unwrap(), 1.0 / 6.0);
        assert_relative_eq!(*scores.get(n[2]).unwrap(), 0.0);
    }

    #[test]
    fn test_cancelled() {
        let (graph, _) = chain(4);
        let view = BaseView::new(&graph);
        let ctx = JobContext::new();
        ctx.cancellation().cancel();
        assert!(matches!(
            closeness(&view, EdgeOrientation::Directed, &ctx),
            Err(Error::Cancelled)
        ));
    }
}
