//! Graph algorithms over [`GraphView`](crate::view::GraphView)s
//!
//! - [`shortest_path`]: point-to-point paths, unweighted BFS and Dijkstra
//! - [`apsp`]: all-pairs shortest paths with cancellation and progress
//! - [`centrality`]: closeness and betweenness built on [`apsp`]

pub mod apsp;
pub mod centrality;
pub mod shortest_path;

pub use apsp::AllPairs;
pub use centrality::{betweenness, closeness};
pub use shortest_path::{PathOutcome, shortest_path, shortest_path_oriented, weighted_shortest_path};
