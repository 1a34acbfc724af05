//! Provenance graph model
//!
//! - [`BaseGraph`]: arena-backed store of nodes, edges, and groups
//! - summary tree: groups, crossing edges, memoized internal edges
//! - summary edges: one logical edge per (from, to) pair of grouped endpoints

mod base;
mod cache;
pub mod ids;
pub mod node;
mod summary;

pub use base::BaseGraph;
pub use cache::CacheStats;
pub use ids::{Direction, EdgeHandle, EdgeIndex, NodeId, NodeIndex, SummaryEdgeId};
pub use node::{Edge, Node, NodeKind, SummaryEdge};
