//! Provmap Core - Provenance Graph Summarization and Analysis
//!
//! This crate provides the graph core behind provenance map exploration:
//! - Arena-backed provenance graph (nodes, labeled edges, string attributes)
//! - Summary tree of nested groups with incremental crossing-edge tracking
//! - Memoized summary edges coalescing the base edges between two groups
//! - Ancestry/descendant BFS with stopping conditions and result caps
//! - Shortest paths, all-pairs paths, closeness and betweenness centrality
//! - Dense per-node overlays with cached extrema
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │     Registry / Jobs (filters, algorithms,   │
//! │       progress, cancellation, outcomes)     │
//! └──────────────┬──────────────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────┐
//! │   Traversal + Algorithms (BFS, paths,       │
//! │        APSP, centrality -> overlays)        │
//! └──────────────┬──────────────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────┐
//! │     Views (base, summary cut, subgraph)     │
//! └──────────────┬──────────────────────────────┘
//!                │
//! ┌──────────────┴──────────────────────────────┐
//! │  BaseGraph (store, summary tree, summary    │
//! │        edge cache, overlay registry)        │
//! └─────────────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod algorithms;
pub mod config;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod job;
pub mod overlay;
pub mod registry;
pub mod traversal;
pub mod view;

pub use config::Config;
pub use error::{Error, ErrorCategory, Result};
pub use graph::{BaseGraph, Direction, EdgeHandle, EdgeIndex, NodeId, NodeIndex, SummaryEdgeId};
pub use job::{CancellationFlag, JobContext, JobOutcome, ProgressObserver};
pub use overlay::{NumericOverlay, PerNodeAttribute, PerNodeComparable};
pub use traversal::{NodeFilter, StoppingCondition, Traversal, TraversalQuery, TraversalResult};
pub use view::{BaseView, EdgeOrientation, GraphView, SummaryView};
