//! Triple ingestion
//!
//! Importers describe a graph as two kinds of triples arriving in any order:
//! attribute triples `(node_id, key, value)` and ancestry triples
//! `(from_id, label, to_id)`. Ids are sparse; [`TripleIngestor::finish`]
//! densifies them into sequential node indices in ascending id order and then
//! inserts edges in arrival order.

use crate::config::SummaryConfig;
use crate::error::Result;
use crate::graph::{BaseGraph, NodeId};
use crate::job::JobContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

/// Attribute keys consulted, in order, for a node's label
pub const LABEL_KEYS: [&str; 2] = ["label", "name"];

/// Ingestion statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestStats {
    /// Nodes inserted
    pub nodes_loaded: u64,
    /// Edges inserted
    pub edges_loaded: u64,
    /// Attribute values stored
    pub attributes_loaded: u64,
    /// Wall time spent in `finish`
    pub duration_seconds: f64,
    /// Non-fatal oddities seen while collecting triples
    pub warnings: Vec<String>,
}

#[derive(Debug)]
struct PendingEdge {
    from: NodeId,
    label: Option<String>,
    to: NodeId,
}

/// Collects triples and builds a [`BaseGraph`] from them
#[derive(Debug, Default)]
pub struct TripleIngestor {
    nodes: BTreeMap<NodeId, BTreeMap<String, String>>,
    edges: Vec<PendingEdge>,
    warnings: Vec<String>,
}

impl TripleIngestor {
    /// Empty ingestor
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attribute; a repeated key keeps the latest value
    pub fn attribute(&mut self, node: impl Into<NodeId>, key: impl Into<String>, value: impl Into<String>) {
        let node = node.into();
        let key = key.into();
        let previous = self.nodes.entry(node).or_default().insert(key.clone(), value.into());
        if previous.is_some() {
            self.warnings
                .push(format!("attribute '{}' of node {} set more than once", key, node));
        }
    }

    /// Record an edge; an empty label means unlabeled
    pub fn ancestry(&mut self, from: impl Into<NodeId>, label: impl Into<String>, to: impl Into<NodeId>) {
        let (from, to) = (from.into(), to.into());
        let label = label.into();
        self.nodes.entry(from).or_default();
        self.nodes.entry(to).or_default();
        self.edges.push(PendingEdge {
            from,
            label: (!label.is_empty()).then_some(label),
            to,
        });
    }

    /// Distinct node ids seen so far
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Edges seen so far
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Build the graph with default settings
    pub fn finish(self) -> Result<(BaseGraph, IngestStats)> {
        self.finish_with(SummaryConfig::default(), &JobContext::new())
    }

    /// Build the graph, reporting one progress tick per inserted node and edge
    pub fn finish_with(self, config: SummaryConfig, ctx: &JobContext) -> Result<(BaseGraph, IngestStats)> {
        let started = Instant::now();
        let mut graph = BaseGraph::with_config(config);
        let mut stats = IngestStats {
            warnings: self.warnings,
            ..IngestStats::default()
        };

        ctx.set_range(0, (self.nodes.len() + self.edges.len()) as u64);
        ctx.set_progress(0);

        for (id, attributes) in self.nodes {
            let label = LABEL_KEYS
                .iter()
                .find_map(|key| attributes.get(*key).cloned())
                .unwrap_or_else(|| id.to_string());
            let index = graph.add_node(id, label)?;
            for (key, value) in attributes {
                graph.set_attribute(index, key, value)?;
                stats.attributes_loaded += 1;
            }
            stats.nodes_loaded += 1;
            ctx.add_progress(1);
        }

        for edge in self.edges {
            // every endpoint was registered when the edge was recorded
            let (Some(from), Some(to)) = (graph.resolve(edge.from), graph.resolve(edge.to)) else {
                stats.warnings.push(format!("edge {} -> {} lost an endpoint", edge.from, edge.to));
                continue;
            };
            graph.add_edge(from, to, edge.label)?;
            stats.edges_loaded += 1;
            ctx.add_progress(1);
        }

        stats.duration_seconds = started.elapsed().as_secs_f64();
        tracing::info!(
            nodes = stats.nodes_loaded,
            edges = stats.edges_loaded,
            warnings = stats.warnings.len(),
            "ingestion finished"
        );
        Ok((graph, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_order_triples() {
        let mut ingestor = TripleIngestor::new();
        ingestor.ancestry(300u64, "wasGeneratedBy", 20u64);
        ingestor.attribute(20u64, "name", "compile");
        ingestor.attribute(300u64, "label", "a.out");
        ingestor.attribute(300u64, "name", "ignored for label");
        ingestor.ancestry(20u64, "used", 7u64);

        let (graph, stats) = ingestor.finish().unwrap();
        assert_eq!(stats.nodes_loaded, 3);
        assert_eq!(stats.edges_loaded, 2);
        assert_eq!(stats.attributes_loaded, 3);

        // ascending id order
        let ids: Vec<u64> = graph.base_nodes().map(|n| n.id().value()).collect();
        assert_eq!(ids, vec![7, 20, 300]);

        assert_eq!(graph.node_by_id(NodeId(300)).unwrap().label(), "a.out");
        assert_eq!(graph.node_by_id(NodeId(20)).unwrap().label(), "compile");
        assert_eq!(graph.node_by_id(NodeId(7)).unwrap().label(), "7");

        let first = graph.edges().next().unwrap();
        assert_eq!(first.label(), Some("wasGeneratedBy"));
        assert_eq!(graph.node(first.from()).unwrap().id(), NodeId(300));
    }

    #[test]
    fn test_repeated_attribute_warns() {
        let mut ingestor = TripleIngestor::new();
        ingestor.attribute(1u64, "type", "artifact");
        ingestor.attribute(1u64, "type", "process");
        let (graph, stats) = ingestor.finish().unwrap();
        assert_eq!(stats.warnings.len(), 1);
        assert_eq!(graph.node_by_id(NodeId(1)).unwrap().attribute("type"), Some("process"));
    }

    #[test]
    fn test_empty_label_is_unlabeled() {
        let mut ingestor = TripleIngestor::new();
        ingestor.ancestry(1u64, "", 2u64);
        let (graph, _) = ingestor.finish().unwrap();
        assert_eq!(graph.edges().next().unwrap().label(), None);
    }
}
