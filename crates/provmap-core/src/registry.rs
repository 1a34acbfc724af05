//! Named stopping filters and algorithms
//!
//! A `Registry` is an ordinary value built by whoever composes the
//! application and passed to the code that needs it.

use crate::algorithms::centrality;
use crate::error::{Error, Result};
use crate::job::{JobContext, JobOutcome};
use crate::overlay::NumericOverlay;
use crate::traversal::NodeFilter;
use crate::view::{EdgeOrientation, GraphView};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Algorithms that produce a per-node score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Dangalchev closeness
    Closeness,
    /// Approximate betweenness
    Betweenness,
}

impl AlgorithmKind {
    /// Every variant
    pub const ALL: [AlgorithmKind; 2] = [Self::Closeness, Self::Betweenness];

    /// Registry name
    pub fn name(self) -> &'static str {
        match self {
            Self::Closeness => "closeness",
            Self::Betweenness => "betweenness",
        }
    }

    /// Run over `view`
    pub fn run<V: GraphView + ?Sized>(
        self,
        view: &V,
        orientation: EdgeOrientation,
        ctx: &JobContext,
    ) -> Result<NumericOverlay> {
        match self {
            Self::Closeness => centrality::closeness(view, orientation, ctx),
            Self::Betweenness => centrality::betweenness(view, orientation, ctx),
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::not_found(format!("algorithm '{}'", s)))
    }
}

/// Named filters and algorithms
#[derive(Debug, Clone, Default)]
pub struct Registry {
    filters: BTreeMap<String, NodeFilter>,
    algorithms: BTreeMap<String, AlgorithmKind>,
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the `all` and `visible` filters and every algorithm
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_filter("all", NodeFilter::All);
        registry.register_filter("visible", NodeFilter::Visible);
        for kind in AlgorithmKind::ALL {
            registry.algorithms.insert(kind.name().to_string(), kind);
        }
        registry
    }

    /// Add or replace a filter
    pub fn register_filter(&mut self, name: impl Into<String>, filter: NodeFilter) -> Option<NodeFilter> {
        self.filters.insert(name.into(), filter)
    }

    /// Filter by name
    pub fn filter(&self, name: &str) -> Option<&NodeFilter> {
        self.filters.get(name)
    }

    /// Registered filter names
    pub fn filter_names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Algorithm by name
    pub fn algorithm(&self, name: &str) -> Option<AlgorithmKind> {
        self.algorithms.get(name).copied()
    }

    /// Registered algorithm names
    pub fn algorithm_names(&self) -> impl Iterator<Item = &str> {
        self.algorithms.keys().map(String::as_str)
    }

    /// Run a named algorithm
    pub fn run_algorithm<V: GraphView + ?Sized>(
        &self,
        name: &str,
        view: &V,
        orientation: EdgeOrientation,
        ctx: &JobContext,
    ) -> Result<NumericOverlay> {
        let kind = self
            .algorithm(name)
            .ok_or_else(|| Error::not_found(format!("algorithm '{}'", name)))?;
        kind.run(view, orientation, ctx)
    }

    /// Run a named algorithm and fold the result into a [`JobOutcome`]
    pub fn run_job<V: GraphView + ?Sized>(
        &self,
        name: &str,
        view: &V,
        orientation: EdgeOrientation,
        ctx: &JobContext,
    ) -> JobOutcome<NumericOverlay> {
        self.run_algorithm(name, view, orientation, ctx).into()
    }
}
