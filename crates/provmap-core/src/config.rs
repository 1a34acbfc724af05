//! Analysis configuration
//!
//! Priority: environment variables > config file > defaults.

use crate::error::{Error, Result};
use crate::view::EdgeOrientation;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a TOML config file
pub const CONFIG_PATH_ENV: &str = "PROVMAP_CONFIG";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for ancestry/descendant queries
    pub traversal: TraversalConfig,
    /// Defaults for centrality runs
    pub centrality: CentralityConfig,
    /// Summary tree maintenance
    pub summary: SummaryConfig,
}

/// Traversal defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Abort the BFS once this many nodes are in the result
    pub max_result_size: Option<usize>,
    /// Keep nodes that fail the stopping predicate in the result
    pub include_stopping_nodes: bool,
}

/// Centrality defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CentralityConfig {
    /// Which way edges are followed when computing shortest paths
    pub orientation: EdgeOrientation,
}

/// Summary tree maintenance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    /// Run the full consistency check after every move
    pub verify_after_mutation: bool,
}

impl Config {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::config(format!("invalid TOML: {}", e)))
    }

    /// Load a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load configuration from environment variables and config file
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `PROVMAP_*` overrides from an arbitrary lookup.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("PROVMAP_MAX_RESULT_SIZE") {
            let raw = raw.trim();
            if raw.is_empty() || raw.eq_ignore_ascii_case("none") {
                self.traversal.max_result_size = None;
            } else {
                match raw.parse::<usize>() {
                    Ok(cap) => self.traversal.max_result_size = Some(cap),
                    Err(e) => tracing::warn!("Ignoring PROVMAP_MAX_RESULT_SIZE={:?}: {}", raw, e),
                }
            }
        }

        if let Some(raw) = lookup("PROVMAP_INCLUDE_STOPPING_NODES") {
            self.traversal.include_stopping_nodes = raw
                .trim()
                .parse::<bool>()
                .unwrap_or(self.traversal.include_stopping_nodes);
        }

        if let Some(raw) = lookup("PROVMAP_ORIENTATION") {
            match raw.trim().parse::<EdgeOrientation>() {
                Ok(orientation) => self.centrality.orientation = orientation,
                Err(e) => tracing::warn!("Ignoring PROVMAP_ORIENTATION: {}", e),
            }
        }

        if let Some(raw) = lookup("PROVMAP_VERIFY_AFTER_MUTATION") {
            self.summary.verify_after_mutation = raw
                .trim()
                .parse::<bool>()
                .unwrap_or(self.summary.verify_after_mutation);
        }
    }
}
