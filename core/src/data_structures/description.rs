//! Serializable network descriptions
//!
//! A description bundles the raw edge list, the default terminal sets, node
//! positions for layout-aware collaborators and optional solver settings.
//! Where the data comes from (file, literal, database) is the caller's
//! concern; JSON helpers are provided for the common case.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::Result;
use crate::config::SolverConfig;
use crate::data_structures::graph::{CapacityGraph, EdgeRecord, Position};

/// Node positions keyed by node name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeLayout {
    positions: BTreeMap<String, Position>,
}

impl NodeLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: impl Into<String>, position: Position) -> Option<Position> {
        self.positions.insert(node.into(), position)
    }

    pub fn get(&self, node: &str) -> Option<Position> {
        self.positions.get(node).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Position)> + '_ {
        self.positions
            .iter()
            .map(|(node, position)| (node.as_str(), *position))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Graph nodes without a position, in graph insertion order
    pub fn missing<'g>(&self, graph: &'g CapacityGraph) -> Vec<&'g str> {
        graph
            .nodes()
            .filter(|node| !self.positions.contains_key(*node))
            .collect()
    }
}

impl FromIterator<(String, Position)> for NodeLayout {
    fn from_iter<I: IntoIterator<Item = (String, Position)>>(iter: I) -> Self {
        Self {
            positions: iter.into_iter().collect(),
        }
    }
}

/// Complete input for one network analysis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescription {
    pub edges: Vec<EdgeRecord>,

    #[serde(default)]
    pub sources: Vec<String>,

    #[serde(default)]
    pub sinks: Vec<String>,

    #[serde(default)]
    pub positions: NodeLayout,

    #[serde(default)]
    pub config: SolverConfig,
}

impl NetworkDescription {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let description: Self = serde_json::from_str(json)?;
        debug!(
            "Parsed network description: {} edges, {} sources, {} sinks",
            description.edges.len(),
            description.sources.len(),
            description.sinks.len()
        );
        Ok(description)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading network description from {}", path.display());
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn build_graph(&self) -> Result<CapacityGraph> {
        let graph = CapacityGraph::from_records(&self.edges)?;
        if !self.positions.is_empty() {
            let missing = self.positions.missing(&graph);
            if !missing.is_empty() {
                warn!("No position recorded for {} node(s): {:?}", missing.len(), missing);
            }
        }
        Ok(graph)
    }
}
