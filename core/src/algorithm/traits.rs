//! Core trait and type definitions for the flow-analysis engine
//!
//! Establishes the node handle, capacity/flow scalar types, the error
//! taxonomy shared by every component, and the solver trait through which
//! the pipeline drives a maximum-flow algorithm.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::fmt::{self, Debug, Display};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::FlowAssignment;
use crate::data_structures::graph::CapacityGraph;

/// Edge capacity (non-negative, finite)
pub type Capacity = f64;

/// Flow value carried by an edge or a whole network
pub type Flow = f64;

/// Dense node handle assigned in insertion order by [`CapacityGraph`]
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    #[inline]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Role a node plays in a multi-terminal query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalRole {
    Source,
    Sink,
}

impl Display for TerminalRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminalRole::Source => f.write_str("source"),
            TerminalRole::Sink => f.write_str("sink"),
        }
    }
}

/// Errors raised by graph construction, solving and verification
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Duplicate edge: {from} -> {to}")]
    DuplicateEdge { from: String, to: String },

    #[error("Unknown edge: {from} -> {to}")]
    UnknownEdge { from: String, to: String },

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Invalid capacity {capacity} for edge {from} -> {to}: {reason}")]
    InvalidCapacity {
        from: String,
        to: String,
        capacity: Capacity,
        reason: &'static str,
    },

    #[error("Self-loop on node {0} is not allowed")]
    SelfLoop(String),

    #[error("Empty {0} set")]
    EmptyTerminalSet(TerminalRole),

    #[error("Internal consistency violated: max flow {max_flow} does not match min cut {cut_value}")]
    InternalConsistency { max_flow: Flow, cut_value: Capacity },

    #[error("Flow assignment covers {actual} edges but the graph has {expected}")]
    AssignmentMismatch { expected: usize, actual: usize },

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Invalid edge label '{0}', expected 'FROM -> TO'")]
    InvalidEdgeLabel(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed network description: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;

/// Solver execution metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveMetrics {
    /// Augmenting paths applied
    pub augmentations: usize,
    /// Nodes dequeued across all breadth-first searches
    pub nodes_explored: usize,
    pub execution_time: Duration,
}

/// Lightweight profiler accumulating [`SolveMetrics`] during one solve
#[derive(Debug, Default)]
pub struct SolveProfiler {
    metrics: SolveMetrics,
    start_time: Option<Instant>,
}

impl SolveProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.metrics.execution_time = start.elapsed();
        }
    }

    pub fn record_node_exploration(&mut self) {
        self.metrics.nodes_explored += 1;
    }

    pub fn record_augmentation(&mut self) {
        self.metrics.augmentations += 1;
    }

    pub fn augmentations(&self) -> usize {
        self.metrics.augmentations
    }

    pub fn into_metrics(mut self) -> SolveMetrics {
        self.stop();
        self.metrics
    }
}

/// Single-source/single-sink maximum-flow algorithm
///
/// # Invariants
/// - Solves never mutate the input graph
/// - Identical inputs yield identical assignments
pub trait FlowSolver: Debug {
    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category
    fn category(&self) -> &'static str {
        "max_flow"
    }

    /// Returns a description including complexity guarantees
    fn description(&self) -> String;

    /// Sets a solver parameter with validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<()>;

    /// Gets a solver parameter value
    fn get_parameter(&self, name: &str) -> Option<String>;

    /// Computes a maximum flow between two named nodes
    fn solve(&self, graph: &CapacityGraph, source: &str, sink: &str) -> Result<FlowAssignment>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_type_safety() {
        let node1 = NodeId(42);
        let node2 = NodeId(42);
        let node3 = NodeId(43);

        assert_eq!(node1, node2);
        assert_ne!(node1, node3);
        assert_eq!(node1.as_usize(), 42);
    }

    #[test]
    fn test_error_messages_name_offending_identifiers() {
        let err = FlowError::UnknownEdge {
            from: "Terminal 1".to_string(),
            to: "Store 3".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown edge: Terminal 1 -> Store 3");

        let err = FlowError::EmptyTerminalSet(TerminalRole::Sink);
        assert_eq!(err.to_string(), "Empty sink set");
    }

    #[test]
    fn test_profiler_accumulates_metrics() {
        let mut profiler = SolveProfiler::new();
        profiler.start();
        profiler.record_augmentation();
        profiler.record_augmentation();
        profiler.record_node_exploration();

        assert_eq!(profiler.augmentations(), 2);
        let metrics = profiler.into_metrics();
        assert_eq!(metrics.augmentations, 2);
        assert_eq!(metrics.nodes_explored, 1);
    }
}
