//! TRIBUTARY flow-analysis engine
//!
//! Computes the maximum throughput of capacitated multi-tier distribution
//! networks (terminals, intermediate hubs, destinations) and explains the
//! result: the min cut that proves optimality, where the bottleneck sits, and
//! how much of the merged flow each origin delivers to each destination.
//!
//! # Pipeline
//!
//! ```text
//! CapacityGraph ──► SuperNodeReducer ──► EdmondsKarp ──► OptimalityVerifier
//!                                               │
//!                                               └──────► FlowDisaggregator
//! ```
//!
//! # Example
//!
//! ```
//! use tributary_core::{solve_unified_max_flow, CapacityGraph};
//!
//! let graph = CapacityGraph::from_edges([
//!     ("A", "H", 10.0),
//!     ("B", "H", 5.0),
//!     ("H", "D1", 6.0),
//!     ("H", "D2", 9.0),
//! ])?;
//!
//! let analysis = solve_unified_max_flow(&graph, &["A", "B"], &["D1", "D2"])?;
//! assert_eq!(analysis.max_flow, 15.0);
//! assert!(analysis.report.is_optimal);
//! # Ok::<(), tributary_core::FlowError>(())
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod config;
pub mod data_structures;
pub mod execution;
pub mod insights;
pub mod validation;

pub use self::algorithm::graph::{
    AugmentedGraph, EdgeFlow, EdmondsKarp, FlowAssignment, SuperNodeReducer, Termination,
};
pub use self::algorithm::traits::{
    Capacity, Flow, FlowError, FlowSolver, NodeId, Result, SolveMetrics, TerminalRole,
};
pub use self::config::SolverConfig;
pub use self::data_structures::description::{NetworkDescription, NodeLayout};
pub use self::data_structures::graph::{CapacityGraph, EdgeKey, EdgeRecord, Position};
pub use self::data_structures::shared::SharedCapacityGraph;
pub use self::execution::pipeline::{
    solve_max_flow, solve_unified_max_flow, FlowPipeline, PairFlow, UnifiedFlowAnalysis,
};
pub use self::execution::session::{CapacityUpdate, NetworkSession, NetworkStatus};
pub use self::insights::attribution::{
    AttributionRecord, AttributionStrategy, FlowDisaggregator, PathDecompositionAttribution,
    ProportionalAttribution,
};
pub use self::insights::capacity::{
    analyze_network_capacity, edge_loads, node_loads, node_throughput, utilization, EdgeLoad,
    NetworkCapacity, NodeLoad,
};
pub use self::insights::presentation::FlowRenderer;
pub use self::validation::optimality::{BottleneckLocation, OptimalityReport, OptimalityVerifier};
