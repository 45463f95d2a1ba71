//! End-to-end flow analysis
//!
//! [`FlowPipeline`] wires the reducer, solver, verifier and disaggregator
//! together for multi-terminal queries and also runs single-pair and
//! pairwise solves with the same configuration.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::{EdmondsKarp, FlowAssignment, Termination};
use crate::algorithm::graph::super_node::{AugmentedGraph, SuperNodeReducer};
use crate::algorithm::traits::{Flow, FlowError, FlowSolver, NodeId, Result, TerminalRole};
use crate::config::SolverConfig;
use crate::data_structures::graph::CapacityGraph;
use crate::insights::attribution::{AttributionRecord, AttributionStrategy, FlowDisaggregator};
use crate::insights::capacity::{
    analyze_network_capacity, edge_loads, node_loads, utilization, EdgeLoad, NetworkCapacity,
    NodeLoad,
};
use crate::validation::optimality::{OptimalityReport, OptimalityVerifier};

/// Complete answer to a multi-terminal query
#[derive(Debug, Clone, Serialize)]
pub struct UnifiedFlowAnalysis {
    pub max_flow: Flow,
    pub sources: Vec<String>,
    pub sinks: Vec<String>,
    /// Flow over the augmented graph, synthetic edges included
    pub assignment: FlowAssignment,
    pub report: OptimalityReport,
    pub attributions: Vec<AttributionRecord>,
    pub capacity: NetworkCapacity,
    /// Name of the attribution strategy that produced `attributions`
    pub strategy: String,
    #[serde(skip)]
    augmented: AugmentedGraph,
    #[serde(skip)]
    config: SolverConfig,
}

impl UnifiedFlowAnalysis {
    /// Augmented graph the assignment was solved on
    pub fn augmented(&self) -> &AugmentedGraph {
        &self.augmented
    }

    /// Share of the sources' combined capacity actually shipped
    pub fn utilization(&self) -> f64 {
        utilization(self.max_flow, self.capacity.source_total_capacity)
    }

    /// Loads on the real network's edges, synthetic edges excluded
    pub fn edge_loads(&self) -> Vec<EdgeLoad> {
        let graph = self.augmented.graph();
        edge_loads(&self.assignment, &self.config)
            .into_iter()
            .enumerate()
            .filter(|(edge_index, _)| {
                let (from, to, _) = graph.edge_at(*edge_index);
                !self.augmented.is_synthetic(from) && !self.augmented.is_synthetic(to)
            })
            .map(|(_, load)| load)
            .collect()
    }

    /// Loads for every node of `graph`, the network this analysis was run on
    pub fn node_loads(&self, graph: &CapacityGraph) -> Vec<NodeLoad> {
        node_loads(graph, &self.assignment)
    }

    /// Attributed flow from `origin` to `destination`
    pub fn attributed(&self, origin: &str, destination: &str) -> Flow {
        self.attributions
            .iter()
            .filter(|record| record.origin == origin && record.destination == destination)
            .map(|record| record.flow)
            .sum()
    }
}

/// Independent single-pair maximum flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairFlow {
    pub source: String,
    pub sink: String,
    pub max_flow: Flow,
    pub termination: Termination,
}

/// Reducer, solver, verifier and disaggregator sharing one configuration
#[derive(Debug)]
pub struct FlowPipeline {
    config: SolverConfig,
    solver: Box<dyn FlowSolver>,
    reducer: SuperNodeReducer,
    verifier: OptimalityVerifier,
    disaggregator: FlowDisaggregator,
}

impl Default for FlowPipeline {
    fn default() -> Self {
        Self::build(SolverConfig::default())
    }
}

impl FlowPipeline {
    /// Validates `config` and builds the default components from it
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: SolverConfig) -> Self {
        Self {
            solver: Box::new(EdmondsKarp::with_config(config.clone())),
            reducer: SuperNodeReducer::new(&config),
            verifier: OptimalityVerifier::new(&config),
            disaggregator: FlowDisaggregator::new(&config),
            config,
        }
    }

    /// Replaces the attribution strategy
    pub fn with_strategy(mut self, strategy: Box<dyn AttributionStrategy>) -> Self {
        self.disaggregator = FlowDisaggregator::with_strategy(strategy);
        self
    }

    /// Replaces the maximum-flow solver
    pub fn with_solver(mut self, solver: Box<dyn FlowSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn strategy_name(&self) -> &'static str {
        self.disaggregator.strategy_name()
    }

    /// Maximum flow between one source and one sink
    pub fn solve_max_flow(
        &self,
        graph: &CapacityGraph,
        source: &str,
        sink: &str,
    ) -> Result<FlowAssignment> {
        self.solver.solve(graph, source, sink)
    }

    /// Maximum flow from a set of sources to a set of sinks, verified and
    /// attributed back to origin/destination pairs
    pub fn solve_unified_max_flow<S: AsRef<str>>(
        &self,
        graph: &CapacityGraph,
        sources: &[S],
        sinks: &[S],
    ) -> Result<UnifiedFlowAnalysis> {
        let augmented = self.reducer.reduce(graph, sources, sinks)?;
        let capacity = analyze_network_capacity(graph, sources, sinks)?;

        let assignment = self.solver.solve(
            augmented.graph(),
            augmented.super_source_label(),
            augmented.super_sink_label(),
        )?;
        let report = self.verifier.verify_augmented(&augmented, &assignment)?;
        let attributions = self.disaggregator.disaggregate(&augmented, &assignment)?;

        info!(
            "Unified max flow {} ({} sources, {} sinks, bottleneck at {:?})",
            assignment.value(),
            augmented.sources().len(),
            augmented.sinks().len(),
            report.bottleneck_location()
        );

        let names = |ids: &[NodeId]| -> Vec<String> {
            ids.iter()
                .map(|&id| augmented.graph().node_name(id).to_string())
                .collect()
        };
        let source_names = names(augmented.sources());
        let sink_names = names(augmented.sinks());

        Ok(UnifiedFlowAnalysis {
            max_flow: assignment.value(),
            sources: source_names,
            sinks: sink_names,
            assignment,
            report,
            attributions,
            capacity,
            strategy: self.disaggregator.strategy_name().to_string(),
            augmented,
            config: self.config.clone(),
        })
    }

    /// Independent single-pair flows for every source/sink pair, source-major
    ///
    /// Pairs with zero flow are kept.
    pub fn pairwise_max_flow<S: AsRef<str>>(
        &self,
        graph: &CapacityGraph,
        sources: &[S],
        sinks: &[S],
    ) -> Result<Vec<PairFlow>> {
        if sources.is_empty() {
            return Err(FlowError::EmptyTerminalSet(TerminalRole::Source));
        }
        if sinks.is_empty() {
            return Err(FlowError::EmptyTerminalSet(TerminalRole::Sink));
        }
        for name in sources.iter().chain(sinks) {
            graph.require_node(name.as_ref())?;
        }

        let mut pairs = Vec::with_capacity(sources.len() * sinks.len());
        for source in sources {
            for sink in sinks {
                let assignment = self.solver.solve(graph, source.as_ref(), sink.as_ref())?;
                debug!(
                    "Pair {} -> {}: {}",
                    source.as_ref(),
                    sink.as_ref(),
                    assignment.value()
                );
                pairs.push(PairFlow {
                    source: source.as_ref().to_string(),
                    sink: sink.as_ref().to_string(),
                    max_flow: assignment.value(),
                    termination: assignment.termination,
                });
            }
        }
        Ok(pairs)
    }
}

/// Single-pair maximum flow with the default configuration
pub fn solve_max_flow(graph: &CapacityGraph, source: &str, sink: &str) -> Result<FlowAssignment> {
    FlowPipeline::default().solve_max_flow(graph, source, sink)
}

/// Multi-terminal analysis with the default configuration
pub fn solve_unified_max_flow<S: AsRef<str>>(
    graph: &CapacityGraph,
    sources: &[S],
    sinks: &[S],
) -> Result<UnifiedFlowAnalysis> {
    FlowPipeline::default().solve_unified_max_flow(graph, sources, sinks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::attribution::PathDecompositionAttribution;
    use crate::validation::optimality::BottleneckLocation;
    use approx::assert_abs_diff_eq;

    fn hub_graph() -> CapacityGraph {
        CapacityGraph::from_edges([
            ("A", "H", 10.0),
            ("B", "H", 5.0),
            ("H", "D1", 6.0),
            ("H", "D2", 9.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_unified_analysis() {
        let analysis = solve_unified_max_flow(&hub_graph(), &["A", "B"], &["D1", "D2"]).unwrap();

        assert_eq!(analysis.max_flow, 15.0);
        assert!(analysis.report.is_optimal);
        assert_eq!(analysis.report.min_cut_value, 15.0);
        assert_eq!(analysis.report.bottleneck_location(), BottleneckLocation::Terminals);
        assert_eq!(analysis.capacity.max_possible_flow, 15.0);
        assert_abs_diff_eq!(analysis.utilization(), 1.0);
        assert_eq!(analysis.strategy, "proportional");
        assert_eq!(analysis.sources, vec!["A", "B"]);

        assert_abs_diff_eq!(analysis.attributed("A", "D1"), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(analysis.attributed("B", "D2"), 3.0, epsilon = 1e-9);
        let attributed: Flow = analysis.attributions.iter().map(|record| record.flow).sum();
        assert_abs_diff_eq!(attributed, 15.0, epsilon = 1e-9);
    }

    #[test]
    fn test_input_graph_untouched() {
        let graph = hub_graph();
        let before = graph.edge_records();
        solve_unified_max_flow(&graph, &["A", "B"], &["D1", "D2"]).unwrap();

        assert_eq!(graph.edge_records(), before);
        assert_eq!(graph.node_count(), 5);
    }

    #[test]
    fn test_real_edge_loads_only() {
        let analysis = solve_unified_max_flow(&hub_graph(), &["A", "B"], &["D1", "D2"]).unwrap();
        let loads = analysis.edge_loads();

        assert_eq!(loads.len(), 4);
        assert!(loads.iter().all(|load| load.saturated));
    }

    #[test]
    fn test_node_loads_on_real_graph() {
        let graph = hub_graph();
        let analysis = solve_unified_max_flow(&graph, &["A", "B"], &["D1", "D2"]).unwrap();
        let loads = analysis.node_loads(&graph);

        assert_eq!(loads.len(), 5);
        let hub = loads.iter().find(|load| load.node == "H").unwrap();
        assert_eq!(hub.throughput, 15.0);
    }

    #[test]
    fn test_path_strategy() {
        let pipeline = FlowPipeline::default()
            .with_strategy(Box::new(PathDecompositionAttribution::default()));
        let analysis = pipeline
            .solve_unified_max_flow(&hub_graph(), &["A", "B"], &["D1", "D2"])
            .unwrap();

        assert_eq!(analysis.strategy, "paths");
        assert_eq!(analysis.attributed("A", "D1"), 6.0);
    }

    #[test]
    fn test_pairwise_is_source_major() {
        let pairs = FlowPipeline::default()
            .pairwise_max_flow(&hub_graph(), &["A", "B"], &["D1", "D2"])
            .unwrap();

        let summary: Vec<(&str, &str, Flow)> = pairs
            .iter()
            .map(|pair| (pair.source.as_str(), pair.sink.as_str(), pair.max_flow))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("A", "D1", 6.0),
                ("A", "D2", 9.0),
                ("B", "D1", 5.0),
                ("B", "D2", 5.0),
            ]
        );
    }

    #[test]
    fn test_pairwise_errors() {
        let none: [&str; 0] = [];
        let pipeline = FlowPipeline::default();

        assert!(matches!(
            pipeline.pairwise_max_flow(&hub_graph(), &["A"], &none),
            Err(FlowError::EmptyTerminalSet(TerminalRole::Sink))
        ));
        assert!(matches!(
            pipeline.pairwise_max_flow(&hub_graph(), &["A"], &["X"]),
            Err(FlowError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = SolverConfig::default();
        config.optimality_epsilon = -1.0;
        assert!(FlowPipeline::new(config).is_err());
    }

    #[test]
    fn test_truncated_unified_solve() {
        let mut config = SolverConfig::default();
        config.max_augmentations = Some(1);
        let pipeline = FlowPipeline::new(config).unwrap();

        let analysis = pipeline
            .solve_unified_max_flow(&hub_graph(), &["A", "B"], &["D1", "D2"])
            .unwrap();
        assert_eq!(analysis.assignment.termination, Termination::Truncated);
        assert!(!analysis.report.is_optimal);
        assert!(analysis.max_flow < 15.0);
    }
}
