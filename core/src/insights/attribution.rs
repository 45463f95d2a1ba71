//! Origin/destination flow attribution
//!
//! A solved augmented network tells how much flow each edge carries, not
//! which source supplied which sink once flows merge at a shared hub. The
//! disaggregator reconstructs that mapping through a pluggable
//! [`AttributionStrategy`]:
//!
//! - [`ProportionalAttribution`] treats merged flow as fungible. Every node
//!   forwards the same origin mix it received, so a hub fed 10:5 by two
//!   sources passes that 10:5 split to every outgoing edge, tier after tier.
//! - [`PathDecompositionAttribution`] peels the flow apart into
//!   source-to-sink paths (shortest first) and credits each path's amount to
//!   its endpoints.
//!
//! Both work on a private copy of the flow with circulations cancelled; the
//! caller's assignment is never modified.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::VecDeque;
use std::fmt::Debug;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::FlowAssignment;
use crate::algorithm::graph::super_node::AugmentedGraph;
use crate::algorithm::traits::{Flow, NodeId, Result};
use crate::config::SolverConfig;
use crate::data_structures::graph::CapacityGraph;
use crate::validation::optimality::check_alignment;

/// Share of the aggregate flow credited to one origin/destination pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionRecord {
    pub origin: String,
    pub destination: String,
    pub flow: Flow,
}

/// Policy for splitting merged flow back into origin/destination pairs
pub trait AttributionStrategy: Debug {
    fn name(&self) -> &'static str;

    /// Attribution records ordered by origin, then destination, in query order
    fn attribute(
        &self,
        augmented: &AugmentedGraph,
        assignment: &FlowAssignment,
    ) -> Result<Vec<AttributionRecord>>;
}

/// Proportional split of hub outflow by each origin's share of hub inflow
#[derive(Debug, Clone)]
pub struct ProportionalAttribution {
    threshold: Flow,
    tolerance: Flow,
}

impl ProportionalAttribution {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            threshold: config.attribution_threshold,
            tolerance: config.residual_tolerance,
        }
    }
}

impl Default for ProportionalAttribution {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl AttributionStrategy for ProportionalAttribution {
    fn name(&self) -> &'static str {
        "proportional"
    }

    fn attribute(
        &self,
        augmented: &AugmentedGraph,
        assignment: &FlowAssignment,
    ) -> Result<Vec<AttributionRecord>> {
        let graph = augmented.graph();
        let flows = acyclic_flows(graph, assignment, self.tolerance)?;
        let slots = TerminalSlots::new(augmented);
        let origin_count = augmented.sources().len();

        // composition[v][i]: fraction of v's inflow that started at origin i
        let mut composition: Vec<Vec<Flow>> = vec![Vec::new(); graph.node_count()];

        for node in topological_order(graph, &flows) {
            if node == augmented.super_source() {
                continue;
            }

            let mut mix = vec![0.0; origin_count];
            let mut inflow = 0.0;
            for &edge_index in graph.incoming_edges(node) {
                let flow = flows[edge_index];
                if flow <= 0.0 {
                    continue;
                }
                let (from, _, _) = graph.edge_at(edge_index);
                inflow += flow;

                if from == augmented.super_source() {
                    if let Some(slot) = slots.origin(node) {
                        mix[slot] += flow;
                    }
                } else {
                    for (share, weight) in mix.iter_mut().zip(&composition[from.as_usize()]) {
                        *share += flow * weight;
                    }
                }
            }

            if inflow > 0.0 {
                for share in &mut mix {
                    *share /= inflow;
                }
                composition[node.as_usize()] = mix;
            }
        }

        let mut delivered = slots.empty_matrix();
        for (sink_slot, &sink) in augmented.sinks().iter().enumerate() {
            let Some(edge_index) = augmented.sink_edge(sink) else {
                continue;
            };
            let absorbed = flows[edge_index];
            if absorbed <= 0.0 {
                continue;
            }
            for (origin_slot, share) in composition[sink.as_usize()].iter().enumerate() {
                delivered[origin_slot][sink_slot] += absorbed * share;
            }
        }

        Ok(collect_records(augmented, &delivered, self.threshold))
    }
}

/// Greedy decomposition of the flow into shortest source-to-sink paths
#[derive(Debug, Clone)]
pub struct PathDecompositionAttribution {
    threshold: Flow,
    tolerance: Flow,
}

impl PathDecompositionAttribution {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            threshold: config.attribution_threshold,
            tolerance: config.residual_tolerance,
        }
    }
}

impl Default for PathDecompositionAttribution {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl AttributionStrategy for PathDecompositionAttribution {
    fn name(&self) -> &'static str {
        "paths"
    }

    fn attribute(
        &self,
        augmented: &AugmentedGraph,
        assignment: &FlowAssignment,
    ) -> Result<Vec<AttributionRecord>> {
        let graph = augmented.graph();
        let mut flows = acyclic_flows(graph, assignment, self.tolerance)?;
        let slots = TerminalSlots::new(augmented);
        let mut delivered = slots.empty_matrix();
        let mut paths = 0usize;

        while let Some(path) =
            find_flow_path(graph, &flows, augmented.super_source(), augmented.super_sink())
        {
            let amount = path
                .iter()
                .map(|&edge_index| flows[edge_index])
                .fold(Flow::INFINITY, Flow::min);
            for &edge_index in &path {
                flows[edge_index] -= amount;
                if flows[edge_index] <= self.tolerance {
                    flows[edge_index] = 0.0;
                }
            }

            // First edge leaves the super source, last edge enters the super sink
            let (_, origin, _) = graph.edge_at(path[0]);
            let (destination, _, _) = graph.edge_at(path[path.len() - 1]);
            if let (Some(origin_slot), Some(sink_slot)) =
                (slots.origin(origin), slots.sink(destination))
            {
                delivered[origin_slot][sink_slot] += amount;
            }
            paths += 1;
            trace!(
                "Path {}: {} -> {} carries {}",
                paths,
                graph.node_name(origin),
                graph.node_name(destination),
                amount
            );
        }

        Ok(collect_records(augmented, &delivered, self.threshold))
    }
}

/// Turns an augmented flow assignment into attribution records
#[derive(Debug)]
pub struct FlowDisaggregator {
    strategy: Box<dyn AttributionStrategy>,
}

impl Default for FlowDisaggregator {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl FlowDisaggregator {
    /// Disaggregator using proportional attribution
    pub fn new(config: &SolverConfig) -> Self {
        Self::with_strategy(Box::new(ProportionalAttribution::new(config)))
    }

    pub fn with_strategy(strategy: Box<dyn AttributionStrategy>) -> Self {
        Self { strategy }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn disaggregate(
        &self,
        augmented: &AugmentedGraph,
        assignment: &FlowAssignment,
    ) -> Result<Vec<AttributionRecord>> {
        let records = self.strategy.attribute(augmented, assignment)?;
        debug!(
            "{} attribution produced {} records",
            self.strategy.name(),
            records.len()
        );
        Ok(records)
    }
}

/// Maps real terminals to their position in the query's terminal lists
struct TerminalSlots {
    origins: Vec<Option<usize>>,
    sinks: Vec<Option<usize>>,
    origin_count: usize,
    sink_count: usize,
}

impl TerminalSlots {
    fn new(augmented: &AugmentedGraph) -> Self {
        let node_count = augmented.graph().node_count();
        let mut origins = vec![None; node_count];
        let mut sinks = vec![None; node_count];
        for (slot, source) in augmented.sources().iter().enumerate() {
            origins[source.as_usize()] = Some(slot);
        }
        for (slot, sink) in augmented.sinks().iter().enumerate() {
            sinks[sink.as_usize()] = Some(slot);
        }
        Self {
            origins,
            sinks,
            origin_count: augmented.sources().len(),
            sink_count: augmented.sinks().len(),
        }
    }

    fn origin(&self, node: NodeId) -> Option<usize> {
        self.origins[node.as_usize()]
    }

    fn sink(&self, node: NodeId) -> Option<usize> {
        self.sinks[node.as_usize()]
    }

    fn empty_matrix(&self) -> Vec<Vec<Flow>> {
        vec![vec![0.0; self.sink_count]; self.origin_count]
    }
}

fn collect_records(
    augmented: &AugmentedGraph,
    delivered: &[Vec<Flow>],
    threshold: Flow,
) -> Vec<AttributionRecord> {
    let graph = augmented.graph();
    let mut records = Vec::new();
    for (origin, row) in augmented.sources().iter().zip(delivered) {
        for (destination, &flow) in augmented.sinks().iter().zip(row) {
            if flow > threshold {
                records.push(AttributionRecord {
                    origin: graph.node_name(*origin).to_string(),
                    destination: graph.node_name(*destination).to_string(),
                    flow,
                });
            }
        }
    }
    records
}

/// Copy of the assignment's flows with noise zeroed and circulations removed
fn acyclic_flows(
    graph: &CapacityGraph,
    assignment: &FlowAssignment,
    tolerance: Flow,
) -> Result<Vec<Flow>> {
    check_alignment(graph, assignment)?;

    let mut flows: Vec<Flow> = assignment
        .edge_flows()
        .iter()
        .map(|edge| if edge.flow > tolerance { edge.flow } else { 0.0 })
        .collect();

    while let Some(cycle) = find_flow_cycle(graph, &flows) {
        let amount = cycle
            .iter()
            .map(|&edge_index| flows[edge_index])
            .fold(Flow::INFINITY, Flow::min);
        trace!("Cancelling circulation of {} over {} edges", amount, cycle.len());
        for &edge_index in &cycle {
            flows[edge_index] -= amount;
            if flows[edge_index] <= tolerance {
                flows[edge_index] = 0.0;
            }
        }
    }
    Ok(flows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Edge indices of one directed cycle among positive-flow edges
fn find_flow_cycle(graph: &CapacityGraph, flows: &[Flow]) -> Option<Vec<usize>> {
    let mut state = vec![Visit::New; graph.node_count()];

    for root in 0..graph.node_count() {
        if state[root] != Visit::New {
            continue;
        }
        state[root] = Visit::Active;
        // (node, cursor into its outgoing edges); path[i] links stack[i] to stack[i + 1]
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        let mut path: Vec<usize> = Vec::new();

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            let outgoing = graph.outgoing_edges(NodeId(node));
            if frame.1 == outgoing.len() {
                state[node] = Visit::Done;
                stack.pop();
                path.pop();
                continue;
            }
            let edge_index = outgoing[frame.1];
            frame.1 += 1;
            if flows[edge_index] <= 0.0 {
                continue;
            }

            let (_, target, _) = graph.edge_at(edge_index);
            let next = target.as_usize();
            match state[next] {
                Visit::Active => {
                    if let Some(start) = stack.iter().position(|&(member, _)| member == next) {
                        let mut cycle = path[start..].to_vec();
                        cycle.push(edge_index);
                        return Some(cycle);
                    }
                }
                Visit::New => {
                    state[next] = Visit::Active;
                    stack.push((next, 0));
                    path.push(edge_index);
                }
                Visit::Done => {}
            }
        }
    }
    None
}

/// Kahn ordering of all nodes over positive-flow edges
///
/// Ties resolve by node insertion order; requires an acyclic flow.
fn topological_order(graph: &CapacityGraph, flows: &[Flow]) -> Vec<NodeId> {
    let mut in_degree = vec![0usize; graph.node_count()];
    for edge_index in 0..graph.edge_count() {
        if flows[edge_index] > 0.0 {
            in_degree[graph.edge_at(edge_index).1.as_usize()] += 1;
        }
    }

    let mut queue: VecDeque<NodeId> = (0..graph.node_count())
        .filter(|&node| in_degree[node] == 0)
        .map(NodeId)
        .collect();
    let mut order = Vec::with_capacity(graph.node_count());

    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &edge_index in graph.outgoing_edges(node) {
            if flows[edge_index] <= 0.0 {
                continue;
            }
            let target = graph.edge_at(edge_index).1;
            in_degree[target.as_usize()] -= 1;
            if in_degree[target.as_usize()] == 0 {
                queue.push_back(target);
            }
        }
    }
    order
}

/// Shortest path of positive-flow edges from `source` to `sink`
fn find_flow_path(
    graph: &CapacityGraph,
    flows: &[Flow],
    source: NodeId,
    sink: NodeId,
) -> Option<Vec<usize>> {
    let mut parent_edge: Vec<Option<usize>> = vec![None; graph.node_count()];
    let mut visited = vec![false; graph.node_count()];
    let mut queue = VecDeque::new();
    visited[source.as_usize()] = true;
    queue.push_back(source);

    while let Some(node) = queue.pop_front() {
        for &edge_index in graph.outgoing_edges(node) {
            let (_, target, _) = graph.edge_at(edge_index);
            if visited[target.as_usize()] || flows[edge_index] <= 0.0 {
                continue;
            }
            visited[target.as_usize()] = true;
            parent_edge[target.as_usize()] = Some(edge_index);

            if target == sink {
                let mut path = Vec::new();
                let mut current = sink;
                while let Some(edge_index) = parent_edge[current.as_usize()] {
                    path.push(edge_index);
                    current = graph.edge_at(edge_index).0;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(target);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::graph::max_flow::EdmondsKarp;
    use crate::algorithm::graph::super_node::SuperNodeReducer;
    use crate::algorithm::traits::{FlowError, FlowSolver};
    use approx::assert_abs_diff_eq;

    fn solve(
        edges: &[(&str, &str, f64)],
        sources: &[&str],
        sinks: &[&str],
    ) -> (AugmentedGraph, FlowAssignment) {
        let graph = CapacityGraph::from_edges(edges.iter().copied()).unwrap();
        let augmented = SuperNodeReducer::default().reduce(&graph, sources, sinks).unwrap();
        let assignment = EdmondsKarp::new()
            .solve(
                augmented.graph(),
                augmented.super_source_label(),
                augmented.super_sink_label(),
            )
            .unwrap();
        (augmented, assignment)
    }

    fn hub_network() -> (AugmentedGraph, FlowAssignment) {
        solve(
            &[("A", "H", 10.0), ("B", "H", 5.0), ("H", "D1", 6.0), ("H", "D2", 9.0)],
            &["A", "B"],
            &["D1", "D2"],
        )
    }

    fn flow_of(records: &[AttributionRecord], origin: &str, destination: &str) -> Flow {
        records
            .iter()
            .filter(|record| record.origin == origin && record.destination == destination)
            .map(|record| record.flow)
            .sum()
    }

    #[test]
    fn test_proportional_split_at_shared_hub() {
        let (augmented, assignment) = hub_network();
        let records = ProportionalAttribution::default()
            .attribute(&augmented, &assignment)
            .unwrap();

        assert_eq!(records.len(), 4);
        assert_abs_diff_eq!(flow_of(&records, "A", "D1"), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(flow_of(&records, "A", "D2"), 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(flow_of(&records, "B", "D1"), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(flow_of(&records, "B", "D2"), 3.0, epsilon = 1e-9);

        let origins: Vec<&str> = records.iter().map(|record| record.origin.as_str()).collect();
        assert_eq!(origins, vec!["A", "A", "B", "B"]);
    }

    #[test]
    fn test_proportional_recurses_through_tiers() {
        let (augmented, assignment) = solve(
            &[
                ("A", "H1", 4.0),
                ("B", "H1", 4.0),
                ("H1", "H2", 8.0),
                ("C", "H2", 8.0),
                ("H2", "D", 16.0),
            ],
            &["A", "B", "C"],
            &["D"],
        );
        let records = ProportionalAttribution::default()
            .attribute(&augmented, &assignment)
            .unwrap();

        assert_abs_diff_eq!(flow_of(&records, "A", "D"), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(flow_of(&records, "B", "D"), 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(flow_of(&records, "C", "D"), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_direct_source_to_sink_edge() {
        let (augmented, assignment) = solve(&[("A", "D", 3.0)], &["A"], &["D"]);
        let records = ProportionalAttribution::default()
            .attribute(&augmented, &assignment)
            .unwrap();

        assert_eq!(
            records,
            vec![AttributionRecord {
                origin: "A".to_string(),
                destination: "D".to_string(),
                flow: 3.0,
            }]
        );
    }

    #[test]
    fn test_path_decomposition() {
        let (augmented, assignment) = hub_network();
        let records = PathDecompositionAttribution::default()
            .attribute(&augmented, &assignment)
            .unwrap();

        assert_eq!(flow_of(&records, "A", "D1"), 6.0);
        assert_eq!(flow_of(&records, "A", "D2"), 4.0);
        assert_eq!(flow_of(&records, "B", "D1"), 0.0);
        assert_eq!(flow_of(&records, "B", "D2"), 5.0);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_strategies_agree_on_origin_totals() {
        let (augmented, assignment) = hub_network();
        let proportional = ProportionalAttribution::default()
            .attribute(&augmented, &assignment)
            .unwrap();
        let paths = PathDecompositionAttribution::default()
            .attribute(&augmented, &assignment)
            .unwrap();

        for origin in ["A", "B"] {
            let total = |records: &[AttributionRecord]| -> Flow {
                records
                    .iter()
                    .filter(|record| record.origin == origin)
                    .map(|record| record.flow)
                    .sum()
            };
            assert_abs_diff_eq!(total(&proportional), total(&paths), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_threshold_drops_noise() {
        let (augmented, assignment) = hub_network();
        let mut config = SolverConfig::default();
        config.attribution_threshold = 2.5;

        let records = ProportionalAttribution::new(&config)
            .attribute(&augmented, &assignment)
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|record| record.flow > 2.5));
    }

    #[test]
    fn test_assignment_is_not_mutated() {
        let (augmented, assignment) = hub_network();
        let before = assignment.clone();

        let disaggregator = FlowDisaggregator::default();
        assert_eq!(disaggregator.strategy_name(), "proportional");
        disaggregator.disaggregate(&augmented, &assignment).unwrap();
        assert_eq!(assignment, before);
    }

    #[test]
    fn test_swappable_strategy() {
        let (augmented, assignment) = hub_network();
        let disaggregator =
            FlowDisaggregator::with_strategy(Box::new(PathDecompositionAttribution::default()));

        assert_eq!(disaggregator.strategy_name(), "paths");
        assert_eq!(disaggregator.disaggregate(&augmented, &assignment).unwrap().len(), 3);
    }

    #[test]
    fn test_flow_cycles_are_cancelled() {
        let graph = CapacityGraph::from_edges([
            ("s", "a", 5.0),
            ("a", "b", 5.0),
            ("b", "c", 5.0),
            ("c", "a", 5.0),
            ("c", "t", 5.0),
        ])
        .unwrap();
        let flows = vec![1.0, 2.0, 2.0, 1.0, 1.0];

        let cycle = find_flow_cycle(&graph, &flows).unwrap();
        assert_eq!(cycle, vec![1, 2, 3]);

        let mut assignment = EdmondsKarp::new().solve(&graph, "s", "t").unwrap();
        for (edge, flow) in assignment.edges.iter_mut().zip(&flows) {
            edge.flow = *flow;
        }
        let cleaned = acyclic_flows(&graph, &assignment, 1e-12).unwrap();
        assert_eq!(cleaned, vec![1.0, 1.0, 1.0, 0.0, 1.0]);
        assert!(find_flow_cycle(&graph, &cleaned).is_none());
    }

    #[test]
    fn test_topological_order_respects_flow() {
        let graph = CapacityGraph::from_edges([("b", "c", 1.0), ("a", "b", 1.0)]).unwrap();
        let order = topological_order(&graph, &[1.0, 1.0]);
        let names: Vec<&str> = order.iter().map(|&node| graph.node_name(node)).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_mismatched_assignment_rejected() {
        let (augmented, _) = hub_network();
        let (_, other) = solve(&[("A", "D", 3.0)], &["A"], &["D"]);

        assert!(matches!(
            ProportionalAttribution::default().attribute(&augmented, &other),
            Err(FlowError::AssignmentMismatch { .. })
        ));
    }
}
