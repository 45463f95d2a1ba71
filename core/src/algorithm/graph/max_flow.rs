//! Maximum flow via Edmonds-Karp
//!
//! Shortest augmenting paths are found by breadth-first search over a
//! residual network of paired forward/reverse arcs. Arcs are scanned in edge
//! insertion order, so identical graphs always produce identical flow
//! assignments.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::VecDeque;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{
    Capacity, Flow, FlowSolver, NodeId, Result, SolveMetrics, SolveProfiler,
};
use crate::config::SolverConfig;
use crate::data_structures::graph::CapacityGraph;

/// How a solve ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// No augmenting path remains
    Optimal,
    /// The augmentation cap was reached while a path still existed
    Truncated,
}

/// Residual arc with paired reverse arc
#[derive(Debug, Clone)]
struct FlowArc {
    to: NodeId,
    capacity: Capacity,
    flow: Flow,
    /// Index of the paired arc in the opposite direction
    reverse: usize,
}

impl FlowArc {
    #[inline]
    fn residual_capacity(&self) -> Capacity {
        self.capacity - self.flow
    }
}

/// Solver-private residual state, built fresh for every solve
///
/// Edge `e` of the graph owns forward arc `2e` and reverse arc `2e + 1`.
/// The reverse arc has zero capacity, so its residual equals the flow
/// already pushed forward.
#[derive(Debug, Clone)]
struct FlowNetwork {
    arcs: Vec<FlowArc>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowNetwork {
    fn from_graph(graph: &CapacityGraph) -> Self {
        let mut network = Self {
            arcs: Vec::with_capacity(graph.edge_count() * 2),
            adjacency: vec![Vec::new(); graph.node_count()],
        };
        for edge_index in 0..graph.edge_count() {
            let (source, target, capacity) = graph.edge_at(edge_index);
            network.add_edge(source, target, capacity);
        }
        network
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, capacity: Capacity) {
        let forward_index = self.arcs.len();
        let reverse_index = forward_index + 1;

        self.arcs.push(FlowArc {
            to,
            capacity,
            flow: 0.0,
            reverse: reverse_index,
        });
        self.arcs.push(FlowArc {
            to: from,
            capacity: 0.0,
            flow: 0.0,
            reverse: forward_index,
        });

        self.adjacency[from.as_usize()].push(forward_index);
        self.adjacency[to.as_usize()].push(reverse_index);
    }

    /// Shortest augmenting path as a list of arc indices, source first
    fn find_augmenting_path(
        &self,
        source: NodeId,
        sink: NodeId,
        tolerance: Capacity,
        profiler: &mut SolveProfiler,
    ) -> Option<Vec<usize>> {
        let mut parent_arc: Vec<Option<usize>> = vec![None; self.adjacency.len()];
        let mut visited = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::new();

        visited[source.as_usize()] = true;
        queue.push_back(source);

        while let Some(node) = queue.pop_front() {
            profiler.record_node_exploration();

            for &arc_index in &self.adjacency[node.as_usize()] {
                let arc = &self.arcs[arc_index];
                let next = arc.to.as_usize();
                if visited[next] || arc.residual_capacity() <= tolerance {
                    continue;
                }
                visited[next] = true;
                parent_arc[next] = Some(arc_index);

                if arc.to == sink {
                    return Some(self.trace_path(&parent_arc, sink));
                }
                queue.push_back(arc.to);
            }
        }

        None
    }

    fn trace_path(&self, parent_arc: &[Option<usize>], sink: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut node = sink.as_usize();
        while let Some(arc_index) = parent_arc[node] {
            path.push(arc_index);
            // The paired arc points back at the node we came from
            node = self.arcs[self.arcs[arc_index].reverse].to.as_usize();
        }
        path.reverse();
        path
    }

    fn bottleneck(&self, path: &[usize]) -> Flow {
        path.iter()
            .map(|&arc_index| self.arcs[arc_index].residual_capacity())
            .fold(Flow::INFINITY, Flow::min)
    }

    fn augment(&mut self, path: &[usize], delta: Flow) {
        for &arc_index in path {
            let reverse = self.arcs[arc_index].reverse;
            self.arcs[arc_index].flow += delta;
            self.arcs[reverse].flow -= delta;
        }
    }

    /// Net flow on graph edge `edge_index`, clamped into `[0, capacity]`
    fn edge_flow(&self, edge_index: usize) -> Flow {
        let arc = &self.arcs[2 * edge_index];
        arc.flow.clamp(0.0, arc.capacity)
    }
}

/// Flow carried by one edge of the solved graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFlow {
    pub from: String,
    pub to: String,
    pub capacity: Capacity,
    pub flow: Flow,
}

/// Immutable result of a maximum-flow solve
///
/// `edges` follows the solved graph's edge insertion order, so position `i`
/// describes edge `i` of that graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAssignment {
    pub source: String,
    pub sink: String,
    pub value: Flow,
    pub edges: Vec<EdgeFlow>,
    pub termination: Termination,
    pub metrics: SolveMetrics,
}

impl FlowAssignment {
    #[inline]
    pub fn value(&self) -> Flow {
        self.value
    }

    pub fn is_truncated(&self) -> bool {
        self.termination == Termination::Truncated
    }

    /// Flow on `from -> to`, zero when the edge does not exist
    pub fn flow(&self, from: &str, to: &str) -> Flow {
        self.edges
            .iter()
            .find(|edge| edge.from == from && edge.to == to)
            .map_or(0.0, |edge| edge.flow)
    }

    #[inline]
    pub fn flow_at(&self, edge_index: usize) -> Flow {
        self.edges[edge_index].flow
    }

    pub fn edge_flows(&self) -> &[EdgeFlow] {
        &self.edges
    }

    pub fn inflow(&self, node: &str) -> Flow {
        self.edges
            .iter()
            .filter(|edge| edge.to == node)
            .map(|edge| edge.flow)
            .sum()
    }

    pub fn outflow(&self, node: &str) -> Flow {
        self.edges
            .iter()
            .filter(|edge| edge.from == node)
            .map(|edge| edge.flow)
            .sum()
    }

    /// Edges carrying strictly positive flow
    pub fn active_edges(&self) -> impl Iterator<Item = &EdgeFlow> + '_ {
        self.edges.iter().filter(|edge| edge.flow > 0.0)
    }
}

/// Edmonds-Karp maximum-flow solver
#[derive(Debug, Clone, Default)]
pub struct EdmondsKarp {
    config: SolverConfig,
}

impl EdmondsKarp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solves between two node handles of `graph`
    pub fn solve_ids(&self, graph: &CapacityGraph, source: NodeId, sink: NodeId) -> FlowAssignment {
        let mut profiler = SolveProfiler::new();
        profiler.start();

        let mut network = FlowNetwork::from_graph(graph);
        let mut total: Flow = 0.0;
        let mut termination = Termination::Optimal;
        let tolerance = self.config.residual_tolerance;

        if source != sink {
            while let Some(path) = network.find_augmenting_path(source, sink, tolerance, &mut profiler) {
                if self
                    .config
                    .max_augmentations
                    .is_some_and(|limit| profiler.augmentations() >= limit)
                {
                    termination = Termination::Truncated;
                    break;
                }

                let delta = network.bottleneck(&path);
                network.augment(&path, delta);
                total += delta;
                profiler.record_augmentation();
                trace!(
                    "Augmentation {}: {} units over {} arcs",
                    profiler.augmentations(),
                    delta,
                    path.len()
                );
            }
        }

        let mut flows: Vec<Flow> = (0..graph.edge_count())
            .map(|edge_index| network.edge_flow(edge_index))
            .collect();
        cancel_opposing_flows(graph, &mut flows);

        let metrics = profiler.into_metrics();
        debug!(
            "Edmonds-Karp {} -> {}: {} units after {} augmentations ({:?})",
            graph.node_name(source),
            graph.node_name(sink),
            total,
            metrics.augmentations,
            termination
        );

        FlowAssignment {
            source: graph.node_name(source).to_string(),
            sink: graph.node_name(sink).to_string(),
            value: total,
            edges: graph
                .edges()
                .zip(flows)
                .map(|((from, to, capacity), flow)| EdgeFlow {
                    from: from.to_string(),
                    to: to.to_string(),
                    capacity,
                    flow,
                })
                .collect(),
            termination,
            metrics,
        }
    }
}

/// Removes 2-cycles where both `u -> v` and `v -> u` carry flow
fn cancel_opposing_flows(graph: &CapacityGraph, flows: &mut [Flow]) {
    for edge_index in 0..graph.edge_count() {
        let (source, target, _) = graph.edge_at(edge_index);
        let Some(opposite) = graph.edge_index(target, source) else {
            continue;
        };
        if opposite <= edge_index {
            continue;
        }
        let shared = flows[edge_index].min(flows[opposite]);
        if shared > 0.0 {
            flows[edge_index] -= shared;
            flows[opposite] -= shared;
        }
    }
}

impl FlowSolver for EdmondsKarp {
    fn name(&self) -> &'static str {
        "Edmonds-Karp"
    }

    fn description(&self) -> String {
        "Ford-Fulkerson with breadth-first shortest augmenting paths; \
         O(V * E) augmentations of O(E) each, O(V * E^2) overall."
            .to_string()
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        self.config.set_parameter(name, value)
    }

    fn get_parameter(&self, name: &str) -> Option<String> {
        self.config.get_parameter(name)
    }

    fn solve(&self, graph: &CapacityGraph, source: &str, sink: &str) -> Result<FlowAssignment> {
        let source = graph.require_node(source)?;
        let sink = graph.require_node(sink)?;
        Ok(self.solve_ids(graph, source, sink))
    }
}
