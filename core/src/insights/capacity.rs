//! Capacity and load analysis
//!
//! Upper bounds derived from terminal capacities alone, plus per-edge and
//! per-node load figures for a solved flow.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::algorithm::graph::max_flow::FlowAssignment;
use crate::algorithm::traits::{Capacity, Flow, FlowError, NodeId, Result, TerminalRole};
use crate::config::{reaches, SolverConfig};
use crate::data_structures::graph::CapacityGraph;

/// Flow bounds implied by the terminals' incident capacities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkCapacity {
    /// Sum of outgoing capacity over all sources
    pub source_total_capacity: Capacity,
    /// Sum of incoming capacity over all sinks
    pub sink_total_capacity: Capacity,
    /// Smaller of the two; no flow can exceed it
    pub max_possible_flow: Capacity,
}

/// Terminal capacity bounds for a multi-terminal query
///
/// Duplicate terminal names are counted once.
pub fn analyze_network_capacity<S: AsRef<str>>(
    graph: &CapacityGraph,
    sources: &[S],
    sinks: &[S],
) -> Result<NetworkCapacity> {
    if sources.is_empty() {
        return Err(FlowError::EmptyTerminalSet(TerminalRole::Source));
    }
    if sinks.is_empty() {
        return Err(FlowError::EmptyTerminalSet(TerminalRole::Sink));
    }

    let source_total_capacity = distinct_total(graph, sources, CapacityGraph::out_capacity_of)?;
    let sink_total_capacity = distinct_total(graph, sinks, CapacityGraph::in_capacity_of)?;

    Ok(NetworkCapacity {
        source_total_capacity,
        sink_total_capacity,
        max_possible_flow: source_total_capacity.min(sink_total_capacity),
    })
}

fn distinct_total<S, F>(graph: &CapacityGraph, names: &[S], capacity_of: F) -> Result<Capacity>
where
    S: AsRef<str>,
    F: Fn(&CapacityGraph, NodeId) -> Capacity,
{
    let mut seen = Vec::with_capacity(names.len());
    let mut total = 0.0;
    for name in names {
        let id = graph.require_node(name.as_ref())?;
        if !seen.contains(&id) {
            seen.push(id);
            total += capacity_of(graph, id);
        }
    }
    Ok(total)
}

/// `flow / capacity`, zero for zero-capacity edges
#[inline]
pub fn utilization(flow: Flow, capacity: Capacity) -> f64 {
    if capacity > 0.0 {
        flow / capacity
    } else {
        0.0
    }
}

/// Load carried by one edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeLoad {
    pub from: String,
    pub to: String,
    pub flow: Flow,
    pub capacity: Capacity,
    pub utilization: f64,
    pub saturated: bool,
}

/// Per-edge loads in the assignment's edge order
///
/// An edge is saturated once its flow reaches capacity within
/// `config.optimality_epsilon`, the same test the verifier applies.
pub fn edge_loads(assignment: &FlowAssignment, config: &SolverConfig) -> Vec<EdgeLoad> {
    assignment
        .edge_flows()
        .iter()
        .map(|edge| {
            let utilization = utilization(edge.flow, edge.capacity);
            EdgeLoad {
                from: edge.from.clone(),
                to: edge.to.clone(),
                flow: edge.flow,
                capacity: edge.capacity,
                utilization,
                saturated: edge.capacity > 0.0
                    && reaches(edge.flow, edge.capacity, config.optimality_epsilon),
            }
        })
        .collect()
}

/// Throughput of one node relative to what its edges could carry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLoad {
    pub node: String,
    pub inflow: Flow,
    pub outflow: Flow,
    pub throughput: Flow,
    /// Larger of the node's total incoming and outgoing capacity
    pub capacity: Capacity,
    pub load: f64,
}

/// Loads for every node of `graph`, in node insertion order
///
/// Only edges that exist in `graph` are counted, so an assignment solved on
/// an augmented copy reports the real network's view of each node.
pub fn node_loads(graph: &CapacityGraph, assignment: &FlowAssignment) -> Vec<NodeLoad> {
    let flows: HashMap<(&str, &str), Flow> = assignment
        .edge_flows()
        .iter()
        .map(|edge| ((edge.from.as_str(), edge.to.as_str()), edge.flow))
        .collect();

    let mut inflow = vec![0.0; graph.node_count()];
    let mut outflow = vec![0.0; graph.node_count()];
    for edge_index in 0..graph.edge_count() {
        let (source, target, _) = graph.edge_at(edge_index);
        let flow = flows
            .get(&(graph.node_name(source), graph.node_name(target)))
            .copied()
            .unwrap_or(0.0);
        outflow[source.as_usize()] += flow;
        inflow[target.as_usize()] += flow;
    }

    (0..graph.node_count())
        .map(|index| {
            let id = NodeId(index);
            let capacity = graph.in_capacity_of(id).max(graph.out_capacity_of(id));
            let throughput = inflow[index].max(outflow[index]);
            NodeLoad {
                node: graph.node_name(id).to_string(),
                inflow: inflow[index],
                outflow: outflow[index],
                throughput,
                capacity,
                load: utilization(throughput, capacity),
            }
        })
        .collect()
}

/// Flow passing through `node`: the larger of its inflow and outflow
pub fn node_throughput(assignment: &FlowAssignment, node: &str) -> Flow {
    assignment.inflow(node).max(assignment.outflow(node))
}
