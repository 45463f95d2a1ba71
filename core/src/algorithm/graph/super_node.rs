//! Super-node reduction of multi-terminal flow problems
//!
//! A synthetic source feeds every real source and every real sink drains into
//! a synthetic sink. Each synthetic edge is capped at the terminal's own
//! incident capacity (outgoing for sources, incoming for sinks), so one
//! single-pair solve on the augmented graph answers the multi-terminal
//! question exactly.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::{debug, warn};

use crate::algorithm::traits::{FlowError, NodeId, Result, TerminalRole};
use crate::config::SolverConfig;
use crate::data_structures::graph::CapacityGraph;

/// Copy of a capacity graph extended with a synthetic source and sink
#[derive(Debug, Clone)]
pub struct AugmentedGraph {
    graph: CapacityGraph,
    super_source: NodeId,
    super_sink: NodeId,
    sources: Vec<NodeId>,
    sinks: Vec<NodeId>,
}

impl AugmentedGraph {
    pub fn graph(&self) -> &CapacityGraph {
        &self.graph
    }

    pub fn super_source(&self) -> NodeId {
        self.super_source
    }

    pub fn super_sink(&self) -> NodeId {
        self.super_sink
    }

    pub fn super_source_label(&self) -> &str {
        self.graph.node_name(self.super_source)
    }

    pub fn super_sink_label(&self) -> &str {
        self.graph.node_name(self.super_sink)
    }

    /// Real sources in query order, duplicates removed
    pub fn sources(&self) -> &[NodeId] {
        &self.sources
    }

    /// Real sinks in query order, duplicates removed
    pub fn sinks(&self) -> &[NodeId] {
        &self.sinks
    }

    pub fn is_synthetic(&self, node: NodeId) -> bool {
        node == self.super_source || node == self.super_sink
    }

    /// Index of the synthetic edge feeding `source`
    pub fn source_edge(&self, source: NodeId) -> Option<usize> {
        self.graph.edge_index(self.super_source, source)
    }

    /// Index of the synthetic edge draining `sink`
    pub fn sink_edge(&self, sink: NodeId) -> Option<usize> {
        self.graph.edge_index(sink, self.super_sink)
    }
}

/// Builds [`AugmentedGraph`]s for multi-terminal queries
#[derive(Debug, Clone)]
pub struct SuperNodeReducer {
    source_label: String,
    sink_label: String,
}

impl Default for SuperNodeReducer {
    fn default() -> Self {
        Self::new(&SolverConfig::default())
    }
}

impl SuperNodeReducer {
    pub fn new(config: &SolverConfig) -> Self {
        Self {
            source_label: config.super_source_label.clone(),
            sink_label: config.super_sink_label.clone(),
        }
    }

    /// Builds the augmented graph; `graph` itself is never modified
    pub fn reduce<S: AsRef<str>>(
        &self,
        graph: &CapacityGraph,
        sources: &[S],
        sinks: &[S],
    ) -> Result<AugmentedGraph> {
        if sources.is_empty() {
            return Err(FlowError::EmptyTerminalSet(TerminalRole::Source));
        }
        if sinks.is_empty() {
            return Err(FlowError::EmptyTerminalSet(TerminalRole::Sink));
        }
        let sources = resolve_terminals(graph, sources)?;
        let sinks = resolve_terminals(graph, sinks)?;

        for source in &sources {
            if sinks.contains(source) {
                warn!(
                    "Node {} is both a source and a sink; flow may bypass the network",
                    graph.node_name(*source)
                );
            }
        }

        let mut augmented = graph.clone();
        let source_label = unique_label(&augmented, &self.source_label);
        let super_source = augmented.add_node(&source_label);
        let sink_label = unique_label(&augmented, &self.sink_label);
        let super_sink = augmented.add_node(&sink_label);

        for &source in &sources {
            let capacity = graph.out_capacity_of(source);
            augmented.add_edge(&source_label, graph.node_name(source), capacity)?;
        }
        for &sink in &sinks {
            let capacity = graph.in_capacity_of(sink);
            augmented.add_edge(graph.node_name(sink), &sink_label, capacity)?;
        }

        debug!(
            "Augmented graph: {} sources, {} sinks, {} edges",
            sources.len(),
            sinks.len(),
            augmented.edge_count()
        );

        Ok(AugmentedGraph {
            graph: augmented,
            super_source,
            super_sink,
            sources,
            sinks,
        })
    }
}

fn resolve_terminals<S: AsRef<str>>(graph: &CapacityGraph, names: &[S]) -> Result<Vec<NodeId>> {
    let mut resolved: Vec<NodeId> = Vec::with_capacity(names.len());
    for name in names {
        let id = graph.require_node(name.as_ref())?;
        if !resolved.contains(&id) {
            resolved.push(id);
        }
    }
    Ok(resolved)
}

/// `base`, suffixed with `*` until it names no existing node
fn unique_label(graph: &CapacityGraph, base: &str) -> String {
    let mut label = base.to_string();
    while graph.contains(&label) {
        label.push('*');
    }
    label
}
