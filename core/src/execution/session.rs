//! Owned network state for interactive hosts
//!
//! A session holds the current graph, the edge list it was loaded from (for
//! resets), the default terminal sets, the node layout and a configured
//! pipeline. Hosts such as the CLI keep one session per loaded network
//! instead of sharing global state.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use log::info;
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{Capacity, Result};
use crate::data_structures::description::{NetworkDescription, NodeLayout};
use crate::data_structures::graph::{CapacityGraph, EdgeKey, EdgeRecord};
use crate::execution::pipeline::{FlowPipeline, PairFlow, UnifiedFlowAnalysis};
use crate::insights::presentation::FlowRenderer;

/// Applied capacity change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityUpdate {
    pub edge: EdgeKey,
    pub old: Capacity,
    pub new: Capacity,
}

/// Snapshot of the session's current graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkStatus {
    pub node_count: usize,
    pub edge_count: usize,
    pub edges: Vec<EdgeRecord>,
}

#[derive(Debug)]
pub struct NetworkSession {
    graph: CapacityGraph,
    baseline: Vec<EdgeRecord>,
    sources: Vec<String>,
    sinks: Vec<String>,
    layout: NodeLayout,
    pipeline: FlowPipeline,
}

impl NetworkSession {
    /// Session over `graph` with the default pipeline
    pub fn new(graph: CapacityGraph, sources: Vec<String>, sinks: Vec<String>) -> Self {
        Self {
            baseline: graph.edge_records(),
            graph,
            sources,
            sinks,
            layout: NodeLayout::new(),
            pipeline: FlowPipeline::default(),
        }
    }

    /// Builds the graph and a pipeline configured from the description
    pub fn from_description(description: &NetworkDescription) -> Result<Self> {
        let graph = description.build_graph()?;
        let pipeline = FlowPipeline::new(description.config.clone())?;
        info!(
            "Loaded network: {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        Ok(Self {
            baseline: description.edges.clone(),
            graph,
            sources: description.sources.clone(),
            sinks: description.sinks.clone(),
            layout: description.positions.clone(),
            pipeline,
        })
    }

    pub fn with_pipeline(mut self, pipeline: FlowPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_layout(mut self, layout: NodeLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn graph(&self) -> &CapacityGraph {
        &self.graph
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn sinks(&self) -> &[String] {
        &self.sinks
    }

    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn pipeline(&self) -> &FlowPipeline {
        &self.pipeline
    }

    /// Replaces the default terminal sets used by [`Self::analyze`]
    pub fn set_terminals(&mut self, sources: Vec<String>, sinks: Vec<String>) {
        self.sources = sources;
        self.sinks = sinks;
    }

    pub fn update_capacity(&mut self, from: &str, to: &str, capacity: Capacity) -> Result<CapacityUpdate> {
        let old = self.graph.update_capacity(from, to, capacity)?;
        Ok(CapacityUpdate {
            edge: EdgeKey::new(from, to),
            old,
            new: capacity,
        })
    }

    /// Like [`Self::update_capacity`], addressing the edge as `"FROM -> TO"`
    pub fn update_capacity_by_label(&mut self, label: &str, capacity: Capacity) -> Result<CapacityUpdate> {
        let key: EdgeKey = label.parse()?;
        self.update_capacity(&key.from, &key.to, capacity)
    }

    /// Restores every capacity to its loaded value
    pub fn reset(&mut self) -> Result<()> {
        self.graph = CapacityGraph::from_records(&self.baseline)?;
        info!("Network reset to {} baseline edges", self.baseline.len());
        Ok(())
    }

    pub fn status(&self) -> NetworkStatus {
        NetworkStatus {
            node_count: self.graph.node_count(),
            edge_count: self.graph.edge_count(),
            edges: self.graph.edge_records(),
        }
    }

    /// Unified analysis from the session's sources to its sinks
    pub fn analyze(&self) -> Result<UnifiedFlowAnalysis> {
        self.pipeline
            .solve_unified_max_flow(&self.graph, &self.sources, &self.sinks)
    }

    pub fn pairwise(&self) -> Result<Vec<PairFlow>> {
        self.pipeline
            .pairwise_max_flow(&self.graph, &self.sources, &self.sinks)
    }

    /// Hands the current graph, `analysis` and the layout to `renderer`
    pub fn render<R: FlowRenderer>(&self, renderer: &R, analysis: &UnifiedFlowAnalysis) -> Result<R::Output> {
        renderer.render(&self.graph, &analysis.assignment, &self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::graph::max_flow::FlowAssignment;
    use crate::algorithm::traits::FlowError;

    const NETWORK: &str = r#"{
        "edges": [
            { "from": "A", "to": "H", "capacity": 10 },
            { "from": "B", "to": "H", "capacity": 5 },
            { "from": "H", "to": "D1", "capacity": 6 },
            { "from": "H", "to": "D2", "capacity": 9 }
        ],
        "sources": ["A", "B"],
        "sinks": ["D1", "D2"],
        "positions": {
            "A": { "x": 0.0, "y": 0.0 },
            "H": { "x": 1.0, "y": 0.5 }
        }
    }"#;

    fn session() -> NetworkSession {
        let description = NetworkDescription::from_json_str(NETWORK).unwrap();
        NetworkSession::from_description(&description).unwrap()
    }

    #[test]
    fn test_session_analysis() {
        let session = session();
        let analysis = session.analyze().unwrap();

        assert_eq!(analysis.max_flow, 15.0);
        assert_eq!(session.layout().len(), 2);
        assert_eq!(session.pairwise().unwrap().len(), 4);
    }

    #[test]
    fn test_update_then_reset() {
        let mut session = session();

        let update = session.update_capacity_by_label("H -> D1", 2.0).unwrap();
        assert_eq!(update.edge, EdgeKey::new("H", "D1"));
        assert_eq!(update.old, 6.0);
        assert_eq!(session.analyze().unwrap().max_flow, 11.0);

        session.reset().unwrap();
        assert_eq!(session.graph().capacity("H", "D1"), Some(6.0));
        assert_eq!(session.analyze().unwrap().max_flow, 15.0);
    }

    #[test]
    fn test_update_errors_leave_graph_unchanged() {
        let mut session = session();

        assert!(matches!(
            session.update_capacity("A", "D1", 3.0),
            Err(FlowError::UnknownEdge { .. })
        ));
        assert!(matches!(
            session.update_capacity("A", "H", 0.0),
            Err(FlowError::InvalidCapacity { .. })
        ));
        assert!(matches!(
            session.update_capacity_by_label("A H", 3.0),
            Err(FlowError::InvalidEdgeLabel(_))
        ));
        assert_eq!(session.graph().capacity("A", "H"), Some(10.0));
    }

    #[test]
    fn test_status() {
        let status = session().status();
        assert_eq!(status.node_count, 5);
        assert_eq!(status.edge_count, 4);
        assert_eq!(status.edges[0], EdgeRecord::new("A", "H", 10.0));
    }

    #[test]
    fn test_empty_terminals_in_description() {
        let mut session = session();
        session.set_terminals(Vec::new(), vec!["D1".to_string()]);
        assert!(matches!(
            session.analyze(),
            Err(FlowError::EmptyTerminalSet(_))
        ));
    }

    struct EdgeCounter;

    impl FlowRenderer for EdgeCounter {
        type Output = (usize, usize);

        fn render(
            &self,
            graph: &CapacityGraph,
            assignment: &FlowAssignment,
            layout: &NodeLayout,
        ) -> Result<Self::Output> {
            Ok((graph.edge_count(), assignment.edges.len() + layout.len()))
        }
    }

    #[test]
    fn test_render_uses_real_graph() {
        let session = session();
        let analysis = session.analyze().unwrap();

        // 4 real edges; 8 augmented edges plus 2 positions
        assert_eq!(session.render(&EdgeCounter, &analysis).unwrap(), (4, 10));
    }
}
