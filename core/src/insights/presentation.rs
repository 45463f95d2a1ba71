//! Rendering seam for solved networks
//!
//! The engine itself draws nothing. Front ends implement [`FlowRenderer`]
//! to turn a graph, its flow and the node layout into whatever they display.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use crate::algorithm::graph::max_flow::FlowAssignment;
use crate::algorithm::traits::Result;
use crate::data_structures::description::NodeLayout;
use crate::data_structures::graph::CapacityGraph;

/// Turns a solved network into a presentable artifact
pub trait FlowRenderer {
    type Output;

    fn render(
        &self,
        graph: &CapacityGraph,
        assignment: &FlowAssignment,
        layout: &NodeLayout,
    ) -> Result<Self::Output>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::graph::max_flow::EdmondsKarp;
    use crate::algorithm::traits::{FlowError, FlowSolver};
    use crate::data_structures::graph::Position;

    /// Emits one `from -> to flow/capacity @ (x, y)` line per loaded edge
    struct LineRenderer;

    impl FlowRenderer for LineRenderer {
        type Output = Vec<String>;

        fn render(
            &self,
            _graph: &CapacityGraph,
            assignment: &FlowAssignment,
            layout: &NodeLayout,
        ) -> Result<Self::Output> {
            assignment
                .active_edges()
                .map(|edge| {
                    let position = layout
                        .get(&edge.from)
                        .ok_or_else(|| FlowError::UnknownNode(edge.from.clone()))?;
                    Ok(format!(
                        "{} -> {} {}/{} @ ({}, {})",
                        edge.from, edge.to, edge.flow, edge.capacity, position.x, position.y
                    ))
                })
                .collect()
        }
    }

    #[test]
    fn test_custom_renderer() {
        let graph = CapacityGraph::from_edges([("A", "H", 4.0), ("H", "D", 3.0)]).unwrap();
        let assignment = EdmondsKarp::new().solve(&graph, "A", "D").unwrap();
        let layout: NodeLayout = [
            ("A".to_string(), Position::new(0.0, 0.0)),
            ("H".to_string(), Position::new(1.0, 0.0)),
        ]
        .into_iter()
        .collect();

        let lines = LineRenderer.render(&graph, &assignment, &layout).unwrap();
        assert_eq!(lines, vec!["A -> H 3/4 @ (0, 0)", "H -> D 3/3 @ (1, 0)"]);
    }

    #[test]
    fn test_renderer_errors_propagate() {
        let graph = CapacityGraph::from_edges([("A", "D", 1.0)]).unwrap();
        let assignment = EdmondsKarp::new().solve(&graph, "A", "D").unwrap();

        let result = LineRenderer.render(&graph, &assignment, &NodeLayout::new());
        assert!(matches!(result, Err(FlowError::UnknownNode(_))));
    }
}
