//! Capacitated directed graph
//!
//! Nodes are opaque string identifiers mapped to dense [`NodeId`] handles in
//! insertion order. Each ordered pair carries at most one edge, and edges are
//! the only place capacity is recorded. Adjacency lists preserve edge
//! insertion order so every traversal over the graph is deterministic.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{Capacity, FlowError, NodeId, Result};

/// 2D node position used by layout-aware collaborators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Plain edge data as supplied by callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub from: String,
    pub to: String,
    pub capacity: Capacity,
}

impl EdgeRecord {
    pub fn new(from: impl Into<String>, to: impl Into<String>, capacity: Capacity) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            capacity,
        }
    }
}

/// Ordered node pair identifying an edge, written `FROM -> TO`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeKey {
    pub from: String,
    pub to: String,
}

impl EdgeKey {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for EdgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl FromStr for EdgeKey {
    type Err = FlowError;

    fn from_str(label: &str) -> Result<Self> {
        let mut parts = label.split("->");
        match (parts.next(), parts.next(), parts.next()) {
            (Some(from), Some(to), None) => {
                let (from, to) = (from.trim(), to.trim());
                if from.is_empty() || to.is_empty() {
                    return Err(FlowError::InvalidEdgeLabel(label.to_string()));
                }
                Ok(Self::new(from, to))
            }
            _ => Err(FlowError::InvalidEdgeLabel(label.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
struct CapacityEdge {
    source: NodeId,
    target: NodeId,
    capacity: Capacity,
}

/// Directed graph with per-edge capacity
#[derive(Debug, Clone, Default)]
pub struct CapacityGraph {
    /// Node names indexed by `NodeId`
    names: Vec<String>,
    index: HashMap<String, NodeId>,
    /// Edges in insertion order
    edges: Vec<CapacityEdge>,
    /// O(1) ordered-pair lookup into `edges`
    lookup: HashMap<(NodeId, NodeId), usize>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl CapacityGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from `(from, to, capacity)` triples
    ///
    /// Fails on the first duplicate ordered pair, self-loop or negative
    /// capacity.
    pub fn from_edges<I, S>(edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, S, Capacity)>,
        S: AsRef<str>,
    {
        let mut graph = Self::new();
        for (from, to, capacity) in edges {
            graph.add_edge(from.as_ref(), to.as_ref(), capacity)?;
        }
        debug!(
            "Built capacity graph with {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    pub fn from_records(records: &[EdgeRecord]) -> Result<Self> {
        Self::from_edges(
            records
                .iter()
                .map(|record| (record.from.as_str(), record.to.as_str(), record.capacity)),
        )
    }

    /// Registers a node, returning the existing handle if already present
    pub fn add_node(&mut self, name: &str) -> NodeId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = NodeId(self.names.len());
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    /// Inserts an edge, registering unknown endpoints
    ///
    /// The graph is unchanged when an error is returned.
    pub fn add_edge(&mut self, from: &str, to: &str, capacity: Capacity) -> Result<()> {
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(FlowError::InvalidCapacity {
                from: from.to_string(),
                to: to.to_string(),
                capacity,
                reason: "capacity must be a finite non-negative number",
            });
        }
        if from == to {
            return Err(FlowError::SelfLoop(from.to_string()));
        }
        if let (Some(&source), Some(&target)) = (self.index.get(from), self.index.get(to)) {
            if self.lookup.contains_key(&(source, target)) {
                return Err(FlowError::DuplicateEdge {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
        }

        let source = self.add_node(from);
        let target = self.add_node(to);
        let edge_index = self.edges.len();
        self.edges.push(CapacityEdge {
            source,
            target,
            capacity,
        });
        self.lookup.insert((source, target), edge_index);
        self.outgoing[source.as_usize()].push(edge_index);
        self.incoming[target.as_usize()].push(edge_index);
        Ok(())
    }

    /// Replaces the capacity of an existing edge and returns the old value
    ///
    /// Assignments computed before the update are not affected.
    pub fn update_capacity(&mut self, from: &str, to: &str, capacity: Capacity) -> Result<Capacity> {
        let edge_index = self
            .find_edge(from, to)
            .ok_or_else(|| FlowError::UnknownEdge {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(FlowError::InvalidCapacity {
                from: from.to_string(),
                to: to.to_string(),
                capacity,
                reason: "updated capacity must be strictly positive",
            });
        }

        let old = std::mem::replace(&mut self.edges[edge_index].capacity, capacity);
        debug!("Updated edge {} -> {}: {} -> {}", from, to, old, capacity);
        Ok(old)
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Resolves a node name or fails with `UnknownNode`
    pub fn require_node(&self, name: &str) -> Result<NodeId> {
        self.node_id(name)
            .ok_or_else(|| FlowError::UnknownNode(name.to_string()))
    }

    /// Name of a node handle issued by this graph
    ///
    /// # Panics
    /// Panics if `id` was not issued by this graph.
    pub fn node_name(&self, id: NodeId) -> &str {
        &self.names[id.as_usize()]
    }

    /// Node names in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// `(from, to, capacity)` triples in insertion order
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, Capacity)> + '_ {
        self.edges.iter().map(move |edge| {
            (
                self.node_name(edge.source),
                self.node_name(edge.target),
                edge.capacity,
            )
        })
    }

    pub fn edge_records(&self) -> Vec<EdgeRecord> {
        self.edges()
            .map(|(from, to, capacity)| EdgeRecord::new(from, to, capacity))
            .collect()
    }

    /// `FROM -> TO` labels for every edge, for host-side completion
    pub fn edge_labels(&self) -> Vec<String> {
        self.edges()
            .map(|(from, to, _)| EdgeKey::new(from, to).to_string())
            .collect()
    }

    pub fn capacity(&self, from: &str, to: &str) -> Option<Capacity> {
        self.find_edge(from, to)
            .map(|edge_index| self.edges[edge_index].capacity)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.find_edge(from, to).is_some()
    }

    /// Successor names in edge insertion order
    pub fn successors(&self, node: &str) -> Result<Vec<&str>> {
        let id = self.require_node(node)?;
        Ok(self
            .successor_ids(id)
            .map(|target| self.node_name(target))
            .collect())
    }

    /// Predecessor names in edge insertion order
    pub fn predecessors(&self, node: &str) -> Result<Vec<&str>> {
        let id = self.require_node(node)?;
        Ok(self
            .predecessor_ids(id)
            .map(|source| self.node_name(source))
            .collect())
    }

    pub fn total_out_capacity(&self, node: &str) -> Result<Capacity> {
        self.require_node(node).map(|id| self.out_capacity_of(id))
    }

    pub fn total_in_capacity(&self, node: &str) -> Result<Capacity> {
        self.require_node(node).map(|id| self.in_capacity_of(id))
    }

    pub fn successor_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.outgoing[id.as_usize()]
            .iter()
            .map(move |&edge_index| self.edges[edge_index].target)
    }

    pub fn predecessor_ids(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.incoming[id.as_usize()]
            .iter()
            .map(move |&edge_index| self.edges[edge_index].source)
    }

    pub fn out_capacity_of(&self, id: NodeId) -> Capacity {
        self.outgoing[id.as_usize()]
            .iter()
            .map(|&edge_index| self.edges[edge_index].capacity)
            .sum()
    }

    pub fn in_capacity_of(&self, id: NodeId) -> Capacity {
        self.incoming[id.as_usize()]
            .iter()
            .map(|&edge_index| self.edges[edge_index].capacity)
            .sum()
    }

    /// Index of the edge `source -> target` in insertion order
    pub fn edge_index(&self, source: NodeId, target: NodeId) -> Option<usize> {
        self.lookup.get(&(source, target)).copied()
    }

    /// `(source, target, capacity)` of the edge at `edge_index`
    pub fn edge_at(&self, edge_index: usize) -> (NodeId, NodeId, Capacity) {
        let edge = &self.edges[edge_index];
        (edge.source, edge.target, edge.capacity)
    }

    /// Indices of edges leaving `id`, in insertion order
    pub fn outgoing_edges(&self, id: NodeId) -> &[usize] {
        &self.outgoing[id.as_usize()]
    }

    /// Indices of edges entering `id`, in insertion order
    pub fn incoming_edges(&self, id: NodeId) -> &[usize] {
        &self.incoming[id.as_usize()]
    }

    fn find_edge(&self, from: &str, to: &str) -> Option<usize> {
        let source = self.node_id(from)?;
        let target = self.node_id(to)?;
        self.edge_index(source, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_graph_construction() {
        let graph = hub_graph();

        assert_eq!(graph.node_count(), 5);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.nodes().collect::<Vec<_>>(), vec!["A", "H", "B", "D1", "D2"]);
        assert_eq!(graph.capacity("B", "H"), Some(5.0));
        assert_eq!(graph.capacity("H", "B"), None);
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let mut graph = hub_graph();
        let err = graph.add_edge("A", "H", 3.0).unwrap_err();

        assert!(matches!(err, FlowError::DuplicateEdge { ref from, ref to } if from == "A" && to == "H"));
        assert_eq!(graph.capacity("A", "H"), Some(10.0));
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_reverse_direction_is_a_distinct_edge() {
        let mut graph = hub_graph();
        assert!(graph.add_edge("H", "A", 2.0).is_ok());
        assert_eq!(graph.edge_count(), 5);
    }

    #[test]
    fn test_invalid_insertions_leave_graph_unchanged() {
        let mut graph = hub_graph();

        assert!(matches!(
            graph.add_edge("X", "Y", -1.0),
            Err(FlowError::InvalidCapacity { .. })
        ));
        assert!(matches!(
            graph.add_edge("X", "Y", f64::NAN),
            Err(FlowError::InvalidCapacity { .. })
        ));
        assert!(matches!(graph.add_edge("X", "X", 1.0), Err(FlowError::SelfLoop(_))));
        assert!(!graph.contains("X"));
        assert_eq!(graph.node_count(), 5);
    }

    #[test]
    fn test_zero_capacity_edge_is_valid() {
        let graph = CapacityGraph::from_edges([("A", "B", 0.0)]).unwrap();
        assert_eq!(graph.capacity("A", "B"), Some(0.0));
    }

    #[test]
    fn test_update_capacity() {
        let mut graph = hub_graph();

        assert_eq!(graph.update_capacity("H", "D1", 8.0).unwrap(), 6.0);
        assert_eq!(graph.capacity("H", "D1"), Some(8.0));

        assert!(matches!(
            graph.update_capacity("D1", "H", 8.0),
            Err(FlowError::UnknownEdge { .. })
        ));
        assert!(matches!(
            graph.update_capacity("H", "D1", 0.0),
            Err(FlowError::InvalidCapacity { .. })
        ));
        assert!(matches!(
            graph.update_capacity("H", "D1", -4.0),
            Err(FlowError::InvalidCapacity { .. })
        ));
        assert_eq!(graph.capacity("H", "D1"), Some(8.0));
    }

    #[test]
    fn test_adjacency_and_totals() {
        let graph = hub_graph();

        assert_eq!(graph.successors("H").unwrap(), vec!["D1", "D2"]);
        assert_eq!(graph.predecessors("H").unwrap(), vec!["A", "B"]);
        assert!(graph.successors("D1").unwrap().is_empty());
        assert!(matches!(graph.successors("Z"), Err(FlowError::UnknownNode(_))));

        assert_eq!(graph.total_out_capacity("H").unwrap(), 15.0);
        assert_eq!(graph.total_in_capacity("H").unwrap(), 15.0);
        assert_eq!(graph.total_in_capacity("A").unwrap(), 0.0);
    }

    #[test]
    fn test_edge_key_parsing() {
        let key: EdgeKey = "Terminal 1 -> Warehouse 2".parse().unwrap();
        assert_eq!(key, EdgeKey::new("Terminal 1", "Warehouse 2"));
        assert_eq!(key.to_string(), "Terminal 1 -> Warehouse 2");

        assert!("Terminal 1 Warehouse 2".parse::<EdgeKey>().is_err());
        assert!("A -> B -> C".parse::<EdgeKey>().is_err());
        assert!(" -> B".parse::<EdgeKey>().is_err());
    }

    #[test]
    fn test_edge_labels_follow_insertion_order() {
        let graph = hub_graph();
        assert_eq!(
            graph.edge_labels(),
            vec!["A -> H", "B -> H", "H -> D1", "H -> D2"]
        );
    }
}
