//! Network data structures: capacity graph, shared handle and descriptions
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod description;
pub mod graph;
pub mod shared;

pub use self::description::{NetworkDescription, NodeLayout};
pub use self::graph::{CapacityGraph, EdgeKey, EdgeRecord, Position};
pub use self::shared::SharedCapacityGraph;
