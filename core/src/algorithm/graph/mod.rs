//! Flow algorithms over capacity graphs
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod max_flow;
pub mod super_node;

pub use self::max_flow::{EdgeFlow, EdmondsKarp, FlowAssignment, Termination};
pub use self::super_node::{AugmentedGraph, SuperNodeReducer};
