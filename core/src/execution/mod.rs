//! Execution layer: pipelines and owned sessions
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod pipeline;
pub mod session;

pub use self::pipeline::{
    solve_max_flow, solve_unified_max_flow, FlowPipeline, PairFlow, UnifiedFlowAnalysis,
};
pub use self::session::{CapacityUpdate, NetworkSession, NetworkStatus};
