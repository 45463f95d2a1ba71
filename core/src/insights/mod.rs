//! Explanations derived from solved flows: attribution, capacity and load
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod attribution;
pub mod capacity;
pub mod presentation;

pub use self::attribution::{
    AttributionRecord, AttributionStrategy, FlowDisaggregator, PathDecompositionAttribution,
    ProportionalAttribution,
};
pub use self::capacity::{EdgeLoad, NetworkCapacity, NodeLoad};
pub use self::presentation::FlowRenderer;
