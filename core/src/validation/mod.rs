//! Optimality verification for solved flow networks
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod optimality;

pub use self::optimality::{BottleneckLocation, MinCut, OptimalityReport, OptimalityVerifier};
