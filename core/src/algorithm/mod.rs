//! TRIBUTARY algorithm framework
//! Maximum-flow solving and multi-terminal reduction
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod graph;
pub mod traits;

pub use self::graph::*;
pub use self::traits::*;
