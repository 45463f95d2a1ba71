//! Shared terminal output helpers

use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), tributary_core::FlowError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_kv(key: &str, value: &str) {
    println!("  {key:<24} {value}");
}

/// Compact rendering of flow quantities: integers without a fraction
pub fn format_flow(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.3}")
    }
}
