//! Solver configuration
//!
//! Numeric tolerances, the optional augmentation cap and the labels used for
//! synthetic super nodes. Values can be deserialized from a network
//! description or tuned one at a time through the string parameter API.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{FlowError, Result};

/// Configuration shared by the solver, verifier and disaggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Residual capacity at or below this value is treated as exhausted
    pub residual_tolerance: f64,

    /// Allowed gap between max flow and min cut value
    pub optimality_epsilon: f64,

    /// Attributions at or below this value are dropped
    pub attribution_threshold: f64,

    /// Stop after this many augmentations and mark the result truncated
    pub max_augmentations: Option<usize>,

    pub super_source_label: String,
    pub super_sink_label: String,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            residual_tolerance: 1e-12,
            optimality_epsilon: 1e-9,
            attribution_threshold: 1e-9,
            max_augmentations: None,
            super_source_label: "SUPER_SOURCE".to_string(),
            super_sink_label: "SUPER_SINK".to_string(),
        }
    }
}

impl SolverConfig {
    /// Names accepted by [`SolverConfig::set_parameter`]
    pub const PARAMETERS: [&'static str; 6] = [
        "residual_tolerance",
        "optimality_epsilon",
        "attribution_threshold",
        "max_augmentations",
        "super_source_label",
        "super_sink_label",
    ];

    /// Checks every field for a usable value
    pub fn validate(&self) -> Result<()> {
        check_tolerance("residual_tolerance", self.residual_tolerance)?;
        check_tolerance("optimality_epsilon", self.optimality_epsilon)?;
        check_tolerance("attribution_threshold", self.attribution_threshold)?;

        if self.max_augmentations == Some(0) {
            return Err(invalid("max_augmentations", "must be at least 1"));
        }
        if self.super_source_label.trim().is_empty() {
            return Err(invalid("super_source_label", "must not be empty"));
        }
        if self.super_sink_label.trim().is_empty() {
            return Err(invalid("super_sink_label", "must not be empty"));
        }
        if self.super_source_label == self.super_sink_label {
            return Err(invalid(
                "super_sink_label",
                "must differ from super_source_label",
            ));
        }
        Ok(())
    }

    /// Sets one parameter from its textual form
    ///
    /// The configuration is left untouched when the value is rejected.
    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        let mut candidate = self.clone();
        match name {
            "residual_tolerance" => candidate.residual_tolerance = parse_float(name, value)?,
            "optimality_epsilon" => candidate.optimality_epsilon = parse_float(name, value)?,
            "attribution_threshold" => {
                candidate.attribution_threshold = parse_float(name, value)?
            }
            "max_augmentations" => {
                candidate.max_augmentations = match value.trim() {
                    "" | "none" | "unlimited" => None,
                    text => Some(text.parse::<usize>().map_err(|_| {
                        invalid(name, "must be a positive integer or 'none'")
                    })?),
                }
            }
            "super_source_label" => candidate.super_source_label = value.to_string(),
            "super_sink_label" => candidate.super_sink_label = value.to_string(),
            _ => return Err(invalid(name, "unknown parameter")),
        }
        candidate.validate()?;
        *self = candidate;
        Ok(())
    }

    pub fn get_parameter(&self, name: &str) -> Option<String> {
        match name {
            "residual_tolerance" => Some(self.residual_tolerance.to_string()),
            "optimality_epsilon" => Some(self.optimality_epsilon.to_string()),
            "attribution_threshold" => Some(self.attribution_threshold.to_string()),
            "max_augmentations" => Some(
                self.max_augmentations
                    .map_or_else(|| "none".to_string(), |limit| limit.to_string()),
            ),
            "super_source_label" => Some(self.super_source_label.clone()),
            "super_sink_label" => Some(self.super_sink_label.clone()),
            _ => None,
        }
    }
}

/// `epsilon` scaled to the larger magnitude of `a` and `b`, never below `epsilon`
#[inline]
pub fn scaled_tolerance(epsilon: f64, a: f64, b: f64) -> f64 {
    epsilon * a.abs().max(b.abs()).max(1.0)
}

/// `a == b` up to a relative `epsilon`
#[inline]
pub fn approx_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= scaled_tolerance(epsilon, a, b)
}

/// `value` has reached `limit` up to a relative `epsilon`
#[inline]
pub fn reaches(value: f64, limit: f64, epsilon: f64) -> bool {
    value >= limit - scaled_tolerance(epsilon, value, limit)
}

fn parse_float(name: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| invalid(name, "must be a number"))
}

fn check_tolerance(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(name, "must be a finite non-negative number"));
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> FlowError {
    FlowError::InvalidParameter {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
