//! Compliance classification of a single measured value.

use crate::catalog;
use serde::Serialize;
use std::fmt;
use waterwatch_schemas::parameter::{Limit, Parameter};

/// Fraction of a bound at which a value starts to count as near the limit.
pub const NEAR_THRESHOLD: f64 = 0.8;

/// Relative slack on the near-band edges, so that `1.5 * 0.8` admits `1.2`.
const BAND_EPSILON: f64 = 1e-9;

/// Compliance tier, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    /// No limit applies, or there is no usable value.
    #[serde(rename = "none")]
    Unclassified,
    Normal,
    Near,
    Exceed,
}

impl Compliance {
    pub fn as_str(self) -> &'static str {
        match self {
            Compliance::Unclassified => "none",
            Compliance::Normal => "normal",
            Compliance::Near => "near",
            Compliance::Exceed => "exceed",
        }
    }
}

impl fmt::Display for Compliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies `value` against the catalog limit of `parameter`.
pub fn classify(parameter: Parameter, value: Option<f64>) -> Compliance {
    match (catalog::limit_of(parameter), value) {
        (Some(limit), Some(value)) => classify_against(&limit, value),
        _ => Compliance::Unclassified,
    }
}

/// Both bounds are checked and the more severe tier is returned.
pub fn classify_against(limit: &Limit, value: f64) -> Compliance {
    if !value.is_finite() || limit.is_unbounded() {
        return Compliance::Unclassified;
    }

    let upper = limit.max.map_or(Compliance::Normal, |max| {
        if value > max {
            Compliance::Exceed
        } else if value >= max * NEAR_THRESHOLD - BAND_EPSILON * max.abs() {
            Compliance::Near
        } else {
            Compliance::Normal
        }
    });

    let lower = limit.min.map_or(Compliance::Normal, |min| {
        if value < min {
            Compliance::Exceed
        } else if value <= min * (2.0 - NEAR_THRESHOLD) + BAND_EPSILON * min.abs() {
            Compliance::Near
        } else {
            Compliance::Normal
        }
    });

    upper.max(lower)
}
