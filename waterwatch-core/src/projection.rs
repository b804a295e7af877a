//! Chart-ready time series built from a sample collection.

use crate::catalog;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;
use waterwatch_schemas::{parameter::Parameter, sample::Sample};

pub const LEGAL_MAX_LABEL: &str = "Legal max";
pub const LEGAL_MIN_LABEL: &str = "Legal min";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// A constant overlay repeated once per series point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceLine {
    pub label: &'static str,
    pub value: f64,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub parameter: Parameter,
    pub points: Vec<SeriesPoint>,
    pub reference_lines: Vec<ReferenceLine>,
}

impl TimeSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest and largest plotted value, overlays included.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        self.points
            .iter()
            .map(|p| p.value)
            .chain(self.reference_lines.iter().map(|l| l.value))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    pub reference_lines: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self { reference_lines: true }
    }
}

/// Projects `samples` onto `parameter` with the default options.
pub fn project(samples: &[Sample], parameter: Parameter) -> TimeSeries {
    project_with(samples, parameter, ProjectionOptions::default())
}

/// Keeps samples with a finite value for `parameter` and orders them by
/// timestamp. Equal timestamps keep their arrival order.
pub fn project_with(samples: &[Sample], parameter: Parameter, options: ProjectionOptions) -> TimeSeries {
    let mut points: Vec<SeriesPoint> = samples
        .iter()
        .filter_map(|s| {
            s.value(parameter)
                .filter(|v| v.is_finite())
                .map(|value| SeriesPoint { timestamp: s.timestamp, value })
        })
        .collect();
    points.sort_by_key(|p| p.timestamp);

    let mut reference_lines = Vec::new();
    if options.reference_lines {
        if let Some(limit) = catalog::limit_of(parameter) {
            if let Some(max) = limit.max {
                reference_lines.push(reference_line(LEGAL_MAX_LABEL, max, points.len()));
            }
            if let Some(min) = limit.min {
                reference_lines.push(reference_line(LEGAL_MIN_LABEL, min, points.len()));
            }
        }
    }

    debug!(
        parameter = %parameter,
        samples = samples.len(),
        points = points.len(),
        overlays = reference_lines.len(),
        "Projected time series"
    );

    TimeSeries { parameter, points, reference_lines }
}

fn reference_line(label: &'static str, value: f64, len: usize) -> ReferenceLine {
    ReferenceLine { label, value, data: vec![value; len] }
}
