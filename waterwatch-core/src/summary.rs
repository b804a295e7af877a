//! Compliance roll-ups over one sample or a whole collection.

use crate::threshold::{self, Compliance};
use serde::Serialize;
use std::collections::BTreeMap;
use waterwatch_schemas::{parameter::Parameter, sample::Sample};

/// Per-parameter tiers of a single sample, as shown in its detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleCompliance {
    pub sample_id: u64,
    pub parameters: Vec<ParameterCompliance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterCompliance {
    pub parameter: Parameter,
    pub value: Option<f64>,
    pub compliance: Compliance,
}

impl SampleCompliance {
    pub fn of(sample: &Sample) -> Self {
        let parameters = sample
            .values
            .iter()
            .map(|(parameter, value)| ParameterCompliance {
                parameter,
                value,
                compliance: threshold::classify(parameter, value),
            })
            .collect();
        Self { sample_id: sample.id, parameters }
    }

    pub fn worst(&self) -> Compliance {
        self.parameters
            .iter()
            .map(|p| p.compliance)
            .max()
            .unwrap_or(Compliance::Unclassified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TierCounts {
    pub exceed: usize,
    pub near: usize,
    pub normal: usize,
    pub none: usize,
}

impl TierCounts {
    fn add(&mut self, compliance: Compliance) {
        match compliance {
            Compliance::Exceed => self.exceed += 1,
            Compliance::Near => self.near += 1,
            Compliance::Normal => self.normal += 1,
            Compliance::Unclassified => self.none += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ComplianceSummary {
    pub samples: usize,
    pub by_parameter: BTreeMap<Parameter, TierCounts>,
    /// Samples whose worst tier is `exceed`.
    pub samples_exceeding: usize,
}

pub fn summarize(samples: &[Sample]) -> ComplianceSummary {
    let mut summary = ComplianceSummary {
        samples: samples.len(),
        by_parameter: Parameter::ALL.into_iter().map(|p| (p, TierCounts::default())).collect(),
        samples_exceeding: 0,
    };

    for sample in samples {
        let compliance = SampleCompliance::of(sample);
        for entry in &compliance.parameters {
            summary.by_parameter.entry(entry.parameter).or_default().add(entry.compliance);
        }
        if compliance.worst() == Compliance::Exceed {
            summary.samples_exceeding += 1;
        }
    }
    summary
}
