//! Seams to the external sample store and predictor.

use crate::error::WaterwatchError;
use serde::{Deserialize, Serialize};
use waterwatch_schemas::{
    parameter::Parameter,
    query::QuerySpec,
    sample::{NewSample, ParameterValues, PredictionClass, Sample},
};

/// Persistent sample storage. Scoping is the store's job; callers do not
/// re-filter what it returns.
pub trait SampleStore {
    fn fetch(&self, spec: &QuerySpec) -> Result<Vec<Sample>, WaterwatchError>;

    fn create(&mut self, sample: NewSample) -> Result<Sample, WaterwatchError>;

    /// An `Err` means the record was not removed.
    fn delete(&mut self, id: u64) -> Result<(), WaterwatchError>;
}

/// Verdict of the predictive model for a full parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub prediction: PredictionClass,
    /// Percentage in `[0, 100]`.
    pub confidence: f64,
}

pub trait Predictor {
    fn predict(&self, values: &CompleteValues) -> Result<PredictionOutcome, WaterwatchError>;
}

/// A parameter set with every value present, as the predictor requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompleteValues(ParameterValues);

impl CompleteValues {
    pub fn as_values(&self) -> &ParameterValues {
        &self.0
    }
}

impl TryFrom<ParameterValues> for CompleteValues {
    type Error = WaterwatchError;

    fn try_from(values: ParameterValues) -> Result<Self, Self::Error> {
        match values.iter().find(|(_, v)| v.is_none()) {
            Some((parameter, _)) => Err(WaterwatchError::MissingParameter(parameter.id().to_string())),
            None => Ok(Self(values)),
        }
    }
}

/// Runs the predictor and turns its verdict into a prediction sample.
///
/// A verdict without a 0/1 class or with a confidence outside `[0, 100]`
/// is reported as [`WaterwatchError::Predictor`].
pub fn predict_sample(
    predictor: &dyn Predictor,
    values: ParameterValues,
    owner_user_id: Option<u64>,
) -> Result<NewSample, WaterwatchError> {
    let complete = CompleteValues::try_from(values)?;
    let outcome = predictor.predict(&complete)?;
    if !outcome.prediction.is_prediction() {
        return Err(WaterwatchError::Predictor("verdict has no 0/1 class".to_string()));
    }
    if !(0.0..=100.0).contains(&outcome.confidence) {
        return Err(WaterwatchError::Predictor(format!(
            "confidence {} is outside [0, 100]",
            outcome.confidence
        )));
    }
    crate::builder::prediction_sample(complete, outcome, owner_user_id)
}
