use crate::{error::WaterwatchError, store::{CompleteValues, PredictionOutcome}};
use chrono::{DateTime, Utc};
use waterwatch_schemas::{
    parameter::Parameter,
    sample::{NewSample, ParameterValues, PredictionClass, Sample, SampleType},
};

/// Confidence recorded for manually entered samples.
pub const MANUAL_CONFIDENCE: f64 = -1.0;

/// A fluent builder for manually entered samples.
///
/// Manual samples carry prediction `-1` and confidence `-1`, matching what the
/// entry form submits.
pub struct NewSampleBuilder {
    sample_type: SampleType,
    values: ParameterValues,
    owner_user_id: Option<u64>,
    timestamp: Option<DateTime<Utc>>,
}

impl NewSampleBuilder {
    pub fn new(sample_type: SampleType) -> Self {
        Self {
            sample_type,
            values: ParameterValues::default(),
            owner_user_id: None,
            timestamp: None,
        }
    }

    pub fn with_value(mut self, parameter: Parameter, value: f64) -> Self {
        self.values.set(parameter, Some(value));
        self
    }

    pub fn with_values(mut self, values: ParameterValues) -> Self {
        self.values = values;
        self
    }

    pub fn owned_by(mut self, user_id: Option<u64>) -> Self {
        self.owner_user_id = user_id;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// # Errors
    ///
    /// Prediction samples cannot be entered by hand; use the predictor pathway.
    pub fn build(self) -> Result<NewSample, WaterwatchError> {
        if !self.sample_type.is_manual() {
            return Err(WaterwatchError::InvalidSample(
                "prediction samples must come from the predictor".to_string(),
            ));
        }
        Ok(NewSample {
            timestamp: self.timestamp,
            sample_type: self.sample_type,
            owner_user_id: self.owner_user_id,
            values: self.values,
            prediction: Some(PredictionClass::NotApplicable),
            confidence: Some(MANUAL_CONFIDENCE),
        })
    }
}

pub(crate) fn prediction_sample(
    values: CompleteValues,
    outcome: PredictionOutcome,
    owner_user_id: Option<u64>,
) -> Result<NewSample, WaterwatchError> {
    check_prediction(SampleType::Prediction, Some(outcome.prediction), Some(outcome.confidence))?;
    Ok(NewSample {
        timestamp: None,
        sample_type: SampleType::Prediction,
        owner_user_id,
        values: *values.as_values(),
        prediction: Some(outcome.prediction),
        confidence: Some(outcome.confidence),
    })
}

/// Checks the prediction invariant: prediction samples carry class 0 or 1
/// and a confidence within `[0, 100]`.
pub fn validate(sample: &Sample) -> Result<(), WaterwatchError> {
    check_prediction(sample.sample_type, sample.prediction, sample.confidence)
}

fn check_prediction(
    sample_type: SampleType,
    prediction: Option<PredictionClass>,
    confidence: Option<f64>,
) -> Result<(), WaterwatchError> {
    if sample_type != SampleType::Prediction {
        return Ok(());
    }
    match (prediction, confidence) {
        (Some(class), Some(c)) if class.is_prediction() && (0.0..=100.0).contains(&c) => Ok(()),
        (Some(class), _) if !class.is_prediction() => Err(WaterwatchError::InvalidSample(
            "prediction sample without a model verdict".to_string(),
        )),
        (None, _) => Err(WaterwatchError::InvalidSample(
            "prediction sample without a model verdict".to_string(),
        )),
        (_, Some(c)) => Err(WaterwatchError::InvalidSample(format!(
            "confidence {} is outside [0, 100]",
            c
        ))),
        (_, None) => Err(WaterwatchError::InvalidSample(
            "prediction sample without a confidence".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_samples_are_marked_not_applicable() {
        let sample = NewSampleBuilder::new(SampleType::Effluent)
            .with_value(Parameter::Bod, 12.0)
            .owned_by(Some(2))
            .build()
            .unwrap();
        assert_eq!(sample.prediction, Some(PredictionClass::NotApplicable));
        assert_eq!(sample.confidence, Some(MANUAL_CONFIDENCE));
        assert_eq!(sample.values.bod, Some(12.0));
        assert_eq!(sample.values.cod, None);
    }

    #[test]
    fn prediction_type_cannot_be_built_by_hand() {
        assert!(NewSampleBuilder::new(SampleType::Prediction).build().is_err());
    }

    #[test]
    fn validate_checks_prediction_samples_only() {
        let manual = NewSampleBuilder::new(SampleType::Sludge).build().unwrap().into_sample(1, Utc::now());
        assert!(validate(&manual).is_ok());

        let mut predicted = manual.clone();
        predicted.sample_type = SampleType::Prediction;
        assert!(validate(&predicted).is_err());

        predicted.prediction = Some(PredictionClass::Compliant);
        predicted.confidence = Some(140.0);
        assert!(validate(&predicted).is_err());

        predicted.confidence = Some(64.0);
        assert!(validate(&predicted).is_ok());
    }
}
