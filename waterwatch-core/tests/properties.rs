//! Property checks over the classifier, projector and serializer.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use waterwatch_core::{
    catalog,
    export,
    projection::project,
    threshold::{classify, Compliance},
};
use waterwatch_schemas::{
    parameter::Parameter,
    query::TypeSelector,
    sample::{ParameterValues, PredictionClass, Sample, SampleType},
};

const MAX_ONLY: [Parameter; 9] = [
    Parameter::Ammonium,
    Parameter::Phosphate,
    Parameter::Cod,
    Parameter::Bod,
    Parameter::Conductivity,
    Parameter::Nitrogen,
    Parameter::Nitrate,
    Parameter::Turbidity,
    Parameter::Tss,
];

fn sample(id: u64, minutes: i64, bod: Option<f64>, prediction: PredictionClass) -> Sample {
    let mut values = ParameterValues::default();
    values.set(Parameter::Bod, bod);
    Sample {
        id,
        timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
        sample_type: if prediction.is_prediction() { SampleType::Prediction } else { SampleType::Influent },
        owner_user_id: None,
        values,
        prediction: Some(prediction),
        confidence: Some(if prediction.is_prediction() { 75.0 } else { -1.0 }),
    }
}

fn prediction_class() -> impl Strategy<Value = PredictionClass> {
    prop_oneof![
        Just(PredictionClass::NotApplicable),
        Just(PredictionClass::Compliant),
        Just(PredictionClass::AtRisk),
    ]
}

fn sample_sets() -> impl Strategy<Value = Vec<Sample>> {
    prop::collection::vec(
        (0i64..10_000, prop::option::of(0.0f64..100.0), prediction_class()),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (minutes, bod, class))| sample(i as u64, minutes, bod, class))
            .collect()
    })
}

proptest! {
    #[test]
    fn max_only_band_is_eighty_percent_up_to_max(idx in 0usize..9, fraction in 0.0f64..1.5) {
        let parameter = MAX_ONLY[idx];
        let max = catalog::limit_of(parameter).and_then(|l| l.max).unwrap();
        let value = max * fraction;
        let expected = if value > max {
            Compliance::Exceed
        } else if fraction >= 0.8 + 1e-6 {
            Compliance::Near
        } else if fraction < 0.8 - 1e-6 {
            Compliance::Normal
        } else {
            return Ok(());
        };
        prop_assert_eq!(classify(parameter, Some(value)), expected);
    }

    #[test]
    fn anything_above_max_exceeds(idx in 0usize..9, epsilon in 1e-6f64..1e3) {
        let parameter = MAX_ONLY[idx];
        let max = catalog::limit_of(parameter).and_then(|l| l.max).unwrap();
        prop_assert_eq!(classify(parameter, Some(max)), Compliance::Near);
        prop_assert_eq!(classify(parameter, Some(max + epsilon)), Compliance::Exceed);
    }

    #[test]
    fn below_ph_minimum_exceeds(epsilon in 1e-6f64..5.0) {
        prop_assert_eq!(classify(Parameter::Ph, Some(5.0)), Compliance::Near);
        prop_assert_eq!(classify(Parameter::Ph, Some(5.0 - epsilon)), Compliance::Exceed);
    }

    #[test]
    fn projection_only_keeps_numeric_values(samples in sample_sets()) {
        let series = project(&samples, Parameter::Bod);
        let numeric = samples.iter().filter(|s| s.values.bod.is_some()).count();
        prop_assert_eq!(series.points.len(), numeric);
        for line in &series.reference_lines {
            prop_assert_eq!(line.data.len(), numeric);
        }
    }

    #[test]
    fn projection_is_sorted_for_any_permutation(mut samples in sample_sets(), seed in any::<u64>()) {
        let expected: Vec<_> = project(&samples, Parameter::Bod).points.iter().map(|p| p.timestamp).collect();
        // deterministic shuffle
        let len = samples.len();
        if len > 1 {
            let mut state = seed;
            for i in (1..len).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                samples.swap(i, (state >> 33) as usize % (i + 1));
            }
        }
        let series = project(&samples, Parameter::Bod);
        prop_assert!(series.points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        let shuffled: Vec<_> = series.points.iter().map(|p| p.timestamp).collect();
        prop_assert_eq!(shuffled, expected);
    }

    #[test]
    fn manual_samples_never_get_prediction_columns(samples in sample_sets()) {
        prop_assume!(!samples.is_empty());
        let records = export::serialize(&samples, TypeSelector::All).unwrap();
        prop_assert_eq!(records.len(), samples.len());
        for (sample, record) in samples.iter().zip(&records) {
            let has_columns = record.get("Prediction").is_some() || record.get("Confidence").is_some();
            prop_assert_eq!(has_columns, sample.prediction != Some(PredictionClass::NotApplicable));
        }
    }
}

#[test]
fn null_is_unclassified_everywhere() {
    for parameter in Parameter::ALL {
        assert_eq!(classify(parameter, None), Compliance::Unclassified);
    }
}

#[test]
fn empty_export_is_refused() {
    assert!(export::serialize(&[], TypeSelector::Only(SampleType::Sludge)).is_err());
}
