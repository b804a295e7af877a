//! Flattening of samples into display-ready tabular records.

use crate::{catalog, error::WaterwatchError};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::debug;
use waterwatch_schemas::{
    parameter::Parameter,
    query::TypeSelector,
    sample::{PredictionClass, Sample},
};

/// Display format of record timestamps, e.g. `Mar 2, 2024, 14:05`.
pub const TIMESTAMP_FORMAT: &str = "%b %-d, %Y, %H:%M";

/// One output row. Column order is insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportRecord {
    columns: Vec<(String, Value)>,
}

impl ExportRecord {
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.iter().find(|(c, _)| c == column).map(|(_, v)| v)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for ExportRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in &self.columns {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Offset the display timestamps are rendered in.
    pub utc_offset: FixedOffset,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self { utc_offset: Utc.fix() }
    }
}

pub fn format_timestamp(timestamp: &DateTime<Utc>, offset: FixedOffset) -> String {
    timestamp.with_timezone(&offset).format(TIMESTAMP_FORMAT).to_string()
}

/// Serializes `samples` with timestamps rendered in UTC.
pub fn serialize(samples: &[Sample], selector: TypeSelector) -> Result<Vec<ExportRecord>, WaterwatchError> {
    serialize_with(samples, selector, &ExportOptions::default())
}

/// Builds one record per sample. An empty collection is refused with
/// [`WaterwatchError::NothingToExport`].
pub fn serialize_with(
    samples: &[Sample],
    selector: TypeSelector,
    options: &ExportOptions,
) -> Result<Vec<ExportRecord>, WaterwatchError> {
    if samples.is_empty() {
        return Err(WaterwatchError::NothingToExport);
    }

    let records: Vec<ExportRecord> = samples
        .iter()
        .map(|sample| to_record(sample, selector, options))
        .collect();

    debug!(selector = %selector, records = records.len(), "Serialized samples for export");
    Ok(records)
}

fn to_record(sample: &Sample, selector: TypeSelector, options: &ExportOptions) -> ExportRecord {
    let mut record = ExportRecord::default();
    record.push("ID", sample.id);
    record.push("Timestamp", format_timestamp(&sample.timestamp, options.utc_offset));
    record.push("Sample Type", sample.sample_type.as_str());

    for (parameter, value) in sample.values.iter() {
        record.push(column_name(parameter), value);
    }

    if selector.includes_predictions() {
        if let (Some(class), Some(confidence)) = (sample.prediction, sample.confidence) {
            if class.is_prediction() {
                record.push("Prediction", prediction_label(class));
                record.push("Confidence", format!("{}%", confidence));
            }
        }
    }
    record
}

/// Export column for a parameter, unit suffixed, e.g. `Ammonium (mg/L)`.
pub fn column_name(parameter: Parameter) -> String {
    catalog::with_unit(parameter.export_name(), parameter)
}

pub fn prediction_label(class: PredictionClass) -> &'static str {
    match class {
        PredictionClass::AtRisk => "warning",
        PredictionClass::Compliant => "normal",
        PredictionClass::NotApplicable => "",
    }
}

/// Union of record columns in first-seen order.
pub fn header(records: &[ExportRecord]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.column_names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use waterwatch_schemas::sample::{ParameterValues, SampleType};

    fn sample(sample_type: SampleType, prediction: Option<PredictionClass>, confidence: Option<f64>) -> Sample {
        let mut values = ParameterValues::default();
        values.set(Parameter::Ammonium, Some(1.2));
        values.set(Parameter::Ph, Some(7.0));
        Sample {
            id: 11,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 2, 14, 5, 0).unwrap(),
            sample_type,
            owner_user_id: Some(1),
            values,
            prediction,
            confidence,
        }
    }

    #[test]
    fn empty_collection_is_refused() {
        assert!(matches!(serialize(&[], TypeSelector::All), Err(WaterwatchError::NothingToExport)));
    }

    #[test]
    fn columns_are_renamed_and_unit_annotated() {
        let records = serialize(&[sample(SampleType::Influent, None, None)], TypeSelector::All).unwrap();
        let names: Vec<_> = records[0].column_names().collect();
        assert_eq!(
            names,
            vec![
                "ID",
                "Timestamp",
                "Sample Type",
                "Ammonium (mg/L)",
                "Phosphate (mg/L)",
                "COD (mg/L)",
                "BOD (mg/L)",
                "Conductivity (mS/m)",
                "pH",
                "Nitrogen Total (mg/L)",
                "Nitrate (mg/L)",
                "Turbidity (NTU)",
                "TSS (mg/L)",
            ]
        );
        assert_eq!(records[0].get("Timestamp"), Some(&Value::from("Mar 2, 2024, 14:05")));
        assert_eq!(records[0].get("Sample Type"), Some(&Value::from("influent")));
        assert_eq!(records[0].get("COD (mg/L)"), Some(&Value::Null));
        assert_eq!(records[0].get("pH"), Some(&Value::from(7.0)));
    }

    #[test]
    fn prediction_columns_follow_selector_and_class() {
        let predicted = sample(SampleType::Prediction, Some(PredictionClass::AtRisk), Some(87.5));
        let manual = sample(SampleType::Effluent, Some(PredictionClass::NotApplicable), Some(-1.0));

        let records = serialize(&[predicted.clone(), manual.clone()], TypeSelector::All).unwrap();
        assert_eq!(records[0].get("Prediction"), Some(&Value::from("warning")));
        assert_eq!(records[0].get("Confidence"), Some(&Value::from("87.5%")));
        assert!(records[1].get("Prediction").is_none());
        assert!(records[1].get("Confidence").is_none());

        let records = serialize(&[predicted], TypeSelector::Only(SampleType::Effluent)).unwrap();
        assert!(records[0].get("Prediction").is_none());

        let compliant = sample(SampleType::Prediction, Some(PredictionClass::Compliant), Some(90.0));
        let records = serialize(&[compliant], TypeSelector::Only(SampleType::Prediction)).unwrap();
        assert_eq!(records[0].get("Prediction"), Some(&Value::from("normal")));
        assert_eq!(records[0].get("Confidence"), Some(&Value::from("90%")));
    }

    #[test]
    fn timestamps_honor_display_offset() {
        let options = ExportOptions { utc_offset: FixedOffset::east_opt(2 * 3600).unwrap() };
        let records = serialize_with(&[sample(SampleType::Sludge, None, None)], TypeSelector::All, &options).unwrap();
        assert_eq!(records[0].get("Timestamp"), Some(&Value::from("Mar 2, 2024, 16:05")));
    }

    #[test]
    fn header_is_first_seen_union() {
        let predicted = sample(SampleType::Prediction, Some(PredictionClass::Compliant), Some(60.0));
        let manual = sample(SampleType::Influent, Some(PredictionClass::NotApplicable), None);
        let records = serialize(&[manual, predicted], TypeSelector::All).unwrap();
        let header = header(&records);
        assert_eq!(header.len(), 15);
        assert_eq!(&header[13..], &["Prediction".to_string(), "Confidence".to_string()]);
    }
}
