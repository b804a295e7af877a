use crate::parameter::Parameter;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleType {
    Influent,
    Effluent,
    Sludge,
    Prediction,
}

impl SampleType {
    pub const ALL: [SampleType; 4] = [
        SampleType::Influent,
        SampleType::Effluent,
        SampleType::Sludge,
        SampleType::Prediction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SampleType::Influent => "influent",
            SampleType::Effluent => "effluent",
            SampleType::Sludge => "sludge",
            SampleType::Prediction => "prediction",
        }
    }

    /// Influent, effluent and sludge samples are entered by hand; prediction
    /// samples come from the predictor pathway.
    pub fn is_manual(self) -> bool {
        !matches!(self, SampleType::Prediction)
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sample type '{}'", s))
    }
}

/// Model verdict attached to a sample. `-1` marks a manually entered sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PredictionClass {
    NotApplicable,
    Compliant,
    AtRisk,
}

impl PredictionClass {
    pub fn is_prediction(self) -> bool {
        !matches!(self, PredictionClass::NotApplicable)
    }
}

impl TryFrom<i64> for PredictionClass {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(PredictionClass::NotApplicable),
            0 => Ok(PredictionClass::Compliant),
            1 => Ok(PredictionClass::AtRisk),
            other => Err(format!("prediction must be -1, 0 or 1, got {}", other)),
        }
    }
}

impl From<PredictionClass> for i64 {
    fn from(class: PredictionClass) -> Self {
        match class {
            PredictionClass::NotApplicable => -1,
            PredictionClass::Compliant => 0,
            PredictionClass::AtRisk => 1,
        }
    }
}

/// The ten measured values of a sample. Any subset may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterValues {
    #[serde(rename = "Ammonium", default, deserialize_with = "lenient_number")]
    pub ammonium: Option<f64>,
    #[serde(rename = "Phosphate", default, deserialize_with = "lenient_number")]
    pub phosphate: Option<f64>,
    #[serde(rename = "COD", default, deserialize_with = "lenient_number")]
    pub cod: Option<f64>,
    #[serde(rename = "BOD", default, deserialize_with = "lenient_number")]
    pub bod: Option<f64>,
    #[serde(rename = "Conductivity", default, deserialize_with = "lenient_number")]
    pub conductivity: Option<f64>,
    #[serde(rename = "PH", default, deserialize_with = "lenient_number")]
    pub ph: Option<f64>,
    #[serde(rename = "Nitrogen", default, deserialize_with = "lenient_number")]
    pub nitrogen: Option<f64>,
    #[serde(rename = "Nitrate", default, deserialize_with = "lenient_number")]
    pub nitrate: Option<f64>,
    #[serde(rename = "Turbidity", default, deserialize_with = "lenient_number")]
    pub turbidity: Option<f64>,
    #[serde(rename = "TSS", default, deserialize_with = "lenient_number")]
    pub tss: Option<f64>,
}

impl ParameterValues {
    pub fn get(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Ammonium => self.ammonium,
            Parameter::Phosphate => self.phosphate,
            Parameter::Cod => self.cod,
            Parameter::Bod => self.bod,
            Parameter::Conductivity => self.conductivity,
            Parameter::Ph => self.ph,
            Parameter::Nitrogen => self.nitrogen,
            Parameter::Nitrate => self.nitrate,
            Parameter::Turbidity => self.turbidity,
            Parameter::Tss => self.tss,
        }
    }

    pub fn set(&mut self, parameter: Parameter, value: Option<f64>) {
        let slot = match parameter {
            Parameter::Ammonium => &mut self.ammonium,
            Parameter::Phosphate => &mut self.phosphate,
            Parameter::Cod => &mut self.cod,
            Parameter::Bod => &mut self.bod,
            Parameter::Conductivity => &mut self.conductivity,
            Parameter::Ph => &mut self.ph,
            Parameter::Nitrogen => &mut self.nitrogen,
            Parameter::Nitrate => &mut self.nitrate,
            Parameter::Turbidity => &mut self.turbidity,
            Parameter::Tss => &mut self.tss,
        };
        *slot = value;
    }

    /// Values in canonical parameter order.
    pub fn iter(&self) -> impl Iterator<Item = (Parameter, Option<f64>)> + '_ {
        Parameter::ALL.into_iter().map(move |p| (p, self.get(p)))
    }
}

/// A stored measurement or prediction event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub id: u64,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub sample_type: SampleType,
    #[serde(default, alias = "user_id", skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<u64>,
    #[serde(flatten)]
    pub values: ParameterValues,
    #[serde(default)]
    pub prediction: Option<PredictionClass>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl Sample {
    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        self.values.get(parameter)
    }
}

/// A sample as submitted for creation. The store assigns `id`, and the
/// timestamp when none is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSample {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub sample_type: SampleType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_user_id: Option<u64>,
    #[serde(flatten)]
    pub values: ParameterValues,
    pub prediction: Option<PredictionClass>,
    pub confidence: Option<f64>,
}

impl NewSample {
    pub fn into_sample(self, id: u64, now: DateTime<Utc>) -> Sample {
        Sample {
            id,
            timestamp: self.timestamp.unwrap_or(now),
            sample_type: self.sample_type,
            owner_user_id: self.owner_user_id,
            values: self.values,
            prediction: self.prediction,
            confidence: self.confidence,
        }
    }
}

/// Reads numbers, numeric strings (as submitted by forms) and nulls. Anything
/// else, including non-finite values, is read as a missing value.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    let value = raw.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    Ok(value.filter(|v| v.is_finite()))
}

/// Accepts RFC 3339 timestamps and offset-less ones, which are taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&raw, format) {
            return Ok(naive.and_utc());
        }
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
}
