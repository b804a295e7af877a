use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the ten tracked water-quality parameters.
///
/// The variant order is the canonical column order used by forms, detail
/// views and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parameter {
    Ammonium,
    Phosphate,
    #[serde(rename = "COD")]
    Cod,
    #[serde(rename = "BOD")]
    Bod,
    Conductivity,
    #[serde(rename = "PH")]
    Ph,
    Nitrogen,
    Nitrate,
    Turbidity,
    #[serde(rename = "TSS")]
    Tss,
}

impl Parameter {
    pub const ALL: [Parameter; 10] = [
        Parameter::Ammonium,
        Parameter::Phosphate,
        Parameter::Cod,
        Parameter::Bod,
        Parameter::Conductivity,
        Parameter::Ph,
        Parameter::Nitrogen,
        Parameter::Nitrate,
        Parameter::Turbidity,
        Parameter::Tss,
    ];

    /// The wire identifier (`PH`, `Nitrogen`, ...), as used by the sample store.
    pub fn id(self) -> &'static str {
        match self {
            Parameter::Ammonium => "Ammonium",
            Parameter::Phosphate => "Phosphate",
            Parameter::Cod => "COD",
            Parameter::Bod => "BOD",
            Parameter::Conductivity => "Conductivity",
            Parameter::Ph => "PH",
            Parameter::Nitrogen => "Nitrogen",
            Parameter::Nitrate => "Nitrate",
            Parameter::Turbidity => "Turbidity",
            Parameter::Tss => "TSS",
        }
    }

    /// Name shown in charts and detail views.
    pub fn display_name(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Nitrogen => "Total Nitrogen",
            other => other.id(),
        }
    }

    /// Column name stem used by tabular exports, before the unit suffix.
    pub fn export_name(self) -> &'static str {
        match self {
            Parameter::Ph => "pH",
            Parameter::Nitrogen => "Nitrogen Total",
            other => other.id(),
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParameter(pub String);

impl fmt::Display for UnknownParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown parameter '{}'", self.0)
    }
}

impl std::error::Error for UnknownParameter {}

impl FromStr for Parameter {
    type Err = UnknownParameter;

    /// Accepts wire ids and display names, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Parameter::ALL
            .into_iter()
            .find(|p| {
                p.id().eq_ignore_ascii_case(wanted)
                    || p.display_name().eq_ignore_ascii_case(wanted)
                    || p.export_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

/// A regulatory bound pair. Either, both or neither side may be present.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Limit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Limit {
    pub const fn at_most(max: f64) -> Self {
        Self { min: None, max: Some(max) }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self { min: Some(min), max: Some(max) }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}
