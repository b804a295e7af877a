use crate::sample::SampleType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The "show" selector: every sample type, or exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeSelector {
    #[default]
    All,
    Only(SampleType),
}

impl TypeSelector {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeSelector::All => "all",
            TypeSelector::Only(sample_type) => sample_type.as_str(),
        }
    }

    /// Whether prediction columns may appear under this selector.
    pub fn includes_predictions(self) -> bool {
        matches!(
            self,
            TypeSelector::All | TypeSelector::Only(SampleType::Prediction)
        )
    }

    pub fn admits(self, sample_type: SampleType) -> bool {
        match self {
            TypeSelector::All => true,
            TypeSelector::Only(wanted) => wanted == sample_type,
        }
    }
}

impl fmt::Display for TypeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(TypeSelector::All)
        } else {
            s.parse().map(TypeSelector::Only)
        }
    }
}

impl Serialize for TypeSelector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TypeSelector {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The scope handed to the sample store as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuerySpec {
    pub sample_type: TypeSelector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
}

impl QuerySpec {
    /// `sample_type=...[&user_id=...]`
    pub fn to_query_string(&self) -> String {
        match self.user_id {
            Some(user_id) => format!("sample_type={}&user_id={}", self.sample_type, user_id),
            None => format!("sample_type={}", self.sample_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selector_parses_all_and_types() {
        assert_eq!("all".parse::<TypeSelector>(), Ok(TypeSelector::All));
        assert_eq!(
            "Sludge".parse::<TypeSelector>(),
            Ok(TypeSelector::Only(SampleType::Sludge))
        );
        assert!("sewage".parse::<TypeSelector>().is_err());
    }

    #[test]
    fn query_string_omits_missing_user() {
        let spec = QuerySpec { sample_type: TypeSelector::All, user_id: None };
        assert_eq!(spec.to_query_string(), "sample_type=all");
        let spec = QuerySpec {
            sample_type: TypeSelector::Only(SampleType::Effluent),
            user_id: Some(4),
        };
        assert_eq!(spec.to_query_string(), "sample_type=effluent&user_id=4");
    }
}
