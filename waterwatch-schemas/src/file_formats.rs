use crate::sample::Sample;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SampleFile {
    pub schema_version: String,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

