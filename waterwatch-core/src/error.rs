use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaterwatchError {
    #[error("Nothing to export: the selected sample set is empty")]
    NothingToExport,

    #[error("Sample {0} not found")]
    SampleNotFound(u64),

    #[error("Deletion of sample {0} was not confirmed")]
    DeletionNotConfirmed(u64),

    #[error("User {0} is not in the roster of known users")]
    UnknownUser(u64),

    #[error("Parameter '{0}' has no value")]
    MissingParameter(String),

    #[error("Invalid sample: {0}")]
    InvalidSample(String),

    #[error("Sample store request failed: {0}")]
    Store(String),

    #[error("Prediction request failed: {0}")]
    Predictor(String),

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to write CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    JsonParsing(#[from] serde_json::Error),
}
