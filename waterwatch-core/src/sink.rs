use crate::{
    error::WaterwatchError,
    export::{self, ExportRecord},
};
use csv::Writer;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for serialized records. Returns where the file landed.
pub trait ExportSink {
    fn write(&mut self, records: &[ExportRecord], file_name: &str) -> Result<PathBuf, WaterwatchError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// A sink of this format writing into `output_dir`.
    pub fn sink(self, output_dir: impl Into<PathBuf>) -> Box<dyn ExportSink> {
        match self {
            ExportFormat::Csv => Box::new(CsvExportSink::new(output_dir)),
            ExportFormat::Json => Box::new(JsonExportSink::new(output_dir)),
        }
    }
}

/// Writes `<dir>/<file_name>.csv`. Null and absent cells are left empty.
pub struct CsvExportSink {
    output_dir: PathBuf,
}

impl CsvExportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }
}

impl ExportSink for CsvExportSink {
    fn write(&mut self, records: &[ExportRecord], file_name: &str) -> Result<PathBuf, WaterwatchError> {
        let path = target_path(&self.output_dir, file_name, ExportFormat::Csv)?;
        let shown = path.display().to_string();
        let mut writer = Writer::from_path(&path).map_err(|e| WaterwatchError::CsvError(shown.clone(), e))?;

        let header = export::header(records);
        writer
            .write_record(&header)
            .map_err(|e| WaterwatchError::CsvError(shown.clone(), e))?;
        for record in records {
            let row = header.iter().map(|column| record.get(column).map_or_else(String::new, cell));
            writer
                .write_record(row)
                .map_err(|e| WaterwatchError::CsvError(shown.clone(), e))?;
        }
        writer.flush().map_err(|e| WaterwatchError::FileIO(shown.clone(), e))?;

        info!(path = %shown, rows = records.len(), "Wrote CSV export");
        Ok(path)
    }
}

/// Writes `<dir>/<file_name>.json` as an array of objects in column order.
pub struct JsonExportSink {
    output_dir: PathBuf,
}

impl JsonExportSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }
}

impl ExportSink for JsonExportSink {
    fn write(&mut self, records: &[ExportRecord], file_name: &str) -> Result<PathBuf, WaterwatchError> {
        let path = target_path(&self.output_dir, file_name, ExportFormat::Json)?;
        let shown = path.display().to_string();
        let json = serde_json::to_string_pretty(records)?;
        fs::write(&path, json).map_err(|e| WaterwatchError::FileIO(shown.clone(), e))?;

        info!(path = %shown, rows = records.len(), "Wrote JSON export");
        Ok(path)
    }
}

fn target_path(dir: &Path, file_name: &str, format: ExportFormat) -> Result<PathBuf, WaterwatchError> {
    fs::create_dir_all(dir).map_err(|e| WaterwatchError::FileIO(dir.display().to_string(), e))?;
    Ok(dir.join(format!("{}.{}", file_name.trim(), format.extension())))
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
