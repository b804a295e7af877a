use crate::config::AppConfig;
use crate::plotting;
use crate::store::FileSampleStore;
use anyhow::{bail, Result};
use chrono::{DateTime, FixedOffset, Utc};
use std::io::{self, BufRead, Write};
use tracing::info;
use waterwatch_core::{
    builder::NewSampleBuilder,
    catalog,
    error::WaterwatchError,
    export::{self, ExportOptions},
    projection::{self, ProjectionOptions},
    sink::ExportFormat,
    store::{self, CompleteValues, PredictionOutcome, Predictor, SampleStore},
    summary::{self, SampleCompliance},
    threshold::{self, Compliance},
    view::{Confirmation, SampleView},
    visibility::{self, Actor},
};
use waterwatch_schemas::{
    parameter::Parameter,
    query::{QuerySpec, TypeSelector},
    sample::{NewSample, ParameterValues, PredictionClass, Sample, SampleType},
};

/// Everything a command needs: settings, the store and the resolved scope.
pub struct Workspace {
    pub config: AppConfig,
    pub store: FileSampleStore,
    pub actor: Actor,
    pub selector: TypeSelector,
    pub view: SampleView,
}

impl Workspace {
    fn scope(&self) -> QuerySpec {
        visibility::scope_for(&self.actor, self.selector)
    }

    fn load(&mut self) -> Result<Vec<Sample>> {
        let spec = self.scope();
        info!(query = %spec.to_query_string(), "Loading samples");
        Ok(self.view.refresh(&self.store, spec)?.to_vec())
    }

    fn owner(&self) -> Option<u64> {
        match self.actor {
            Actor::Authenticated { user_id } => Some(user_id),
            Actor::Anonymous { .. } => None,
        }
    }
}

/// Verdict obtained from the prediction service and passed in by the caller.
struct RecordedVerdict(PredictionOutcome);

impl Predictor for RecordedVerdict {
    fn predict(&self, _values: &CompleteValues) -> Result<PredictionOutcome, WaterwatchError> {
        Ok(self.0)
    }
}

pub fn list(ws: &mut Workspace) -> Result<()> {
    let samples = ws.load()?;
    let offset = ws.config.utc_offset()?;
    if samples.is_empty() {
        println!("No samples for {}.", ws.scope().to_query_string());
        return Ok(());
    }
    for sample in &samples {
        println!("{}", card(sample, offset));
    }
    println!("\n{} sample(s).", samples.len());
    Ok(())
}

pub fn inspect(ws: &mut Workspace, id: u64) -> Result<()> {
    let samples = ws.load()?;
    let offset = ws.config.utc_offset()?;
    let Some(sample) = samples.iter().find(|s| s.id == id) else {
        bail!(WaterwatchError::SampleNotFound(id));
    };

    println!("{}", card(sample, offset));
    println!("----------------------------------------");
    let compliance = SampleCompliance::of(sample);
    for entry in &compliance.parameters {
        let value = entry
            .value
            .map_or_else(|| "-".to_string(), |v| format!("{} {}", v, catalog::unit_of(entry.parameter)));
        println!(
            "  {:<16} {:>14}  {}",
            format!("{}:", entry.parameter.display_name()),
            value.trim_end(),
            marker(entry.compliance)
        );
    }
    println!("----------------------------------------");
    println!("Worst tier: {}", compliance.worst());
    Ok(())
}

pub fn chart(ws: &mut Workspace, parameter: Parameter, reference_lines: bool) -> Result<()> {
    let samples = ws.load()?;
    let options = ProjectionOptions { reference_lines: reference_lines && ws.config.reference_lines };
    let series = projection::project_with(&samples, parameter, options);

    if series.is_empty() {
        println!("[Chart] Warning: no {} values to plot.", parameter.display_name());
        return Ok(());
    }

    let offset = ws.config.utc_offset()?;
    println!("{} over Time", catalog::label_with_unit(parameter));
    for point in &series.points {
        println!(
            "  {:<20} {:>10}  {}",
            export::format_timestamp(&point.timestamp, offset),
            point.value,
            marker(threshold::classify(parameter, Some(point.value)))
        );
    }
    for line in &series.reference_lines {
        println!("  {}: {}", line.label, line.value);
    }

    let path = plotting::plot_time_series(&ws.config.output_dir, &series, offset)?;
    println!("\nChart saved to '{}'.", path.display());
    Ok(())
}

pub fn export(ws: &mut Workspace, file_name: &str, format: ExportFormat) -> Result<()> {
    if file_name.trim().is_empty() {
        bail!("Input file name");
    }
    let samples = ws.load()?;
    let options = ExportOptions { utc_offset: ws.config.utc_offset()? };
    let records = export::serialize_with(&samples, ws.selector, &options)?;

    let mut sink = format.sink(&ws.config.output_dir);
    let path = sink.write(&records, file_name)?;
    println!("Exported {} sample(s) to '{}'.", records.len(), path.display());
    Ok(())
}

pub fn add(
    ws: &mut Workspace,
    values: ParameterValues,
    verdict: Option<(i64, f64)>,
    timestamp: Option<DateTime<Utc>>,
) -> Result<()> {
    let sample_type = entry_type(ws.selector)?;
    let new_sample = new_entry(sample_type, values, verdict, timestamp, ws.owner())?;
    let created = ws.store.create(new_sample)?;
    println!("Saved sample #{} ({}).", created.id, created.sample_type);
    Ok(())
}

/// The type a new sample is recorded as; `all` names no single type.
fn entry_type(selector: TypeSelector) -> Result<SampleType> {
    match selector {
        TypeSelector::Only(sample_type) => Ok(sample_type),
        TypeSelector::All => bail!("Choose the sample type to record with --type"),
    }
}

fn new_entry(
    sample_type: SampleType,
    values: ParameterValues,
    verdict: Option<(i64, f64)>,
    timestamp: Option<DateTime<Utc>>,
    owner: Option<u64>,
) -> Result<NewSample> {
    match verdict {
        Some((prediction, confidence)) => {
            if sample_type != SampleType::Prediction {
                bail!("A model verdict can only be recorded on a prediction sample, not {}", sample_type);
            }
            let prediction = PredictionClass::try_from(prediction).map_err(anyhow::Error::msg)?;
            let predictor = RecordedVerdict(PredictionOutcome { prediction, confidence });
            let mut new_sample = store::predict_sample(&predictor, values, owner)?;
            new_sample.timestamp = timestamp;
            Ok(new_sample)
        }
        None => {
            let mut builder = NewSampleBuilder::new(sample_type).with_values(values).owned_by(owner);
            if let Some(ts) = timestamp {
                builder = builder.at(ts);
            }
            Ok(builder.build()?)
        }
    }
}

pub fn delete(ws: &mut Workspace, id: u64, assume_yes: bool) -> Result<()> {
    ws.load()?;
    let confirmation = if assume_yes { Confirmation::Confirmed } else { ask_confirmation()? };
    let removed = ws.view.delete(&mut ws.store, id, confirmation)?;
    println!("Sample #{} has been deleted.", removed.id);
    Ok(())
}

pub fn report(ws: &mut Workspace) -> Result<()> {
    let samples = ws.load()?;
    let summary = summary::summarize(&samples);

    println!("\n--- [Compliance Report] ---");
    println!("========================================");
    println!("Scope: {}", ws.scope().to_query_string());
    println!("Samples: {} ({} exceeding a limit)", summary.samples, summary.samples_exceeding);
    println!("----------------------------------------");
    println!("  {:<24} {:>7} {:>6} {:>7} {:>6}", "Parameter", "exceed", "near", "normal", "none");
    for (parameter, counts) in &summary.by_parameter {
        println!(
            "  {:<24} {:>7} {:>6} {:>7} {:>6}",
            catalog::label_with_unit(*parameter),
            counts.exceed,
            counts.near,
            counts.normal,
            counts.none
        );
    }
    println!("========================================");
    Ok(())
}

fn ask_confirmation() -> Result<Confirmation> {
    print!("Are you sure you want to delete this sample? [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Confirmation::Confirmed,
        _ => Confirmation::Declined,
    })
}

/// One-line summary of a sample, as on the history cards.
fn card(sample: &Sample, offset: FixedOffset) -> String {
    let when = export::format_timestamp(&sample.timestamp, offset);
    let badge = match sample.sample_type {
        SampleType::Influent => "[IN]",
        SampleType::Effluent => "[EFF]",
        SampleType::Sludge => "[SLG]",
        SampleType::Prediction => "[PRED]",
    };
    let verdict = match (sample.prediction, sample.confidence) {
        (Some(class), Some(confidence)) if class.is_prediction() => {
            format!(" | {} | Confidence: {}%", verdict_text(class), confidence)
        }
        // manual entries carry no model verdict
        _ => String::new(),
    };
    format!("#{:<5} {:<20} {:<6} {}{}", sample.id, when, badge, sample.sample_type, verdict)
}

fn verdict_text(class: PredictionClass) -> &'static str {
    match class {
        PredictionClass::Compliant => "Far from exceeding",
        PredictionClass::AtRisk => "Risk of exceeding",
        PredictionClass::NotApplicable => "",
    }
}

fn marker(compliance: Compliance) -> &'static str {
    match compliance {
        Compliance::Exceed => "!! exceeds limit",
        Compliance::Near => "!  near limit",
        Compliance::Normal | Compliance::Unclassified => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(sample_type: SampleType, prediction: Option<PredictionClass>, confidence: Option<f64>) -> Sample {
        Sample {
            id: 4,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 2, 14, 5, 0).unwrap(),
            sample_type,
            owner_user_id: None,
            values: ParameterValues::default(),
            prediction,
            confidence,
        }
    }

    #[test]
    fn cards_show_verdicts_only_for_predictions() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let predicted = card(&sample(SampleType::Prediction, Some(PredictionClass::AtRisk), Some(88.0)), utc);
        assert!(predicted.contains("Risk of exceeding | Confidence: 88%"));
        assert!(predicted.contains("Mar 2, 2024, 14:05"));

        let manual = card(&sample(SampleType::Sludge, Some(PredictionClass::NotApplicable), Some(-1.0)), utc);
        assert!(!manual.contains("Confidence"));
        assert!(manual.contains("[SLG]"));
    }

    fn all_values() -> ParameterValues {
        let mut values = ParameterValues::default();
        for p in Parameter::ALL {
            values.set(p, Some(1.0));
        }
        values
    }

    #[test]
    fn recording_needs_a_single_type() {
        assert!(entry_type(TypeSelector::All).is_err());
        assert_eq!(entry_type(TypeSelector::Only(SampleType::Sludge)).unwrap(), SampleType::Sludge);
    }

    #[test]
    fn verdict_is_refused_on_manual_types() {
        let err = new_entry(SampleType::Effluent, all_values(), Some((1, 80.0)), None, None).unwrap_err();
        assert!(err.to_string().contains("effluent"));
    }

    #[test]
    fn prediction_type_needs_a_verdict() {
        assert!(new_entry(SampleType::Prediction, all_values(), None, None, None).is_err());

        let entry = new_entry(SampleType::Prediction, all_values(), Some((0, 72.5)), None, Some(3)).unwrap();
        assert_eq!(entry.sample_type, SampleType::Prediction);
        assert_eq!(entry.prediction, Some(PredictionClass::Compliant));
        assert_eq!(entry.owner_user_id, Some(3));
    }

    #[test]
    fn manual_entry_keeps_the_chosen_type() {
        let entry = new_entry(SampleType::Sludge, all_values(), None, None, None).unwrap();
        assert_eq!(entry.sample_type, SampleType::Sludge);
        assert_eq!(entry.prediction, Some(PredictionClass::NotApplicable));
    }
}
