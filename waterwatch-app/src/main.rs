use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waterwatch_core::{view::SampleView, visibility::Actor};
use waterwatch_schemas::{
    parameter::Parameter,
    query::TypeSelector,
    sample::ParameterValues,
};

mod config;
mod plotting;
mod store;
mod workflow;

use config::{AppConfig, CliSession, FormatArg};

#[derive(Debug, Parser)]
#[command(name = "waterwatch", version, about = "Water-quality sample compliance, trends and exports")]
struct Cli {
    /// Path to a YAML config file (defaults to ./waterwatch.yaml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Sample store file, overriding the config
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Directory for charts and exports, overriding the config
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Act as this authenticated user; results are limited to their samples
    #[arg(long, global = true, value_name = "ID")]
    user_id: Option<u64>,

    /// Browse one roster user's samples without signing in
    #[arg(long, global = true, value_name = "ID", conflicts_with = "user_id")]
    browse_user: Option<u64>,

    /// Sample type to show: all, influent, effluent, sludge or prediction
    #[arg(long = "type", global = true, default_value = "all")]
    selector: TypeSelector,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List samples in scope, newest first
    List,
    /// Show one sample's values against the legal limits
    Inspect {
        #[arg(long)]
        id: u64,
    },
    /// Chart one parameter over time
    Chart {
        #[arg(long, default_value = "Ammonium")]
        parameter: Parameter,
        #[arg(long)]
        no_reference_lines: bool,
    },
    /// Export samples in scope to a file
    Export {
        #[arg(long)]
        file_name: String,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Record a new sample of the type given with --type
    Add {
        #[command(flatten)]
        values: ValueArgs,
        /// Model verdict (0 or 1) returned by the prediction service
        #[arg(long, requires = "confidence")]
        prediction: Option<i64>,
        /// Model confidence in percent
        #[arg(long, requires = "prediction")]
        confidence: Option<f64>,
        /// Measurement time (RFC 3339); defaults to now
        #[arg(long)]
        timestamp: Option<DateTime<Utc>>,
    },
    /// Delete a sample
    Delete {
        #[arg(long)]
        id: u64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Summarize compliance per parameter
    Report,
}

#[derive(Debug, Args)]
struct ValueArgs {
    #[arg(long)]
    ammonium: Option<f64>,
    #[arg(long)]
    phosphate: Option<f64>,
    #[arg(long)]
    cod: Option<f64>,
    #[arg(long)]
    bod: Option<f64>,
    #[arg(long)]
    conductivity: Option<f64>,
    #[arg(long)]
    ph: Option<f64>,
    #[arg(long)]
    nitrogen: Option<f64>,
    #[arg(long)]
    nitrate: Option<f64>,
    #[arg(long)]
    turbidity: Option<f64>,
    #[arg(long)]
    tss: Option<f64>,
}

impl From<ValueArgs> for ParameterValues {
    fn from(args: ValueArgs) -> Self {
        ParameterValues {
            ammonium: args.ammonium,
            phosphate: args.phosphate,
            cod: args.cod,
            bod: args.bod,
            conductivity: args.conductivity,
            ph: args.ph,
            nitrogen: args.nitrogen,
            nitrate: args.nitrate,
            turbidity: args.turbidity,
            tss: args.tss,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }

    let session = CliSession { user_id: cli.user_id };
    let actor = Actor::resolve(&session, &config.users, cli.browse_user)?;
    let store = store::FileSampleStore::open(&config.store_path)
        .with_context(|| format!("Failed to open sample store {:?}", config.store_path))?;

    let mut ws = workflow::Workspace {
        config,
        store,
        actor,
        selector: cli.selector,
        view: SampleView::new(),
    };

    match cli.command {
        Command::List => workflow::list(&mut ws),
        Command::Inspect { id } => workflow::inspect(&mut ws, id),
        Command::Chart { parameter, no_reference_lines } => {
            workflow::chart(&mut ws, parameter, !no_reference_lines)
        }
        Command::Export { file_name, format } => {
            let format = format.unwrap_or(ws.config.export_format);
            workflow::export(&mut ws, &file_name, format.into())
        }
        Command::Add { values, prediction, confidence, timestamp } => {
            let verdict = prediction.zip(confidence);
            workflow::add(&mut ws, values.into(), verdict, timestamp)
        }
        Command::Delete { id, yes } => workflow::delete(&mut ws, id, yes),
        Command::Report => workflow::report(&mut ws),
    }
}
