use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::{fs, path::{Path, PathBuf}};
use tracing::{debug, info};
use waterwatch_core::{sink::ExportFormat, visibility::AuthProvider};
use waterwatch_schemas::user::User;

pub const DEFAULT_CONFIG_PATH: &str = "waterwatch.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Json => ExportFormat::Json,
        }
    }
}

/// Settings read from `waterwatch.yaml`. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub output_dir: PathBuf,
    pub reference_lines: bool,
    pub export_format: FormatArg,
    pub utc_offset_hours: i32,
    /// Known users an anonymous caller may browse.
    pub users: Vec<User>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./data/samples.yaml"),
            output_dir: PathBuf::from("./data/output"),
            reference_lines: true,
            export_format: FormatArg::Csv,
            utc_offset_hours: 0,
            users: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Loads the config from `path`, or from `waterwatch.yaml` if present.
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if required {
                bail!("Config file {:?} does not exist", path);
            }
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {:?}", path))?;
        info!(path = %path.display(), users = config.users.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn utc_offset(&self) -> Result<chrono::FixedOffset> {
        self.utc_offset_hours
            .checked_mul(3600)
            .and_then(chrono::FixedOffset::east_opt)
            .with_context(|| format!("Invalid utc_offset_hours: {}", self.utc_offset_hours))
    }
}

/// Identity passed on the command line in place of a session token.
pub struct CliSession {
    pub user_id: Option<u64>,
}

impl AuthProvider for CliSession {
    fn current_user_id(&self) -> Option<u64> {
        self.user_id
    }
}
