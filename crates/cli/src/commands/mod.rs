pub mod analyze;
pub mod config;
pub mod export;
pub mod metrics;
pub mod predict;
pub mod recommend;
pub mod velocity;

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;
use stockpulse_core::analysis::{AnalysisInput, AnalysisReport, DatasetFilter, InventoryAnalyzer};
use stockpulse_core::config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
use stockpulse_core::domain::record::{NormalizedRecord, Season};
use stockpulse_core::errors::ApplicationError;
use stockpulse_core::ingest::{load_dataset_file, Dataset};
use tracing::{info, warn};

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INPUT: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome<'a> {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            run_id: None,
            data: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    /// Success envelope carrying a JSON `data` payload.
    pub fn with_data(command: &str, message: impl Into<String>, data: &impl Serialize) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => {
                let payload = CommandOutcome {
                    command: command.to_string(),
                    status: "ok".to_string(),
                    error_class: None,
                    message: message.into(),
                    run_id: None,
                    data: Some(data),
                };
                Self { exit_code: 0, output: serialize_payload(payload) }
            }
            Err(error) => Self::failure(command, "serialization", error.to_string(), EXIT_FAILURE),
        }
    }

    /// Plain-text success output.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        Self::failure_for_run(command, error_class, message, exit_code, None)
    }

    fn failure_for_run(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
        run_id: Option<&str>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            run_id,
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Maps an error chain onto the failure envelope. Typed errors decide the
    /// exit code; any context added along the way stays in the message.
    pub fn from_error(command: &str, run_id: &str, error: &anyhow::Error) -> Self {
        let message = format!("{error:#}");

        if error.downcast_ref::<ConfigError>().is_some() {
            return Self::failure_for_run(
                command,
                "config_validation",
                message,
                EXIT_CONFIG,
                Some(run_id),
            );
        }

        match error.downcast_ref::<ApplicationError>() {
            Some(application) => {
                let exit_code = match application {
                    ApplicationError::Domain(_) | ApplicationError::Ingest(_) => EXIT_INPUT,
                    ApplicationError::Export(_) => EXIT_FAILURE,
                };
                let interface = application.clone().into_interface(run_id);
                Self::failure_for_run(
                    command,
                    interface.error_class(),
                    message,
                    exit_code,
                    Some(run_id),
                )
            }
            None => Self::failure_for_run(command, "internal", message, EXIT_FAILURE, Some(run_id)),
        }
    }
}

fn serialize_payload(payload: CommandOutcome<'_>) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Flags shared by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    #[arg(long, global = true, value_name = "PATH", help = "Config file (default: ./stockpulse.toml or ./config/stockpulse.toml)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, value_name = "DATE", help = "Treat this date (YYYY-MM-DD) as today")]
    pub as_of: Option<NaiveDate>,
    #[arg(long, global = true, value_name = "N", help = "Festival look-ahead window in days")]
    pub horizon_days: Option<u32>,
    #[arg(long, global = true, value_name = "LEVEL", help = "Log level (trace|debug|info|warn|error)")]
    pub log_level: Option<String>,
}

impl GlobalArgs {
    fn load_options(&self) -> LoadOptions {
        LoadOptions {
            config_path: self.config.clone(),
            require_file: self.config.is_some(),
            overrides: ConfigOverrides {
                festival_horizon_days: self.horizon_days,
                as_of: self.as_of,
                log_level: self.log_level.clone(),
                ..ConfigOverrides::default()
            },
        }
    }
}

/// Input file plus record filters.
#[derive(Debug, Clone, Default, Args)]
pub struct DatasetArgs {
    #[arg(value_name = "CSV", help = "Inventory CSV with Date, Product, Sold and Stock columns")]
    pub input: PathBuf,
    #[arg(long, value_name = "DATE", help = "Only records on or after this date")]
    pub from: Option<NaiveDate>,
    #[arg(long, value_name = "DATE", help = "Only records on or before this date")]
    pub to: Option<NaiveDate>,
    #[arg(long, help = "Only records from this season (winter|spring|summer|autumn)")]
    pub season: Option<Season>,
    #[arg(long, help = "Only records in this category")]
    pub category: Option<String>,
}

impl DatasetArgs {
    pub fn filter(&self) -> DatasetFilter {
        DatasetFilter {
            from: self.from,
            to: self.to,
            season: self.season,
            category: self.category.clone(),
        }
    }
}

/// Configuration and reference data for one invocation.
pub struct Runtime {
    pub config: AppConfig,
    pub analyzer: InventoryAnalyzer,
    pub run_id: String,
}

impl Runtime {
    pub fn load(global: &GlobalArgs) -> Result<Self, ConfigError> {
        let config = AppConfig::load(global.load_options())?;
        let analyzer = InventoryAnalyzer::from_config(&config)?;
        Ok(Self { config, analyzer, run_id: uuid::Uuid::new_v4().to_string() })
    }

    pub fn today(&self) -> NaiveDate {
        self.config.today()
    }

    pub fn load_dataset(&self, path: &Path) -> anyhow::Result<Dataset> {
        let dataset = load_dataset_file(path, self.config.analysis.category_fallback)
            .with_context(|| format!("loading `{}`", path.display()))?;

        for rejected in &dataset.rejected {
            warn!(
                event_name = "cli.dataset.row_rejected",
                correlation_id = %self.run_id,
                line = rejected.line,
                reason = %rejected.reason,
                "row skipped"
            );
        }
        info!(
            event_name = "cli.dataset.loaded",
            correlation_id = %self.run_id,
            path = %path.display(),
            records = dataset.records.len(),
            rejected = dataset.rejected.len(),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Loads the dataset (and optional prior period) and runs the full
    /// analysis over the filtered records.
    pub fn analyze(
        &self,
        args: &DatasetArgs,
        previous: Option<&Path>,
    ) -> anyhow::Result<AnalyzedDataset> {
        let dataset = self.load_dataset(&args.input)?;
        let prior = previous.map(|path| self.load_dataset(path)).transpose()?;
        let filter = args.filter();
        let records = filter.apply(&dataset.records);

        let report = self.analyzer.analyze(AnalysisInput {
            records: &records,
            prior: prior.as_ref().map(|prior| prior.records.as_slice()),
            today: self.today(),
            // Already applied above.
            filter: DatasetFilter::default(),
        });

        Ok(AnalyzedDataset { dataset, records, report })
    }
}

pub struct AnalyzedDataset {
    pub dataset: Dataset,
    /// Records that passed the filter.
    pub records: Vec<NormalizedRecord>,
    pub report: AnalysisReport,
}

pub(crate) fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

pub(crate) fn format_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "N/A".to_string(), |date| date.format("%Y-%m-%d").to_string())
}
