use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::record::CategoryFallback;

pub const CONFIG_FILE_NAME: &str = "stockpulse.toml";
pub const DEFAULT_FESTIVAL_HORIZON_DAYS: u32 = 30;
pub const MAX_FESTIVAL_HORIZON_DAYS: u32 = 366;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub reference: ReferenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnalysisConfig {
    pub festival_horizon_days: u32,
    pub category_fallback: CategoryFallback,
    /// Fixed "today" for reproducible runs; `None` means the system date.
    pub as_of: Option<NaiveDate>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceConfig {
    pub festival_calendar: Option<PathBuf>,
    pub weather_map: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub festival_horizon_days: Option<u32>,
    pub category_fallback: Option<CategoryFallback>,
    pub as_of: Option<NaiveDate>,
    pub festival_calendar: Option<PathBuf>,
    pub weather_map: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig {
                festival_horizon_days: DEFAULT_FESTIVAL_HORIZON_DAYS,
                category_fallback: CategoryFallback::default(),
                as_of: None,
            },
            reference: ReferenceConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(analysis) = patch.analysis {
            if let Some(festival_horizon_days) = analysis.festival_horizon_days {
                self.analysis.festival_horizon_days = festival_horizon_days;
            }
            if let Some(category_fallback) = analysis.category_fallback {
                self.analysis.category_fallback = category_fallback;
            }
            if let Some(as_of) = analysis.as_of {
                self.analysis.as_of = Some(as_of);
            }
        }

        if let Some(reference) = patch.reference {
            if let Some(festival_calendar) = reference.festival_calendar {
                self.reference.festival_calendar = Some(festival_calendar);
            }
            if let Some(weather_map) = reference.weather_map {
                self.reference.weather_map = Some(weather_map);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("STOCKPULSE_FESTIVAL_HORIZON_DAYS") {
            self.analysis.festival_horizon_days =
                parse_u32("STOCKPULSE_FESTIVAL_HORIZON_DAYS", &value)?;
        }
        if let Some(value) = read_env("STOCKPULSE_CATEGORY_FALLBACK") {
            self.analysis.category_fallback = value.parse().map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "STOCKPULSE_CATEGORY_FALLBACK".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("STOCKPULSE_AS_OF") {
            self.analysis.as_of = Some(parse_date("STOCKPULSE_AS_OF", &value)?);
        }

        if let Some(value) = read_env("STOCKPULSE_FESTIVAL_CALENDAR") {
            self.reference.festival_calendar = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("STOCKPULSE_WEATHER_MAP") {
            self.reference.weather_map = Some(PathBuf::from(value));
        }

        let log_level =
            read_env("STOCKPULSE_LOGGING_LEVEL").or_else(|| read_env("STOCKPULSE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("STOCKPULSE_LOGGING_FORMAT").or_else(|| read_env("STOCKPULSE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(festival_horizon_days) = overrides.festival_horizon_days {
            self.analysis.festival_horizon_days = festival_horizon_days;
        }
        if let Some(category_fallback) = overrides.category_fallback {
            self.analysis.category_fallback = category_fallback;
        }
        if let Some(as_of) = overrides.as_of {
            self.analysis.as_of = Some(as_of);
        }
        if let Some(festival_calendar) = overrides.festival_calendar {
            self.reference.festival_calendar = Some(festival_calendar);
        }
        if let Some(weather_map) = overrides.weather_map {
            self.reference.weather_map = Some(weather_map);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_analysis(&self.analysis)?;
        validate_reference(&self.reference)?;
        validate_logging(&self.logging)?;
        Ok(())
    }

    /// The date the analysis treats as "today".
    pub fn today(&self) -> NaiveDate {
        self.analysis.as_of.unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(CONFIG_FILE_NAME), PathBuf::from("config").join(CONFIG_FILE_NAME)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_analysis(analysis: &AnalysisConfig) -> Result<(), ConfigError> {
    if analysis.festival_horizon_days > MAX_FESTIVAL_HORIZON_DAYS {
        return Err(ConfigError::Validation(format!(
            "analysis.festival_horizon_days must be in range 0..={MAX_FESTIVAL_HORIZON_DAYS}"
        )));
    }

    Ok(())
}

fn validate_reference(reference: &ReferenceConfig) -> Result<(), ConfigError> {
    for (key, path) in [
        ("reference.festival_calendar", reference.festival_calendar.as_deref()),
        ("reference.weather_map", reference.weather_map.as_deref()),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::Validation(format!(
                    "{key} points to `{}` which does not exist",
                    path.display()
                )));
            }
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_date(key: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    analysis: Option<AnalysisPatch>,
    reference: Option<ReferencePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AnalysisPatch {
    festival_horizon_days: Option<u32>,
    category_fallback: Option<CategoryFallback>,
    as_of: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
struct ReferencePatch {
    festival_calendar: Option<PathBuf>,
    weather_map: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
