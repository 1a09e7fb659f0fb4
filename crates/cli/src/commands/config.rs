use std::env;
use std::fs;
use std::path::Path;

use stockpulse_core::config::resolve_config_path;
use toml::Value;

use crate::commands::{CommandResult, GlobalArgs, Runtime};

pub fn run(runtime: &Runtime, global: &GlobalArgs) -> CommandResult {
    let config = &runtime.config;
    let config_file_path = resolve_config_path(global.config.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let sources = Sources { file_doc: config_file_doc.as_ref(), file_path: config_file_path.as_deref() };

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(render_line(
        "analysis.festival_horizon_days",
        &config.analysis.festival_horizon_days.to_string(),
        sources.field(
            "analysis.festival_horizon_days",
            global.horizon_days.is_some(),
            &["STOCKPULSE_FESTIVAL_HORIZON_DAYS"],
        ),
    ));
    lines.push(render_line(
        "analysis.category_fallback",
        &format!("{:?}", config.analysis.category_fallback),
        sources.field("analysis.category_fallback", false, &["STOCKPULSE_CATEGORY_FALLBACK"]),
    ));
    lines.push(render_line(
        "analysis.as_of",
        &config
            .analysis
            .as_of
            .map_or_else(|| format!("<today: {}>", config.today()), |date| date.to_string()),
        sources.field("analysis.as_of", global.as_of.is_some(), &["STOCKPULSE_AS_OF"]),
    ));

    lines.push(render_line(
        "reference.festival_calendar",
        &render_path(config.reference.festival_calendar.as_deref()),
        sources.field("reference.festival_calendar", false, &["STOCKPULSE_FESTIVAL_CALENDAR"]),
    ));
    lines.push(render_line(
        "reference.weather_map",
        &render_path(config.reference.weather_map.as_deref()),
        sources.field("reference.weather_map", false, &["STOCKPULSE_WEATHER_MAP"]),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        sources.field(
            "logging.level",
            global.log_level.is_some(),
            &["STOCKPULSE_LOGGING_LEVEL", "STOCKPULSE_LOG_LEVEL"],
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        sources.field(
            "logging.format",
            false,
            &["STOCKPULSE_LOGGING_FORMAT", "STOCKPULSE_LOG_FORMAT"],
        ),
    ));

    let calendar = runtime.analyzer.reference().calendar.events().len();
    lines.push(format!("- loaded festival events = {calendar}"));

    CommandResult::text(lines.join("\n"))
}

struct Sources<'a> {
    file_doc: Option<&'a Value>,
    file_path: Option<&'a Path>,
}

impl Sources<'_> {
    fn field(&self, key_path: &str, from_flag: bool, env_keys: &[&str]) -> String {
        if from_flag {
            return "flag".to_string();
        }

        // Blank values are ignored by the loader, so they are not a source either.
        if let Some(env_key) = env_keys
            .iter()
            .find(|key| env::var(key).is_ok_and(|value| !value.trim().is_empty()))
        {
            return format!("env ({env_key})");
        }

        if let Some(doc) = self.file_doc {
            if contains_path(doc, key_path) {
                let file_path = self
                    .file_path
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "config file".to_string());
                return format!("file ({file_path})");
            }
        }

        "default".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| "<built-in>".to_string())
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
