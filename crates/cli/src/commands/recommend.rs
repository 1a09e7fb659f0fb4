use clap::Args;
use serde::Serialize;
use stockpulse_core::domain::reference::{UpcomingFestival, WeatherProfile};
use stockpulse_core::recommend::Recommendation;

use crate::commands::{CommandResult, DatasetArgs, Runtime};

const COMMAND: &str = "recommend";

#[derive(Debug, Clone, Default, Args)]
pub struct RecommendArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct RecommendationView<'a> {
    recommendations: &'a [Recommendation],
    weather: &'a WeatherProfile,
    upcoming_festivals: &'a [UpcomingFestival],
}

pub fn run(runtime: &Runtime, args: &RecommendArgs) -> CommandResult {
    let analyzed = match runtime.analyze(&args.dataset, None) {
        Ok(analyzed) => analyzed,
        Err(error) => return CommandResult::from_error(COMMAND, &runtime.run_id, &error),
    };
    let report = &analyzed.report;
    let message = format!(
        "{} recommendations, {} upcoming festivals",
        report.recommendations.len(),
        report.upcoming_festivals.len()
    );

    if args.json {
        let view = RecommendationView {
            recommendations: &report.recommendations,
            weather: &report.weather,
            upcoming_festivals: &report.upcoming_festivals,
        };
        return CommandResult::with_data(COMMAND, message, &view);
    }

    let mut lines = vec![message, format!("weather: {}", report.weather.forecast)];
    for festival in &report.upcoming_festivals {
        lines.push(format!(
            "festival: {} on {} (in {} days)",
            festival.event.name, festival.event.date, festival.days_until
        ));
    }
    if report.recommendations.is_empty() {
        lines.push("inventory looks balanced".to_string());
    }
    for recommendation in &report.recommendations {
        lines.push(String::new());
        lines.push(format!("[{}] {}", recommendation.urgency, recommendation.title));
        lines.push(recommendation.plain_reason());
    }

    CommandResult::text(lines.join("\n"))
}
