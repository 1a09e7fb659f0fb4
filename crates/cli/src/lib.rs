pub mod commands;
pub mod logging;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{info, info_span};

use crate::commands::{
    analyze::AnalyzeArgs, export::ExportArgs, metrics::MetricsArgs, predict::PredictArgs,
    recommend::RecommendArgs, velocity::VelocityArgs, CommandResult, GlobalArgs, Runtime,
    EXIT_CONFIG,
};

#[derive(Debug, Parser)]
#[command(
    name = "stockpulse",
    about = "Stockpulse inventory analytics CLI",
    long_about = "Analyze inventory CSV files: restock predictions, sales velocity, key metrics, and festival, weather and shortage recommendations.",
    after_help = "Examples:\n  stockpulse analyze inventory.csv --json\n  stockpulse predict inventory.csv --season winter\n  stockpulse export inventory.csv --kind summary --out summary.csv\n  stockpulse config"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run the full analysis and print a report")]
    Analyze(AnalyzeArgs),
    #[command(about = "Predict restock dates and classify stock status per product")]
    Predict(PredictArgs),
    #[command(about = "Generate festival, weather and shortage recommendations")]
    Recommend(RecommendArgs),
    #[command(about = "Rank products by sales velocity and summarize categories")]
    Velocity(VelocityArgs),
    #[command(about = "Print dataset-wide key metrics as JSON")]
    Metrics(MetricsArgs),
    #[command(about = "Write the dataset, predictions, recommendations or summary as CSV")]
    Export(ExportArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Analyze(_) => "analyze",
            Self::Predict(_) => "predict",
            Self::Recommend(_) => "recommend",
            Self::Velocity(_) => "velocity",
            Self::Metrics(_) => "metrics",
            Self::Export(_) => "export",
            Self::Config => "config",
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn execute(cli: Cli) -> CommandResult {
    let runtime = match Runtime::load(&cli.global) {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                cli.command.name(),
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    logging::init_logging(&runtime.config.logging);
    info!(
        event_name = "cli.command.started",
        correlation_id = %runtime.run_id,
        command = cli.command.name(),
        today = %runtime.today(),
        "command started"
    );

    // Engine events inherit the run id through this span.
    let span = info_span!("command", correlation_id = %runtime.run_id);
    span.in_scope(|| match &cli.command {
        Command::Analyze(args) => commands::analyze::run(&runtime, args),
        Command::Predict(args) => commands::predict::run(&runtime, args),
        Command::Recommend(args) => commands::recommend::run(&runtime, args),
        Command::Velocity(args) => commands::velocity::run(&runtime, args),
        Command::Metrics(args) => commands::metrics::run(&runtime, args),
        Command::Export(args) => commands::export::run(&runtime, args),
        Command::Config => commands::config::run(&runtime, &cli.global),
    })
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stockpulse",
            "predict",
            "inventory.csv",
            "--as-of",
            "2024-10-29",
            "--season",
            "autumn",
            "--json",
        ])
        .expect("valid arguments");

        assert_eq!(cli.global.as_of.map(|date| date.to_string()), Some("2024-10-29".to_string()));
        match cli.command {
            Command::Predict(args) => {
                assert!(args.json);
                assert_eq!(args.dataset.input.to_str(), Some("inventory.csv"));
                assert!(args.dataset.season.is_some());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_export_kind() {
        let parsed = Cli::try_parse_from([
            "stockpulse",
            "export",
            "inventory.csv",
            "--kind",
            "pdf",
        ]);

        assert!(parsed.is_err());
    }
}
