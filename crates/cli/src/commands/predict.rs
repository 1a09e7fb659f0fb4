use clap::Args;
use serde::Serialize;
use stockpulse_core::restock::{RestockPrediction, StatusSummary};

use crate::commands::{format_date, format_quantity, CommandResult, DatasetArgs, Runtime};

const COMMAND: &str = "predict";

#[derive(Debug, Clone, Default, Args)]
pub struct PredictArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct PredictionView<'a> {
    predictions: &'a [RestockPrediction],
    status_summary: &'a StatusSummary,
}

pub fn run(runtime: &Runtime, args: &PredictArgs) -> CommandResult {
    let analyzed = match runtime.analyze(&args.dataset, None) {
        Ok(analyzed) => analyzed,
        Err(error) => return CommandResult::from_error(COMMAND, &runtime.run_id, &error),
    };
    let report = &analyzed.report;
    let message = format!("{} restock predictions", report.predictions.len());

    if args.json {
        let view = PredictionView {
            predictions: &report.predictions,
            status_summary: &report.status_summary,
        };
        return CommandResult::with_data(COMMAND, message, &view);
    }

    let mut lines = vec![message];
    for prediction in &report.predictions {
        lines.push(format!(
            "- {} ({}) [{}] stock {} avg {:.2}/day restock {}: {}",
            prediction.product,
            prediction.category,
            prediction.status.label(),
            format_quantity(prediction.current_stock),
            prediction.avg_daily_sales,
            format_date(prediction.restock_date),
            prediction.reason
        ));
    }
    let summary = &report.status_summary;
    lines.push(format!(
        "summary: {} need immediate restock, {} low, {} healthy",
        summary.immediate_restock, summary.low_stock, summary.healthy
    ));

    CommandResult::text(lines.join("\n"))
}
