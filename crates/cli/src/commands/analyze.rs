use std::path::PathBuf;

use clap::Args;
use stockpulse_core::analysis::AnalysisReport;

use crate::commands::{format_date, format_quantity, CommandResult, DatasetArgs, Runtime};

const COMMAND: &str = "analyze";

#[derive(Debug, Clone, Default, Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, value_name = "CSV", help = "Prior-period CSV used for the sales delta")]
    pub previous: Option<PathBuf>,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

pub fn run(runtime: &Runtime, args: &AnalyzeArgs) -> CommandResult {
    let analyzed = match runtime.analyze(&args.dataset, args.previous.as_deref()) {
        Ok(analyzed) => analyzed,
        Err(error) => return CommandResult::from_error(COMMAND, &runtime.run_id, &error),
    };

    let message = format!(
        "analyzed {} records across {} products ({} rows rejected)",
        analyzed.report.records_analyzed,
        analyzed.report.metrics.unique_products,
        analyzed.dataset.rejected.len()
    );

    if args.json {
        return CommandResult::with_data(COMMAND, message, &analyzed.report);
    }

    CommandResult::text(render_human(&message, &analyzed.report))
}

fn render_human(message: &str, report: &AnalysisReport) -> String {
    let metrics = &report.metrics;
    let summary = &report.status_summary;
    let mut lines = vec![
        format!("{message} as of {}", report.generated_on),
        format!(
            "metrics: total sales {}, average stock {:.2}, out-of-stock records {}, sales delta {}",
            format_quantity(metrics.total_sales),
            metrics.avg_stock,
            metrics.out_of_stock,
            format_quantity(metrics.delta_sales)
        ),
        format!(
            "stock: {} need immediate restock, {} low, {} healthy",
            summary.immediate_restock, summary.low_stock, summary.healthy
        ),
        format!("weather: {}", report.weather.forecast),
    ];

    lines.push("restock priorities:".to_string());
    for prediction in report.predictions.iter().take(5) {
        lines.push(format!(
            "  - {} [{}] restock {} ({})",
            prediction.product,
            prediction.status.label(),
            format_date(prediction.restock_date),
            prediction.reason
        ));
    }

    if report.recommendations.is_empty() {
        lines.push("recommendations: none, inventory looks balanced".to_string());
    } else {
        lines.push("recommendations:".to_string());
        for recommendation in &report.recommendations {
            lines.push(format!(
                "  - [{}] {} ({} products)",
                recommendation.urgency,
                recommendation.title,
                recommendation.products.len()
            ));
        }
    }

    lines.push("top performers:".to_string());
    for velocity in report.velocity.iter().take(5) {
        lines.push(format!(
            "  - {} score {:.2} ({})",
            velocity.product,
            velocity.performance_score,
            velocity.sales_trend.as_str()
        ));
    }

    lines.join("\n")
}
