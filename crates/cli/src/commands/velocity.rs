use clap::Args;
use serde::Serialize;
use stockpulse_core::velocity::{CategoryPerformance, VelocityRecord};

use crate::commands::{format_quantity, CommandResult, DatasetArgs, Runtime};

const COMMAND: &str = "velocity";

#[derive(Debug, Clone, Default, Args)]
pub struct VelocityArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, help = "Emit machine-readable JSON output")]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct VelocityView<'a> {
    velocity: &'a [VelocityRecord],
    category_performance: &'a [CategoryPerformance],
}

pub fn run(runtime: &Runtime, args: &VelocityArgs) -> CommandResult {
    let analyzed = match runtime.analyze(&args.dataset, None) {
        Ok(analyzed) => analyzed,
        Err(error) => return CommandResult::from_error(COMMAND, &runtime.run_id, &error),
    };
    let report = &analyzed.report;
    let message = format!("{} products ranked", report.velocity.len());

    if args.json {
        let view = VelocityView {
            velocity: &report.velocity,
            category_performance: &report.category_performance,
        };
        return CommandResult::with_data(COMMAND, message, &view);
    }

    let mut lines = vec![message];
    for (rank, item) in report.velocity.iter().enumerate() {
        lines.push(format!(
            "{:>3}. {} ({}) score {:.2}, total {}, avg {:.2}/day, turn {:.1} days, {}",
            rank + 1,
            item.product,
            item.category,
            item.performance_score,
            format_quantity(item.total_sales),
            item.avg_daily_sales,
            item.stock_turn_days,
            item.sales_trend.as_str()
        ));
    }
    lines.push("categories:".to_string());
    for category in &report.category_performance {
        lines.push(format!(
            "  - {}: total {}, {} records, avg score {:.2}",
            category.category,
            format_quantity(category.total_sales),
            category.record_count,
            category.avg_performance_score
        ));
    }

    CommandResult::text(lines.join("\n"))
}
