use std::path::PathBuf;

use clap::Args;

use crate::commands::{CommandResult, DatasetArgs, Runtime};

const COMMAND: &str = "metrics";

#[derive(Debug, Clone, Default, Args)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, value_name = "CSV", help = "Prior-period CSV used for the sales delta")]
    pub previous: Option<PathBuf>,
}

pub fn run(runtime: &Runtime, args: &MetricsArgs) -> CommandResult {
    match runtime.analyze(&args.dataset, args.previous.as_deref()) {
        Ok(analyzed) => CommandResult::with_data(
            COMMAND,
            format!("{} records analyzed", analyzed.report.records_analyzed),
            &analyzed.report.metrics,
        ),
        Err(error) => CommandResult::from_error(COMMAND, &runtime.run_id, &error),
    }
}
