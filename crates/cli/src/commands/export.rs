use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use stockpulse_core::export::{export_to_file, ExportKind};

use crate::commands::{CommandResult, DatasetArgs, Runtime};

const COMMAND: &str = "export";

#[derive(Debug, Clone, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[arg(long, value_name = "KIND", help = "dataset|predictions|recommendations|summary")]
    pub kind: ExportKind,
    #[arg(long, value_name = "PATH", help = "Output file; defaults to <kind>_<date>.csv")]
    pub out: Option<PathBuf>,
}

pub fn run(runtime: &Runtime, args: &ExportArgs) -> CommandResult {
    let result = runtime.analyze(&args.dataset, None).and_then(|analyzed| {
        let path =
            args.out.clone().unwrap_or_else(|| PathBuf::from(args.kind.file_name(runtime.today())));
        let rows = export_to_file(args.kind, &path, &analyzed.records, &analyzed.report)
            .with_context(|| format!("exporting {} to `{}`", args.kind, path.display()))?;
        Ok((rows, path))
    });

    match result {
        Ok((rows, path)) => CommandResult::success(
            COMMAND,
            format!("wrote {rows} {} rows to {}", args.kind, path.display()),
        ),
        Err(error) => CommandResult::from_error(COMMAND, &runtime.run_id, &error),
    }
}
