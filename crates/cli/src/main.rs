use std::process::ExitCode;

fn main() -> ExitCode {
    stockpulse_cli::run()
}
