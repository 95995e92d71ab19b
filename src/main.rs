//! config-aggregator: merge per-application configuration by profile

use std::process::ExitCode;

fn main() -> ExitCode {
    match config_aggregator::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(config_aggregator::cli::exit_code(&err))
        }
    }
}
