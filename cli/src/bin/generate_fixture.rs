use clap::Parser;
use presentation::cli::{CliApp, FixtureCli};
use shared::telemetry::init_tracing;
use std::process::ExitCode;

fn main() -> ExitCode {
    init_tracing("warn");
    let cli = FixtureCli::parse();
    match CliApp::generate_fixture(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            CliApp::report_error(&err);
            ExitCode::FAILURE
        }
    }
}
