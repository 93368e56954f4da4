use clap::Parser;
use presentation::cli::{Cli, CliApp};
use shared::telemetry::init_tracing;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing("info");
    let cli = Cli::parse();
    let mut app = CliApp::new();
    match app.run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            CliApp::report_error(&err);
            ExitCode::FAILURE
        }
    }
}
