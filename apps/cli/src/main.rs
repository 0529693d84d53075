use fulfil_cli::cli::Cli;
use fulfil_cli::commands::run;
use fulfil_cli::error::CliError;
use fulfil_cli::logger::initialize as LoggerInitialize;

use std::fs::create_dir_all;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{Level, error, info, log_enabled};

const LOG_DIR_NAME: &str = "fulfil";

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(LOG_DIR_NAME)
}

async fn run_cli(cli: Cli) -> Result<(), CliError> {
    let log_dir = cli.log_dir.clone().unwrap_or_else(default_log_dir);
    create_dir_all(&log_dir)
        .map_err(|e| CliError::cli(format!("Failed to create log directory: {e}")))?;
    LoggerInitialize(&log_dir, cli.verbose)?;

    info!("Running {}", cli.command.name());
    let output = run(&cli).await?;

    let rendered = serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::cli(format!("Failed to render output: {e}")))?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run_cli(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Before the logger is up nothing would reach stderr.
            if log_enabled!(Level::Error) {
                error!("{e}");
            } else {
                eprintln!("{e}");
            }
            ExitCode::FAILURE
        }
    }
}
