use std::process::ExitCode;

use clap::Parser;
use gpu_worker::cli::{run, Cli};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment
    dotenvy::dotenv().ok();

    // stdout carries the job result, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("CLI application startup: tracing initialised, environment loaded");

    let cli = Cli::parse();
    match run(cli).await {
        Ok(result) if result.is_success() => {
            tracing::info!("CLI completed successfully");
            ExitCode::SUCCESS
        }
        Ok(_) => {
            tracing::error!("Job finished with status=error");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "CLI exited with error");
            eprintln!("[ERROR] {e:#}");
            ExitCode::FAILURE
        }
    }
}
