//! Command-line entrypoint for the worker.
//!
//! Each subcommand builds one job, runs it through [`handle_job`] and prints
//! the JSON result on stdout. Logs go to stderr, so stdout stays machine
//! readable.
//!
//! - `invoke`: run a job payload read from `--job FILE` or stdin.
//! - `sync`: download the configured bucket (flags override configuration).
//! - `gpu-info`: report GPU diagnostics.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::io::AsyncReadExt;

use crate::handlers::{handle_job, HandlerContext, JobResult};
use crate::job::Job;
use crate::load_config::load_config;

/// CLI for gpu-worker: GPU diagnostics and bucket provisioning jobs.
#[derive(Parser)]
#[clap(
    name = "gpu-worker",
    version,
    about = "Serverless GPU worker: GPU diagnostics, file listing and bucket sync jobs"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single job payload and print its result
    Invoke {
        /// JSON job file; read from stdin when omitted
        #[clap(long)]
        job: Option<PathBuf>,
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
    /// Download every object of a bucket into the destination directory
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Bucket to download (overrides configuration)
        #[clap(long)]
        bucket: Option<String>,
        /// Destination root (overrides configuration)
        #[clap(long)]
        destination: Option<PathBuf>,
    },
    /// Report GPU diagnostics
    GpuInfo,
}

/// Async CLI logic, shared by `main` and integration tests.
pub async fn run(cli: Cli) -> Result<JobResult> {
    tracing::info!("trace_initialised");

    let (config_path, job) = match cli.command {
        Commands::Invoke { job, config } => (config, read_job(job).await?),
        Commands::Sync {
            config,
            bucket,
            destination,
        } => (
            config,
            Job {
                id: None,
                input: json!({
                    "action": "sync_bucket",
                    "bucket": bucket,
                    "destination": destination,
                }),
            },
        ),
        Commands::GpuInfo => (
            None,
            Job {
                id: None,
                input: json!({ "action": "gpu_info" }),
            },
        ),
    };

    let config = load_config(config_path.as_deref())?;
    let ctx = HandlerContext::from_config(config);
    let result = handle_job(&ctx, job).await;

    let rendered = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
    println!("{rendered}");
    Ok(result)
}

async fn read_job(path: Option<PathBuf>) -> Result<Job> {
    let raw = match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read job from stdin")?;
            buf
        }
    };
    serde_json::from_str(&raw).context("Failed to parse job JSON")
}
