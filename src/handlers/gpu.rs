//! GPU diagnostics via `nvidia-smi` and `nvcc`.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::contract::CommandRunner;
use crate::error::ErrorKind;
use crate::job::{HandlerResult, JobError};

pub const QUERY_FIELDS: &str =
    "name,driver_version,memory.total,memory.used,memory.free,temperature.gpu,power.draw";

const NOT_SET: &str = "Not set";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuDetail {
    pub gpu_id: usize,
    pub name: String,
    pub driver_version: String,
    pub memory_total_mb: String,
    pub memory_used_mb: String,
    pub memory_free_mb: String,
    pub temperature_c: String,
    pub power_draw_w: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuEnvironment {
    pub cuda_visible_devices: String,
    pub runpod_endpoint_id: String,
}

impl GpuEnvironment {
    pub fn from_process() -> Self {
        let var = |k: &str| std::env::var(k).unwrap_or_else(|_| NOT_SET.to_string());
        Self {
            cuda_visible_devices: var("CUDA_VISIBLE_DEVICES"),
            runpod_endpoint_id: var("RUNPOD_ENDPOINT_ID"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuReport {
    pub nvidia_smi_output: String,
    pub gpu_details: Vec<GpuDetail>,
    pub cuda_info: String,
    pub gpu_count: usize,
    pub environment: GpuEnvironment,
    pub input_received: Value,
}

/// Collects the full `nvidia-smi` report, per-GPU details and the CUDA
/// toolkit version.
pub async fn gpu_report<R>(
    runner: &R,
    input: Value,
    environment: GpuEnvironment,
) -> HandlerResult<GpuReport>
where
    R: CommandRunner + ?Sized,
{
    info!("Running nvidia-smi");
    let nvidia_smi_output = match run_checked(runner, "nvidia-smi", &[], &input).await {
        Ok(out) => out,
        Err(e) => return HandlerResult::Error(e),
    };

    let query_args = [
        format!("--query-gpu={QUERY_FIELDS}"),
        "--format=csv,noheader,nounits".to_string(),
    ];
    let query_output = match run_checked(runner, "nvidia-smi", &query_args, &input).await {
        Ok(out) => out,
        Err(e) => return HandlerResult::Error(e),
    };
    let gpu_details = parse_gpu_query(&query_output);

    let cuda_info = match runner.run("nvcc", &["--version".to_string()]).await {
        Ok(out) if out.success => cuda_release_line(&out.output),
        Ok(out) => {
            warn!(code = ?out.code, "nvcc exited with an error");
            "NVCC not available".to_string()
        }
        Err(e) => {
            warn!(error = ?e, "nvcc could not be started");
            "NVCC not available".to_string()
        }
    };

    info!(gpu_count = gpu_details.len(), cuda_info = %cuda_info, "GPU report collected");
    HandlerResult::Success(GpuReport {
        nvidia_smi_output,
        gpu_count: gpu_details.len(),
        gpu_details,
        cuda_info,
        environment,
        input_received: input,
    })
}

/// A non-zero exit is a `subprocess_error` carrying the command output; a
/// command that cannot be spawned is a `general_error` echoing the job input.
async fn run_checked<R>(
    runner: &R,
    program: &str,
    args: &[String],
    input: &Value,
) -> Result<String, JobError>
where
    R: CommandRunner + ?Sized,
{
    let command_line = std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ");
    match runner.run(program, args).await {
        Ok(out) if out.success => Ok(out.output),
        Ok(out) => {
            let status = out
                .code
                .map(|c| format!("exit status {c}"))
                .unwrap_or_else(|| "terminated by signal".to_string());
            Err(JobError::new(
                ErrorKind::SubprocessError,
                format!("Command failed: '{command_line}' returned {status}"),
            )
            .with_output(out.output))
        }
        Err(e) => Err(JobError::new(
            ErrorKind::GeneralError,
            format!("could not run '{command_line}': {e}"),
        )
        .with_input(input.clone())),
    }
}

/// Parses `--format=csv,noheader,nounits` output. Lines with fewer than seven
/// fields are skipped but still consume a GPU index.
pub fn parse_gpu_query(output: &str) -> Vec<GpuDetail> {
    output
        .trim()
        .lines()
        .enumerate()
        .filter_map(|(gpu_id, line)| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() < 7 {
                return None;
            }
            Some(GpuDetail {
                gpu_id,
                name: parts[0].to_string(),
                driver_version: parts[1].to_string(),
                memory_total_mb: parts[2].to_string(),
                memory_used_mb: parts[3].to_string(),
                memory_free_mb: parts[4].to_string(),
                temperature_c: parts[5].to_string(),
                power_draw_w: parts[6].to_string(),
            })
        })
        .collect()
}

/// First line of `nvcc --version` that mentions the release.
pub fn cuda_release_line(output: &str) -> String {
    output
        .lines()
        .find(|l| l.to_lowercase().contains("release"))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "Not available".to_string())
}
