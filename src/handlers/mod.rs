//! Job dispatch: routes `input.action` to a handler and wraps the outcome in
//! the `status`-tagged result the dispatch runtime expects.

pub mod files;
pub mod gpu;

use serde::Serialize;
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::contract::{CommandRunner, StorageConnector, SystemCommandRunner};
use crate::error::ErrorKind;
use crate::gcs::GcsConnector;
use crate::job::{Action, HandlerResult, Job, JobError};
use crate::synchronise::{sync, SyncReport};

pub use files::{list_files, FileEntry, FileListing};
pub use gpu::{gpu_report, GpuDetail, GpuEnvironment, GpuReport};

/// Success payload of any handler.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JobOutput {
    GpuInfo(GpuReport),
    FileListing(FileListing),
    BucketSync(SyncReport),
}

pub type JobResult = HandlerResult<JobOutput>;

/// Configuration plus the external capabilities the handlers use.
pub struct HandlerContext {
    pub config: WorkerConfig,
    pub storage: Box<dyn StorageConnector>,
    pub runner: Box<dyn CommandRunner>,
}

impl HandlerContext {
    pub fn new(
        config: WorkerConfig,
        storage: Box<dyn StorageConnector>,
        runner: Box<dyn CommandRunner>,
    ) -> Self {
        Self {
            config,
            storage,
            runner,
        }
    }

    /// Production wiring: GCS for storage, real subprocesses for host tools.
    pub fn from_config(config: WorkerConfig) -> Self {
        let storage = GcsConnector::new(&config.storage_endpoint)
            .with_credential_mode(config.credential_mode);
        Self::new(config, Box::new(storage), Box::new(SystemCommandRunner))
    }
}

/// Runs one job to completion. Failures come back as `status = error`.
pub async fn handle_job(ctx: &HandlerContext, job: Job) -> JobResult {
    let job_id = job.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let span = tracing::info_span!("job", job_id = %job_id);
    dispatch(ctx, job).instrument(span).await
}

async fn dispatch(ctx: &HandlerContext, job: Job) -> JobResult {
    let action = match Action::from_input(&job.input) {
        Ok(action) => action,
        Err(e) => {
            warn!(error = %e, "Rejected job input");
            return HandlerResult::Error(
                JobError::new(ErrorKind::InvalidInput, format!("invalid job input: {e}"))
                    .with_input(job.input),
            );
        }
    };
    info!(?action, "Dispatching job");

    let result = match action {
        Action::GpuInfo => gpu_report(
            ctx.runner.as_ref(),
            job.input,
            GpuEnvironment::from_process(),
        )
        .await
        .map(JobOutput::GpuInfo),
        Action::ListFiles { path, recursive } => {
            let root = path.unwrap_or_else(|| ctx.config.destination.clone());
            list_files(&root, recursive).map(JobOutput::FileListing)
        }
        Action::SyncBucket {
            bucket,
            destination,
        } => {
            let bucket = bucket.unwrap_or_else(|| ctx.config.bucket.clone());
            let destination = destination.unwrap_or_else(|| ctx.config.destination.clone());
            sync(
                ctx.storage.as_ref(),
                ctx.config.credential.as_deref(),
                &bucket,
                &destination,
            )
            .await
            .map(JobOutput::BucketSync)
        }
    };

    info!(success = result.is_success(), "Job finished");
    result
}
