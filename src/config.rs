use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::contract::CredentialMode;
use crate::gcs::DEFAULT_ENDPOINT;

pub const DEFAULT_BUCKET: &str = "models";
pub const DEFAULT_DESTINATION: &str = "/runpod-volume/models";

/// Runtime configuration shared by all handlers.
#[derive(Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub bucket: String,
    pub destination: PathBuf,
    /// Service-account key document. Only ever sourced from the environment.
    pub credential: Option<String>,
    pub storage_endpoint: String,
    pub credential_mode: CredentialMode,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            destination: PathBuf::from(DEFAULT_DESTINATION),
            credential: None,
            storage_endpoint: DEFAULT_ENDPOINT.to_string(),
            credential_mode: CredentialMode::InMemory,
        }
    }
}

// Hand-written so the credential never reaches a log line.
impl fmt::Debug for WorkerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerConfig")
            .field("bucket", &self.bucket)
            .field("destination", &self.destination)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("storage_endpoint", &self.storage_endpoint)
            .field("credential_mode", &self.credential_mode)
            .finish()
    }
}

impl WorkerConfig {
    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.bucket,
            destination = %self.destination.display(),
            storage_endpoint = %self.storage_endpoint,
            credential_set = self.credential.is_some(),
            "Loaded WorkerConfig"
        );
        debug!(?self, "WorkerConfig loaded (full debug)");
    }
}
