//! # contract: capability interfaces the handlers are written against
//!
//! This module defines the traits that separate the worker's logic from the
//! outside world: an object-store service ([`StorageConnector`] and
//! [`BucketHandle`]) and the host's process table ([`CommandRunner`]).
//!
//! ## Interface & Extensibility
//! - Implement [`StorageConnector`] to add another object-store backend; see
//!   [`crate::gcs`] for the Google Cloud Storage client.
//! - All storage methods are async and return [`StoreError`]; the sync routine
//!   decides which phase a failure belongs to.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall`. With the default
//!   `test-export-mocks` feature the generated mocks are public so integration
//!   tests can script a bucket without any network access.

use std::path::PathBuf;

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::StoreError;

/// An object as enumerated from a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Slash-delimited object key.
    pub key: String,
    /// Object length in bytes.
    pub size: u64,
}

impl RemoteObject {
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
        }
    }

    /// Keys ending in `/` are folder markers, not content. A trailing `.`
    /// segment (`models/sub/.`) names the folder itself and counts as one too.
    pub fn is_directory_placeholder(&self) -> bool {
        self.key.ends_with('/') || self.key == "." || self.key.ends_with("/.")
    }
}

/// How a storage client wants to receive its credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    InMemory,
    File,
}

/// The credential in the form requested by [`StorageConnector::credential_mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    Inline(String),
    File(PathBuf),
}

/// Authenticates against an object-store service and hands out bucket handles.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait StorageConnector: Send + Sync {
    fn credential_mode(&self) -> CredentialMode;

    /// Authenticate with `credential` and resolve the named bucket.
    async fn connect(
        &self,
        credential: &ResolvedCredential,
        bucket: &str,
    ) -> Result<Box<dyn BucketHandle>, StoreError>;
}

/// An authenticated handle on a single bucket.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait BucketHandle: Send + Sync {
    /// Enumerate every object in the bucket, in listing order.
    async fn list(&self) -> Result<Vec<RemoteObject>, StoreError>;

    /// Download the full contents of one object.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}

/// Captured result of a finished subprocess. stdout and stderr are merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub output: String,
}

/// Runs host utilities such as `nvidia-smi`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Spawn `program` with `args` and wait for it. Failing to spawn is an `Err`;
    /// a non-zero exit is reported through [`CommandOutput::success`].
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

/// [`CommandRunner`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandRunner;

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        tracing::debug!(program, ?args, "Spawning subprocess");
        let out = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await?;
        let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        Ok(CommandOutput {
            success: out.status.success(),
            code: out.status.code(),
            output,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_detection() {
        assert!(RemoteObject::new("models/sub/", 0).is_directory_placeholder());
        assert!(!RemoteObject::new("models/sub/b.bin", 2).is_directory_placeholder());
        assert!(RemoteObject::new("models/sub/.", 0).is_directory_placeholder());
        assert!(!RemoteObject::new("models/sub/.env", 3).is_directory_placeholder());
    }
}
