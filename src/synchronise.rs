//! Bucket synchronisation: mirrors every object of a bucket onto a local
//! directory tree.
//!
//! The routine is a single sequential pass:
//!   - validate the credential and bucket name (no I/O before this)
//!   - hand the credential to the connector, on disk only if it asks for a file
//!   - authenticate and resolve the bucket
//!   - list the whole bucket before downloading anything
//!   - download each object in listing order to `destination/<key>`,
//!     skipping directory placeholders and overwriting existing files
//!
//! # Error Handling
//! The first failure ends the sync; objects written before it are left in
//! place but not reported. Errors are classified by [`SyncError`] and turned
//! into a structured result by [`sync`]. The temporary credential file, when
//! one is created, is removed on every exit path.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, error, info};

use crate::contract::{CredentialMode, ResolvedCredential, StorageConnector};
use crate::credential::CredentialFile;
use crate::error::SyncError;
use crate::job::{HandlerResult, JobError};

/// Summary of a successful sync.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub bucket: String,
    pub destination: PathBuf,
    pub count: usize,
    pub files: Vec<PathBuf>,
}

pub type SyncResult = HandlerResult<SyncReport>;

/// Download every object in `bucket` below `destination`, reporting the outcome
/// as a structured result. Never panics or propagates an error.
pub async fn sync<C>(
    connector: &C,
    credential: Option<&str>,
    bucket: &str,
    destination: &Path,
) -> SyncResult
where
    C: StorageConnector + ?Sized,
{
    match try_sync(connector, credential, bucket, destination).await {
        Ok(report) => HandlerResult::Success(report),
        Err(e) => {
            error!(
                error = %e,
                bucket,
                destination = %destination.display(),
                "[SYNC][ERROR] Bucket sync failed"
            );
            HandlerResult::Error(JobError::from(&e))
        }
    }
}

/// Same as [`sync`], with the failure kept as a [`SyncError`].
pub async fn try_sync<C>(
    connector: &C,
    credential: Option<&str>,
    bucket: &str,
    destination: &Path,
) -> Result<SyncReport, SyncError>
where
    C: StorageConnector + ?Sized,
{
    let credential = match credential {
        Some(c) if !c.trim().is_empty() => c,
        _ => {
            return Err(SyncError::Configuration(
                "object store credential is not set".to_string(),
            ))
        }
    };
    if bucket.trim().is_empty() {
        return Err(SyncError::Configuration("bucket name is empty".to_string()));
    }

    info!(
        bucket,
        destination = %destination.display(),
        "[SYNC] Starting bucket sync"
    );

    fs::create_dir_all(destination).map_err(|e| {
        SyncError::Filesystem(format!(
            "cannot create destination {}: {e}",
            destination.display()
        ))
    })?;

    // Held until the end of the function so the file outlives every store call.
    let (resolved, _credential_file) = match connector.credential_mode() {
        CredentialMode::InMemory => (ResolvedCredential::Inline(credential.to_string()), None),
        CredentialMode::File => {
            let file = CredentialFile::create(credential).map_err(|e| {
                SyncError::Filesystem(format!("cannot write temporary credential file: {e}"))
            })?;
            (ResolvedCredential::File(file.path().to_path_buf()), Some(file))
        }
    };

    let handle = connector
        .connect(&resolved, bucket)
        .await
        .map_err(SyncError::from_connect)?;
    info!(bucket, "[SYNC] Authenticated and resolved bucket");

    let objects = handle
        .list()
        .await
        .map_err(|e| SyncError::Listing(e.to_string()))?;
    info!(bucket, objects = objects.len(), "[SYNC] Listed bucket");

    let mut files = Vec::new();
    for object in &objects {
        if object.is_directory_placeholder() {
            debug!(key = %object.key, "[SYNC] Skipping directory placeholder");
            continue;
        }
        let target = local_path(destination, &object.key)?;
        let bytes = handle
            .fetch(&object.key)
            .await
            .map_err(|e| SyncError::transfer(&object.key, e))?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| SyncError::transfer(&object.key, e))?;
        }
        fs::write(&target, &bytes).map_err(|e| SyncError::transfer(&object.key, e))?;
        debug!(
            key = %object.key,
            bytes = bytes.len(),
            path = %target.display(),
            "[SYNC] Wrote object"
        );
        files.push(target);
    }

    info!(
        bucket,
        count = files.len(),
        destination = %destination.display(),
        "[SYNC] Bucket sync complete"
    );
    Ok(SyncReport {
        bucket: bucket.to_string(),
        destination: destination.to_path_buf(),
        count: files.len(),
        files,
    })
}

/// Maps an object key onto a path below `root`, one directory per key segment.
/// Empty and `.` segments are dropped; `..` is rejected.
pub fn local_path(root: &Path, key: &str) -> Result<PathBuf, SyncError> {
    let mut path = root.to_path_buf();
    let mut segments = 0;
    for segment in key.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(SyncError::transfer(
                    key,
                    "object key escapes the destination root",
                ))
            }
            s => {
                path.push(s);
                segments += 1;
            }
        }
    }
    if segments == 0 {
        return Err(SyncError::transfer(key, "object key has no path segments"));
    }
    Ok(path)
}
