//! Error taxonomy shared by the worker handlers.
//!
//! Every failure is converted into a structured job result at the handler
//! boundary; [`ErrorKind`] is the wire-visible `error_type` of that result.

use serde::Serialize;
use thiserror::Error;

/// Wire-visible classification of a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationError,
    AuthenticationError,
    ListingError,
    TransferError,
    FilesystemError,
    SubprocessError,
    /// A host command could not be started at all.
    GeneralError,
    InvalidInput,
}

/// Failure reported by a storage backend, before it is attributed to a
/// phase of the sync.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of a bucket sync. The first failure ends the whole operation.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("listing failed: {0}")]
    Listing(String),
    #[error("transfer of '{key}' failed: {message}")]
    Transfer { key: String, message: String },
    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::Configuration(_) => ErrorKind::ConfigurationError,
            SyncError::Authentication(_) => ErrorKind::AuthenticationError,
            SyncError::Listing(_) => ErrorKind::ListingError,
            SyncError::Transfer { .. } => ErrorKind::TransferError,
            SyncError::Filesystem(_) => ErrorKind::FilesystemError,
        }
    }

    /// Attributes a failure obtaining the bucket handle.
    pub(crate) fn from_connect(e: StoreError) -> Self {
        match e {
            StoreError::Unauthorized(msg) => SyncError::Authentication(msg),
            other => SyncError::Listing(other.to_string()),
        }
    }

    pub(crate) fn transfer(key: &str, message: impl ToString) -> Self {
        SyncError::Transfer {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}
