//! Transient on-disk copy of a credential, for storage clients that only
//! accept a key file path.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Scoped credential file. The file has a random name, is readable only by
/// the owner and is removed when the guard is dropped.
///
/// A failed removal is logged and otherwise ignored, so it can never replace
/// the result of the operation that owned the guard.
#[derive(Debug)]
pub struct CredentialFile {
    file: Option<NamedTempFile>,
}

impl CredentialFile {
    pub fn create(credential: &str) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("credential-")
            .suffix(".json")
            .tempfile()?;
        file.write_all(credential.as_bytes())?;
        file.flush()?;
        debug!(path = %file.path().display(), "Wrote temporary credential file");
        Ok(Self { file: Some(file) })
    }

    pub fn path(&self) -> &Path {
        match &self.file {
            Some(file) => file.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for CredentialFile {
    fn drop(&mut self) {
        let Some(file) = self.file.take() else {
            return;
        };
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => debug!(path = %path.display(), "Removed temporary credential file"),
            Err(e) => warn!(
                error = ?e,
                path = %path.display(),
                "Failed to remove temporary credential file"
            ),
        }
    }
}
