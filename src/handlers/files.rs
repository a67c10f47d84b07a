use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::error::ErrorKind;
use crate::job::{HandlerResult, JobError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileListing {
    pub root: PathBuf,
    pub count: usize,
    pub entries: Vec<FileEntry>,
}

/// Lists `root`, descending into subdirectories when `recursive` is set.
/// Symbolic links are reported but never followed.
pub fn list_files(root: &Path, recursive: bool) -> HandlerResult<FileListing> {
    let mut entries = Vec::new();
    if let Err(e) = collect(root, recursive, &mut entries) {
        error!(error = ?e, root = %root.display(), "Failed to list directory");
        return HandlerResult::Error(JobError::new(
            ErrorKind::FilesystemError,
            format!("cannot list {}: {e}", root.display()),
        ));
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    info!(root = %root.display(), count = entries.len(), "Listed directory");
    HandlerResult::Success(FileListing {
        root: root.to_path_buf(),
        count: entries.len(),
        entries,
    })
}

fn collect(dir: &Path, recursive: bool, out: &mut Vec<FileEntry>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();
        let size_bytes = if file_type.is_file() {
            entry.metadata()?.len()
        } else {
            0
        };
        out.push(FileEntry {
            path: path.clone(),
            is_dir: file_type.is_dir(),
            size_bytes,
        });
        if recursive && file_type.is_dir() {
            collect(&path, true, out)?;
        }
    }
    Ok(())
}
