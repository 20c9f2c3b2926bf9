//! Filesystem operations
//!
//! Source discovery, modification times and output directories.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Modification time of `path`, or `None` if it does not exist
pub fn modified_time(path: &Path) -> Result<Option<SystemTime>, FilesystemError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(FilesystemError::Metadata {
                path: path.to_path_buf(),
                error: e.to_string(),
            })
        }
    };
    metadata
        .modified()
        .map(Some)
        .map_err(|e| FilesystemError::Metadata {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
}

/// List regular files directly inside `dir` whose name ends in `.{extension}`
///
/// Subdirectories are not descended into. Files named only by the suffix
/// (e.g. `.c`) are skipped. The result is sorted by file name.
pub fn list_sources(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, FilesystemError> {
    let mut sources = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| FilesystemError::ReadDir {
            path: dir.to_path_buf(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let has_stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| !s.is_empty());
        let matches = path.extension().and_then(|e| e.to_str()) == Some(extension);
        if has_stem && matches {
            sources.push(path.to_path_buf());
        }
    }

    Ok(sources)
}
