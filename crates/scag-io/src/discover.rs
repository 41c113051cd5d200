//! Dataset discovery on the filesystem.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::DatasetError;

/// Extension scanned for when none is given.
pub const DEFAULT_EXTENSION: &str = "csv";

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// List the dataset files in `dir` with the given extension, sorted by
/// file name. Subdirectories are not descended into.
///
/// `extension` may be given with or without its leading dot.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the directory cannot be read.
pub fn scan_directory(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let extension = extension.trim_start_matches('.');
    let entries = std::fs::read_dir(dir).map_err(|source| DatasetError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| DatasetError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.is_file() && has_extension(&path, extension) {
            files.push(path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    tracing::debug!(dir = %dir.display(), count = files.len(), "scanned for datasets");
    Ok(files)
}

/// Expand command-line inputs into dataset files.
///
/// Files are kept as given, in order; each directory is replaced by its
/// [`scan_directory`] listing.
///
/// # Errors
///
/// Returns [`DatasetError::NotFound`] for an input that does not exist
/// and propagates directory read failures.
pub fn discover(inputs: &[PathBuf], extension: &str) -> Result<Vec<PathBuf>, DatasetError> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            files.extend(scan_directory(input, extension)?);
        } else if input.is_file() {
            files.push(input.clone());
        } else {
            return Err(DatasetError::NotFound(input.clone()));
        }
    }
    Ok(files)
}
