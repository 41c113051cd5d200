//! scag-io: Filesystem I/O for scagnostics.
//!
//! Finds dataset files, parses delimited text into
//! [`Dataset`](scag_pipeline::Dataset)s, and writes serialized results.
//! All computation lives in `scag-pipeline`; all formatting in
//! `scag-export`.

use std::path::{Path, PathBuf};

use scag_pipeline::Dataset;

pub mod discover;
pub mod output;
pub mod parse;

pub use discover::{DEFAULT_EXTENSION, discover, scan_directory};
pub use output::{output_path, write_output};
pub use parse::{Separator, parse_dataset};

/// Errors from reading or writing dataset files.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// A filesystem operation failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An input path does not exist.
    #[error("{}: no such file or directory", .0.display())]
    NotFound(PathBuf),

    /// The text holds no label record.
    #[error("dataset has no header line")]
    NoHeader,

    /// A record has a different number of fields than the header.
    #[error("line {line}: expected {expected} fields, found {found}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A field is neither a number nor a missing-value token.
    #[error("line {line}, column {column}: not a number: {token:?}")]
    NonNumeric {
        line: usize,
        column: usize,
        token: String,
    },
}

/// Read and parse one dataset file.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] if the file cannot be read, or any
/// [`parse_dataset`] error.
pub fn read_dataset(path: &Path) -> Result<Dataset, DatasetError> {
    let text = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_dataset(&text)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    /// A fresh directory under the system temp dir, removed on drop.
    pub struct ScratchDir(PathBuf);

    impl ScratchDir {
        #[allow(clippy::unwrap_used)]
        pub fn new(name: &str) -> Self {
            let n = NEXT.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "scag-io-{}-{name}-{n}",
                std::process::id()
            ));
            let _ = std::fs::remove_dir_all(&path);
            std::fs::create_dir_all(&path).unwrap();
            Self(path)
        }

        pub fn path(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for ScratchDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }
}
