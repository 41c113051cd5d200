//! Writing results next to, or away from, their datasets.

use std::path::{Path, PathBuf};

use crate::DatasetError;

/// Where to put the output for `input`.
///
/// The file stem of `input` gets `suffix` appended (e.g. `iris.csv` with
/// suffix `.scag.csv` becomes `iris.scag.csv`). The result lands in
/// `output_dir` when given, else beside the input.
#[must_use]
pub fn output_path(input: &Path, output_dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "dataset".to_owned(), |s| s.to_string_lossy().into_owned());
    let name = format!("{stem}{suffix}");
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

/// Write `contents` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`DatasetError::Io`] naming the path that failed.
pub fn write_output(path: &Path, contents: &str) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DatasetError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, contents).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "output written");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::ScratchDir;

    #[test]
    fn output_beside_input() {
        let path = output_path(Path::new("data/iris.csv"), None, ".scag.csv");
        assert_eq!(path, PathBuf::from("data/iris.scag.csv"));
    }

    #[test]
    fn output_in_directory() {
        let path = output_path(Path::new("data/iris.csv"), Some(Path::new("out")), ".json");
        assert_eq!(path, PathBuf::from("out/iris.json"));
    }

    #[test]
    fn write_creates_parents() {
        let scratch = ScratchDir::new("write");
        let path = scratch.path().join("deep/er/result.csv");
        write_output(&path, "x,y\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x,y\n");
    }
}
