//! Locating the files of a standalone run: one `<name>.out.txt` per data set and the newest build.

use anyhow::{Context, Result};
use judge_upload_core::config::DataSetConfig;
use judge_upload_core::validate::Solution;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const OUTPUT_SUFFIX: &str = ".out.txt";

/// Returns the entry of `builds_dir` whose file name sorts last.
pub fn latest_build(builds_dir: &Path) -> Result<PathBuf> {
    let entries = fs::read_dir(builds_dir).map_err(|e| {
        error!(error = ?e, builds_dir = %builds_dir.display(), "Failed to list builds directory");
        anyhow::anyhow!(
            "Failed to list builds directory {}: {}",
            builds_dir.display(),
            e
        )
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read entry in {}", builds_dir.display()))?;
        names.push(entry.file_name());
    }
    names.sort();

    match names.pop() {
        Some(name) => {
            let path = builds_dir.join(name);
            info!(build = %path.display(), "Selected latest build");
            Ok(path)
        }
        None => {
            error!(builds_dir = %builds_dir.display(), "Builds directory is empty");
            anyhow::bail!("No builds found in {}", builds_dir.display())
        }
    }
}

/// Output file path for `data_set` inside `outputs_dir`.
pub fn output_path(outputs_dir: &Path, data_set: &str) -> PathBuf {
    outputs_dir.join(format!("{data_set}{OUTPUT_SUFFIX}"))
}

/// The solution of a standalone run: every configured data set's output plus the latest build.
pub fn default_solution(
    data_sets: &DataSetConfig,
    outputs_dir: &Path,
    builds_dir: &Path,
) -> Result<Solution> {
    let sources = latest_build(builds_dir)?;
    let outputs = data_sets
        .names()
        .map(|name| (name.to_string(), output_path(outputs_dir, name)));
    let solution = Solution::from_paths(outputs, &sources, data_sets)?;
    debug!(?solution, "Files to upload");
    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_appends_suffix() {
        assert_eq!(
            output_path(Path::new("out"), "a_example"),
            PathBuf::from("out/a_example.out.txt")
        );
    }
}
