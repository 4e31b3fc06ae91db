//! Run configuration loading.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, ensure};
use stagekit_pass::SpecRunConfig;

/// Read and parse the JSON run configuration at `path_config`.
pub fn load_run_config(path_config: &Path) -> Result<SpecRunConfig> {
    let txt = fs::read_to_string(path_config)
        .with_context(|| format!("failed to read config {}", path_config.display()))?;
    let spec_run: SpecRunConfig = serde_json::from_str(&txt)
        .with_context(|| format!("failed to parse config {}", path_config.display()))?;

    ensure!(
        !spec_run.path_dir_source.as_os_str().is_empty(),
        "config {}: `source_path` must not be empty",
        path_config.display()
    );
    ensure!(
        !spec_run.path_dir_workspace.as_os_str().is_empty(),
        "config {}: `work_path` must not be empty",
        path_config.display()
    );
    Ok(spec_run)
}
