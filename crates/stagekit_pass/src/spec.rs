//! Run/plugin configuration models and pass-level error types.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stagekit_io_fs::EnumScanExtensionScope;
use thiserror::Error;

////////////////////////////////////////////////////////////////////////////////
// #region RunConfiguration

/// Top-level job description, immutable for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecRunConfig {
    /// Source tree root. Never written to.
    #[serde(rename = "source_path")]
    pub path_dir_source: PathBuf,
    /// Workspace root receiving the copy.
    #[serde(rename = "work_path")]
    pub path_dir_workspace: PathBuf,
    /// Sub-folder names under the source root that must exist.
    #[serde(default)]
    pub target_folders: Vec<String>,
    /// Traversal depth used to resolve leaf directories.
    #[serde(rename = "file_depth", default)]
    pub depth: i64,
    /// Copy only the target folders instead of the whole tree.
    #[serde(rename = "selective_copy", default)]
    pub if_selective_copy: bool,
    /// Which files feed the scan extension histogram.
    #[serde(default)]
    pub scan_extension_scope: EnumScanExtensionScope,
    /// Ordered plugin invocations.
    #[serde(rename = "plugin", default)]
    pub plugins: Vec<SpecPlugin>,
}

/// One configured plugin invocation with its opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecPlugin {
    /// Registry identifier.
    pub name: String,
    /// Plugin-owned configuration, parsed right before the plugin runs.
    #[serde(default)]
    pub config: serde_json::Value,
}

/// What a plugin gets to see of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecPassContext {
    /// Workspace root; log files are written here.
    pub path_dir_workspace: PathBuf,
    /// Run-level target folders, used when a plugin declares none.
    pub target_folders: Vec<String>,
    /// Traversal depth.
    pub depth: i64,
}

impl SpecPassContext {
    /// Context for the plugins of `spec_run`.
    pub fn from_run(spec_run: &SpecRunConfig) -> Self {
        Self {
            path_dir_workspace: spec_run.path_dir_workspace.clone(),
            target_folders: spec_run.target_folders.clone(),
            depth: spec_run.depth,
        }
    }

    /// Base directories `workspace/folder` a plugin operates under.
    ///
    /// Falls back to the run-level folders when `l_plugin_folders` is empty.
    pub fn base_dirs(&self, l_plugin_folders: &[String]) -> Vec<PathBuf> {
        let l_folders = if l_plugin_folders.is_empty() {
            &self.target_folders
        } else {
            l_plugin_folders
        };
        l_folders
            .iter()
            .map(|name_folder| join_location(&self.path_dir_workspace, name_folder))
            .collect()
    }
}

/// `path_dir/location`, or `path_dir` itself for an empty location.
pub fn join_location(path_dir: &Path, location: &str) -> PathBuf {
    if location.is_empty() {
        path_dir.to_path_buf()
    } else {
        path_dir.join(location)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region EnumsAndErrors

/// Pattern matching mode for pattern-based directory selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumPatternMode {
    /// Shell-like wildcards (`*`, `?`, character classes).
    Glob,
    /// Regular expression pattern.
    #[default]
    Regex,
    /// Substring match.
    Literal,
}

/// Kind of per-file mutation a pass attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumFileOperation {
    /// Removing a superseded file.
    Delete,
    /// Renaming a file in place.
    Rename,
    /// Moving a file into another directory.
    Move,
}

impl fmt::Display for EnumFileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_name = match self {
            Self::Delete => "DELETE",
            Self::Rename => "RENAME",
            Self::Move => "MOVE",
        };
        f.write_str(c_name)
    }
}

/// One failed per-file operation; the pass continues after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecFailedOperation {
    /// Attempted operation.
    pub operation: EnumFileOperation,
    /// File the operation was applied to.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Plugin resolution and execution failures.
#[derive(Debug, Error)]
pub enum PluginError {
    /// No factory registered under this identifier.
    #[error("unknown plugin: {name}")]
    UnknownPlugin {
        /// Requested identifier.
        name: String,
    },
    /// Plugin payload does not match the plugin's schema.
    #[error("failed to parse config of plugin {name}")]
    ConfigParse {
        /// Plugin name.
        name: &'static str,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Target directory is absent and creating it is disabled.
    #[error("target directory missing: {}", .path.display())]
    TargetDirectoryMissing {
        /// Missing target directory.
        path: PathBuf,
    },
    /// Selection pattern is missing or does not compile.
    #[error("invalid selection pattern `{pattern}`: {message}")]
    InvalidPattern {
        /// Offending pattern text.
        pattern: String,
        /// Compiler message.
        message: String,
    },
    /// More per-file failures than the configured threshold.
    #[error("plugin {name} exceeded failure threshold: {cnt_failed} failed > {n_max_failed} allowed")]
    FailureThresholdExceeded {
        /// Plugin name.
        name: &'static str,
        /// Failed operations recorded.
        cnt_failed: usize,
        /// Configured maximum.
        n_max_failed: usize,
    },
    /// Directory-level IO failure that aborts the pass.
    #[error("{operation} failed for {}", .path.display())]
    Io {
        /// Operation that triggered the failure.
        operation: &'static str,
        /// Path involved.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
