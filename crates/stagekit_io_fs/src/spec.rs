//! Staging specification models and top-level error types.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::report::ReportScan;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Host platform identifier used to pick a copy strategy.
///
/// Only [`EnumPlatform::current`] reads the host; everything else receives the
/// value by injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumPlatform {
    /// Linux hosts.
    Linux,
    /// macOS hosts.
    MacOs,
    /// Windows hosts.
    Windows,
    /// Any other operating system.
    Other,
}

impl EnumPlatform {
    /// Map an operating-system name (as in `std::env::consts::OS`) to a platform.
    pub fn from_os_name(name_os: &str) -> Self {
        match name_os {
            "linux" => Self::Linux,
            "macos" => Self::MacOs,
            "windows" => Self::Windows,
            _ => Self::Other,
        }
    }

    /// Platform of the running host.
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }
}

/// Which files feed the per-extension histogram of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumScanExtensionScope {
    /// Every file in the tree, regardless of depth.
    #[default]
    AllDepths,
    /// Only files located directly inside directories at the configured depth.
    TargetDepth,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// File/directory counts of one tree, root directory included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpecTreeCounts {
    /// Non-directory entries (regular files, symlinks, special files).
    pub cnt_files: u64,
    /// Directory entries.
    pub cnt_dirs: u64,
}

/// One copy failure with path + error text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}: {exception}", .path.display())]
pub struct SpecCopyError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Source validation / inventory failures.
///
/// Every variant keeps the partially filled report for diagnostics.
#[derive(Debug, Error)]
pub enum ScanTreeError {
    /// Source root is missing (or cannot be stat'ed).
    #[error("source path not found: {}", .path.display())]
    PathNotFound {
        /// Source root.
        path: PathBuf,
        /// Report built so far.
        report: Box<ReportScan>,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Source root exists but is not a directory.
    #[error("source path is not a directory: {}", .path.display())]
    NotADirectory {
        /// Source root.
        path: PathBuf,
        /// Report built so far.
        report: Box<ReportScan>,
    },
    /// The recursive inventory walk failed midway.
    #[error("failed to scan directory structure under {}", .path.display())]
    ScanFailed {
        /// Source root.
        path: PathBuf,
        /// Report built so far.
        report: Box<ReportScan>,
        /// Underlying walk error.
        #[source]
        source: walkdir::Error,
    },
}

impl ScanTreeError {
    /// Partially populated report attached to the failure.
    pub fn report(&self) -> &ReportScan {
        match self {
            Self::PathNotFound { report, .. }
            | Self::NotADirectory { report, .. }
            | Self::ScanFailed { report, .. } => report,
        }
    }
}

/// Workspace staging failures. None of them trigger cleanup.
#[derive(Debug, Error)]
pub enum StageError {
    /// Workspace already holds entries.
    #[error("work path not empty: {}", .path.display())]
    WorkspaceNotEmpty {
        /// Workspace root.
        path: PathBuf,
    },
    /// Workspace and source contain each other.
    #[error(
        "source and workspace directories overlap: {} <-> {}",
        .source_dir.display(),
        .workspace_dir.display()
    )]
    SourceWorkspaceOverlap {
        /// Normalized source directory.
        source_dir: PathBuf,
        /// Normalized workspace directory.
        workspace_dir: PathBuf,
    },
    /// Workspace directory could not be inspected or created.
    #[error("failed to initialize workspace {}: {message}", .path.display())]
    WorkspaceInitFailed {
        /// Workspace path that failed initialization.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Copy strategy failed. `folder` is set in selective mode.
    #[error("copy failed{}: {source}", fmt_folder_suffix(.folder))]
    CopyFailed {
        /// Target folder being copied, if selective.
        folder: Option<String>,
        /// Failing entry.
        #[source]
        source: SpecCopyError,
    },
    /// Post-copy count check failed.
    #[error("copy verification failed for {}: {message}", .path.display())]
    VerificationFailed {
        /// Workspace side of the failing comparison.
        path: PathBuf,
        /// Mismatch or walk failure description.
        message: String,
    },
}

fn fmt_folder_suffix(folder: &Option<String>) -> String {
    match folder {
        Some(name) => format!(" for folder `{name}`"),
        None => String::new(),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
