//! Scan and stage report models.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::spec::SpecTreeCounts;

/// Inventory and readiness of one source tree.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportScan {
    /// Source root exists and is a directory.
    pub if_root_exists: bool,
    /// Declared target folder name -> exists under the source root.
    pub dict_target_folders: BTreeMap<String, bool>,
    /// Directories per depth (`1..=depth`), in walk order.
    pub dict_folders_by_depth: BTreeMap<usize, Vec<PathBuf>>,
    /// Extension (with leading dot) -> file count.
    pub dict_files_by_ext: BTreeMap<String, u64>,
    /// Files that carry an extension.
    pub cnt_files_total: u64,
    /// Root and every declared target folder exist.
    pub if_ready_to_process: bool,
}

impl ReportScan {
    /// Target folders that were declared but not found.
    pub fn missing_target_folders(&self) -> Vec<&str> {
        self.dict_target_folders
            .iter()
            .filter(|(_, b_exists)| !**b_exists)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let n_dirs: usize = self.dict_folders_by_depth.values().map(Vec::len).sum();
        format!(
            "{prefix} root_exists={} ready={} folders={} files={} extensions={}",
            self.if_root_exists,
            self.if_ready_to_process,
            n_dirs,
            self.cnt_files_total,
            self.dict_files_by_ext.len()
        )
    }
}

impl fmt::Display for ReportScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SCAN]"))
    }
}

/// One source/workspace count comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecTreeVerification {
    /// Source side root.
    pub path_src: PathBuf,
    /// Workspace side root.
    pub path_dst: PathBuf,
    /// Source side counts.
    pub counts_src: SpecTreeCounts,
    /// Workspace side counts.
    pub counts_dst: SpecTreeCounts,
}

impl SpecTreeVerification {
    /// Both sides hold the same number of files and directories.
    pub fn is_match(&self) -> bool {
        self.counts_src == self.counts_dst
    }
}

/// Outcome of a successful stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportStage {
    /// Name of the copy strategy used.
    pub name_strategy: String,
    /// Selective (per target folder) copy.
    pub if_selective: bool,
    /// Verified roots, one per target folder in selective mode.
    pub l_verified: Vec<SpecTreeVerification>,
}

impl ReportStage {
    /// Files copied over all verified roots.
    pub fn cnt_files(&self) -> u64 {
        self.l_verified.iter().map(|v| v.counts_dst.cnt_files).sum()
    }

    /// Directories copied over all verified roots.
    pub fn cnt_dirs(&self) -> u64 {
        self.l_verified.iter().map(|v| v.counts_dst.cnt_dirs).sum()
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} strategy={} selective={} roots={} files={} dirs={}",
            self.name_strategy,
            self.if_selective,
            self.l_verified.len(),
            self.cnt_files(),
            self.cnt_dirs()
        )
    }
}

impl fmt::Display for ReportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[STAGE]"))
    }
}
