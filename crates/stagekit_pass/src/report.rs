//! Processing log of one pass: models, builder and log-file rendering.

use std::fmt;
use std::fmt::Write as _;
use std::fs::{File, OpenOptions};
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::spec::{EnumFileOperation, PluginError, SpecFailedOperation};

/// Original path -> new path of a rename or move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecPathChange {
    /// Path before the operation.
    pub path_from: PathBuf,
    /// Path after the operation.
    pub path_to: PathBuf,
}

/// Audit trail of one plugin run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPass {
    /// Plugin display name.
    pub name_plugin: String,
    /// Files deleted, renamed or moved.
    pub cnt_processed: u64,
    /// Candidates left alone on purpose (e.g. existing target, no overwrite).
    pub cnt_skipped: u64,
    /// Deleted files.
    pub l_deleted: Vec<PathBuf>,
    /// In-place renames.
    pub l_renamed: Vec<SpecPathChange>,
    /// Moves into another directory.
    pub l_moved: Vec<SpecPathChange>,
    /// Per-file failures; the pass continued past each of them.
    pub l_failed: Vec<SpecFailedOperation>,
    /// Written log file, if writing succeeded.
    pub path_log: Option<PathBuf>,
}

impl ReportPass {
    /// Number of failed per-file operations.
    pub fn failed_count(&self) -> usize {
        self.l_failed.len()
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} {} processed={} deleted={} renamed={} moved={} skipped={} failed={}",
            self.name_plugin,
            self.cnt_processed,
            self.l_deleted.len(),
            self.l_renamed.len(),
            self.l_moved.len(),
            self.cnt_skipped,
            self.failed_count()
        )
    }

    /// Plain-text log body.
    pub fn render_log(&self) -> String {
        let mut txt = String::new();
        let _ = writeln!(txt, "Stagekit Processing Log");
        let _ = writeln!(txt, "Plugin: {}", self.name_plugin);
        let _ = writeln!(txt, "Total files processed: {}", self.cnt_processed);

        if !self.l_deleted.is_empty() {
            let _ = writeln!(txt, "\n=== DELETED FILES ===");
            for path in &self.l_deleted {
                let _ = writeln!(txt, "DELETED: {}", path.display());
            }
        }
        if !self.l_renamed.is_empty() {
            let _ = writeln!(txt, "\n=== RENAMED FILES ===");
            for change in &self.l_renamed {
                let _ = writeln!(
                    txt,
                    "RENAMED: {} -> {}",
                    change.path_from.display(),
                    change.path_to.display()
                );
            }
        }
        if !self.l_moved.is_empty() {
            let _ = writeln!(txt, "\n=== MOVED FILES ===");
            for change in &self.l_moved {
                let _ = writeln!(
                    txt,
                    "MOVED: {} -> {}",
                    change.path_from.display(),
                    change.path_to.display()
                );
            }
        }
        if !self.l_failed.is_empty() {
            let _ = writeln!(txt, "\n=== FAILED OPERATIONS ===");
            for failed in &self.l_failed {
                let _ = writeln!(
                    txt,
                    "FAILED: {} {} ({})",
                    failed.operation,
                    failed.path.display(),
                    failed.exception
                );
            }
        }
        txt
    }
}

impl fmt::Display for ReportPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[PASS]"))
    }
}

/// Mutable accumulator owned by exactly one running pass.
#[derive(Debug, Default, Clone)]
pub struct ReportPassBuilder {
    report: ReportPass,
}

impl ReportPassBuilder {
    /// Empty builder for plugin `name_plugin`.
    pub fn new(name_plugin: &str) -> Self {
        Self {
            report: ReportPass {
                name_plugin: name_plugin.to_string(),
                ..ReportPass::default()
            },
        }
    }

    /// Record a deleted file.
    pub fn add_deleted(&mut self, path: PathBuf) {
        self.report.l_deleted.push(path);
        self.report.cnt_processed += 1;
    }

    /// Record an in-place rename.
    pub fn add_renamed(&mut self, path_from: PathBuf, path_to: PathBuf) {
        self.report.l_renamed.push(SpecPathChange { path_from, path_to });
        self.report.cnt_processed += 1;
    }

    /// Record a move into another directory.
    pub fn add_moved(&mut self, path_from: PathBuf, path_to: PathBuf) {
        self.report.l_moved.push(SpecPathChange { path_from, path_to });
        self.report.cnt_processed += 1;
    }

    /// Record a deliberately skipped candidate.
    pub fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    /// Record a failed per-file operation.
    pub fn add_failed(&mut self, operation: EnumFileOperation, path: PathBuf, exception: String) {
        warn!(%operation, path = %path.display(), error = %exception, "file operation failed");
        self.report.l_failed.push(SpecFailedOperation {
            operation,
            path,
            exception,
        });
    }

    /// Number of failures recorded so far.
    pub fn failed_count(&self) -> usize {
        self.report.l_failed.len()
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportPass {
        self.report
    }
}

/// Write `report_pass` as `<plugin>_log_<timestamp>.txt` inside `path_dir`.
///
/// An existing file with the same name is never overwritten; a numeric
/// suffix is appended instead.
pub fn write_pass_log(
    report_pass: &ReportPass,
    path_dir: &Path,
    c_timestamp: &str,
) -> io::Result<PathBuf> {
    let c_stem = format!(
        "{}_log_{c_timestamp}",
        report_pass.name_plugin.to_lowercase()
    );

    let mut n_attempt = 1;
    loop {
        let name_file = if n_attempt == 1 {
            format!("{c_stem}.txt")
        } else {
            format!("{c_stem}_{n_attempt}.txt")
        };
        let path_log = path_dir.join(name_file);
        match OpenOptions::new().write(true).create_new(true).open(&path_log) {
            Ok(mut file) => {
                write_all(&mut file, &report_pass.render_log())?;
                return Ok(path_log);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n_attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Whether `path_file` is a pass log written by [`write_pass_log`] into
/// `path_dir_workspace`: `<plugin>_log_<YYYYMMDD>_<HHMMSS>[_<n>].txt`.
///
/// Passes rooted at the workspace skip these files.
pub fn is_pass_log(path_file: &Path, path_dir_workspace: &Path) -> bool {
    if path_file.parent() != Some(path_dir_workspace) {
        return false;
    }
    let Some(name_file) = path_file.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let Some(c_stem) = name_file.strip_suffix(".txt") else {
        return false;
    };
    let Some((c_plugin, c_stamp)) = c_stem.rsplit_once("_log_") else {
        return false;
    };
    let is_digits = |part: &str, n_len: Option<usize>| {
        !part.is_empty()
            && part.bytes().all(|b| b.is_ascii_digit())
            && n_len.is_none_or(|n| part.len() == n)
    };
    let l_parts: Vec<&str> = c_stamp.split('_').collect();
    !c_plugin.is_empty()
        && matches!(l_parts.len(), 2 | 3)
        && is_digits(l_parts[0], Some(8))
        && is_digits(l_parts[1], Some(6))
        && l_parts.get(2).is_none_or(|part| is_digits(*part, None))
}

fn write_all(file: &mut File, txt: &str) -> io::Result<()> {
    file.write_all(txt.as_bytes())?;
    file.flush()
}

/// Close a pass: write its log, then enforce the failure threshold.
///
/// Log-write failure only warns.
pub(crate) fn finalize_pass(
    name_plugin: &'static str,
    builder_pass: ReportPassBuilder,
    path_dir_workspace: &Path,
    n_max_failed: Option<usize>,
) -> Result<ReportPass, PluginError> {
    let mut report_pass = builder_pass.build();
    let c_timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

    match write_pass_log(&report_pass, path_dir_workspace, &c_timestamp) {
        Ok(path_log) => {
            info!(plugin = name_plugin, path = %path_log.display(), "log file created");
            report_pass.path_log = Some(path_log);
        }
        Err(e) => {
            warn!(plugin = name_plugin, error = %e, "failed to write log file");
        }
    }

    if let Some(n_max) = n_max_failed
        && report_pass.failed_count() > n_max
    {
        return Err(PluginError::FailureThresholdExceeded {
            name: name_plugin,
            cnt_failed: report_pass.failed_count(),
            n_max_failed: n_max,
        });
    }
    Ok(report_pass)
}
