//! Source tree validation and inventory.

use std::fs;
use std::path::Path;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::report::ReportScan;
use crate::spec::{EnumScanExtensionScope, ScanTreeError};
use crate::util::split_extension;

/// Validate `path_source` and build its inventory report.
///
/// Readiness only depends on the root and the declared target folders; the
/// depth and extension statistics are informational. Every error carries the
/// report built up to the failure point.
pub fn scan_tree<P: AsRef<Path>>(
    path_source: P,
    target_folders: &[String],
    depth: i64,
    rule_ext_scope: EnumScanExtensionScope,
) -> Result<ReportScan, ScanTreeError> {
    let path_source = path_source.as_ref();
    let mut report_scan = ReportScan::default();

    let meta_source = match fs::metadata(path_source) {
        Ok(v) => v,
        Err(e) => {
            return Err(ScanTreeError::PathNotFound {
                path: path_source.to_path_buf(),
                report: Box::new(report_scan),
                source: e,
            });
        }
    };
    if !meta_source.is_dir() {
        return Err(ScanTreeError::NotADirectory {
            path: path_source.to_path_buf(),
            report: Box::new(report_scan),
        });
    }
    report_scan.if_root_exists = true;

    for name_folder in target_folders {
        let b_exists = path_source.join(name_folder).exists();
        if !b_exists {
            debug!(folder = %name_folder, "declared target folder is missing");
        }
        report_scan
            .dict_target_folders
            .insert(name_folder.clone(), b_exists);
    }
    report_scan.if_ready_to_process = report_scan.dict_target_folders.values().all(|b| *b);

    let n_depth_max = usize::try_from(depth).unwrap_or(0);
    // Files whose parent sits at `depth`; root files when depth <= 0.
    let n_depth_file = n_depth_max + 1;

    for entry_res in WalkDir::new(path_source).sort_by_file_name() {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                return Err(ScanTreeError::ScanFailed {
                    path: path_source.to_path_buf(),
                    report: Box::new(report_scan),
                    source: e,
                });
            }
        };

        let n_depth = entry.depth();
        if entry.file_type().is_dir() {
            if n_depth > 0 && n_depth <= n_depth_max {
                report_scan
                    .dict_folders_by_depth
                    .entry(n_depth)
                    .or_default()
                    .push(entry.into_path());
            }
            continue;
        }

        if rule_ext_scope == EnumScanExtensionScope::TargetDepth && n_depth != n_depth_file {
            continue;
        }
        let c_name = entry.file_name().to_string_lossy();
        let (_, c_ext) = split_extension(&c_name);
        if c_ext.is_empty() {
            continue;
        }
        *report_scan
            .dict_files_by_ext
            .entry(c_ext.to_string())
            .or_insert(0) += 1;
        report_scan.cnt_files_total += 1;
    }

    info!(
        path = %path_source.display(),
        ready = report_scan.if_ready_to_process,
        files = report_scan.cnt_files_total,
        "source scan finished"
    );
    Ok(report_scan)
}
