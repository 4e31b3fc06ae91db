//! `underscore_number`: keep only the highest-numbered file of each
//! `prefix_<n>.ext` series and rename it to `prefix_1.ext`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stagekit_io_fs::{is_extension_allowed, resolve_leaf_dirs, split_extension};
use tracing::{debug, info, warn};

use crate::registry::{Plugin, parse_plugin_config};
use crate::report::{ReportPass, ReportPassBuilder, finalize_pass, is_pass_log};
use crate::spec::{EnumFileOperation, PluginError, SpecPassContext};

const NAME_PLUGIN: &str = "UNDERSCORE_NUMBER";

////////////////////////////////////////////////////////////////////////////////
// #region SeriesModels

/// Payload of the `underscore_number` plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecSeriesConfig {
    /// Extensions to consolidate, with or without the dot. Empty = all.
    pub allowed_extensions: Vec<String>,
    /// Folders under the workspace root. Empty = run-level folders.
    pub target_folders: Vec<String>,
    /// Abort the pass once more than this many file operations failed.
    pub max_failed_operations: Option<usize>,
}

/// `quiz_3.pdf` split into its series parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSeriesName {
    /// Part before the last `_`.
    pub prefix: String,
    /// Numeric suffix.
    pub number: u64,
    /// Extension including the dot, or empty.
    pub ext: String,
}

/// Grouping key: `(prefix, ext)`.
pub type SpecSeriesKey = (String, String);

/// One series member found in a leaf directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSeriesFile {
    /// File name.
    pub name_file: String,
    /// Numeric suffix.
    pub number: u64,
    /// Full path.
    pub path_file: PathBuf,
}

/// Parse `prefix_number.ext`.
///
/// Returns `None` unless the stem has a non-empty prefix and an all-digit
/// suffix fitting `u64`.
pub fn parse_series_file_name(name_file: &str) -> Option<SpecSeriesName> {
    let (c_stem, c_ext) = split_extension(name_file);
    let (c_prefix, c_number) = c_stem.rsplit_once('_')?;
    if c_prefix.is_empty() || c_number.is_empty() {
        return None;
    }
    if !c_number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = c_number.parse::<u64>().ok()?;
    Some(SpecSeriesName {
        prefix: c_prefix.to_string(),
        number,
        ext: c_ext.to_string(),
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SeriesConsolidator

/// Plugin collapsing numbered file series.
#[derive(Debug, Clone)]
pub struct SeriesConsolidator {
    raw_config: serde_json::Value,
}

impl SeriesConsolidator {
    /// Plugin over the raw `underscore_number` payload.
    pub fn new(raw_config: serde_json::Value) -> Self {
        Self { raw_config }
    }
}

impl Plugin for SeriesConsolidator {
    fn name(&self) -> &'static str {
        NAME_PLUGIN
    }

    fn description(&self) -> &'static str {
        "Keeps the highest-numbered file of each prefix_N series and renames it to prefix_1"
    }

    fn process(&self, spec_ctx: &SpecPassContext) -> Result<ReportPass, PluginError> {
        let spec_cfg: SpecSeriesConfig = parse_plugin_config(NAME_PLUGIN, &self.raw_config)?;
        let mut builder_pass = ReportPassBuilder::new(NAME_PLUGIN);

        for path_base in spec_ctx.base_dirs(&spec_cfg.target_folders) {
            if !path_base.is_dir() {
                warn!(plugin = NAME_PLUGIN, path = %path_base.display(), "base directory missing, skipped");
                continue;
            }
            for path_leaf in resolve_leaf_dirs(&path_base, spec_ctx.depth) {
                consolidate_dir(
                    &path_leaf,
                    &spec_ctx.path_dir_workspace,
                    &spec_cfg.allowed_extensions,
                    &mut builder_pass,
                )?;
            }
        }

        info!(
            plugin = NAME_PLUGIN,
            failed = builder_pass.failed_count(),
            "series consolidation finished"
        );
        finalize_pass(
            NAME_PLUGIN,
            builder_pass,
            &spec_ctx.path_dir_workspace,
            spec_cfg.max_failed_operations,
        )
    }
}

fn collect_series(
    path_dir: &Path,
    path_dir_workspace: &Path,
) -> Result<BTreeMap<SpecSeriesKey, Vec<SpecSeriesFile>>, PluginError> {
    let to_error = |source| PluginError::Io {
        operation: "list directory",
        path: path_dir.to_path_buf(),
        source,
    };

    let mut l_entries = Vec::new();
    for entry_res in fs::read_dir(path_dir).map_err(to_error)? {
        let entry = entry_res.map_err(to_error)?;
        if entry.file_type().map_err(to_error)?.is_dir() {
            continue;
        }
        if is_pass_log(&entry.path(), path_dir_workspace) {
            continue;
        }
        l_entries.push(entry);
    }
    l_entries.sort_by_key(|entry| entry.file_name());

    let mut dict_groups: BTreeMap<SpecSeriesKey, Vec<SpecSeriesFile>> = BTreeMap::new();
    for entry in l_entries {
        let Some(name_file) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let Some(spec_name) = parse_series_file_name(&name_file) else {
            continue;
        };
        dict_groups
            .entry((spec_name.prefix, spec_name.ext))
            .or_default()
            .push(SpecSeriesFile {
                name_file,
                number: spec_name.number,
                path_file: entry.path(),
            });
    }
    Ok(dict_groups)
}

/// Max suffix wins; among equal suffixes the smallest name.
fn pick_keeper(l_files: &[SpecSeriesFile]) -> Option<usize> {
    l_files
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.number
                .cmp(&b.number)
                .then_with(|| b.name_file.cmp(&a.name_file))
        })
        .map(|(idx, _)| idx)
}

fn consolidate_dir(
    path_dir: &Path,
    path_dir_workspace: &Path,
    l_allowed_exts: &[String],
    builder_pass: &mut ReportPassBuilder,
) -> Result<(), PluginError> {
    let dict_groups = collect_series(path_dir, path_dir_workspace)?;

    for ((c_prefix, c_ext), l_files) in dict_groups {
        if !is_extension_allowed(&c_ext, l_allowed_exts) {
            debug!(dir = %path_dir.display(), ext = %c_ext, "extension not allowed, series skipped");
            continue;
        }
        let Some(idx_keeper) = pick_keeper(&l_files) else {
            continue;
        };

        for (idx, file) in l_files.iter().enumerate() {
            if idx == idx_keeper {
                continue;
            }
            match fs::remove_file(&file.path_file) {
                Ok(()) => builder_pass.add_deleted(file.path_file.clone()),
                Err(e) => builder_pass.add_failed(
                    EnumFileOperation::Delete,
                    file.path_file.clone(),
                    e.to_string(),
                ),
            }
        }

        let keeper = &l_files[idx_keeper];
        let name_target = format!("{c_prefix}_1{c_ext}");
        if keeper.name_file == name_target {
            continue;
        }
        let path_target = path_dir.join(&name_target);
        match fs::rename(&keeper.path_file, &path_target) {
            Ok(()) => builder_pass.add_renamed(keeper.path_file.clone(), path_target),
            Err(e) => builder_pass.add_failed(
                EnumFileOperation::Rename,
                keeper.path_file.clone(),
                e.to_string(),
            ),
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
