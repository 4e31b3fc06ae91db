//! `file_relocator`: move matching files of every leaf directory into a
//! target sub-directory of that leaf.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stagekit_io_fs::{is_extension_allowed, split_extension};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::registry::{Plugin, parse_plugin_config};
use crate::report::{ReportPass, ReportPassBuilder, finalize_pass, is_pass_log};
use crate::select::{EnumDirSelection, TypePatternMatcher};
use crate::spec::{
    EnumFileOperation, EnumPatternMode, PluginError, SpecPassContext, join_location,
};

const NAME_PLUGIN: &str = "FILE_RELOCATOR";

/// Payload of the `file_relocator` plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecRelocatorConfig {
    /// Extensions to move, with or without the dot. Empty = all.
    pub file_extensions: Vec<String>,
    /// Directory pattern, required when `use_pattern` is set.
    pub file_pattern: Option<String>,
    /// How `file_pattern` is interpreted.
    pub pattern_mode: EnumPatternMode,
    /// Sub-path of each leaf holding the candidates. Empty = the leaf.
    pub source_location: String,
    /// Sub-path of each leaf receiving the files.
    pub target_location: String,
    /// Create a missing target directory instead of failing.
    pub create_folder: bool,
    /// Also pick up files below the source directory.
    pub search_subdirs: bool,
    /// Replace same-name files at the target.
    pub overwrite_files: bool,
    /// Folders under the workspace root. Empty = run-level folders.
    pub target_folders: Vec<String>,
    /// Select leaves by `file_pattern` instead of by depth.
    pub use_pattern: bool,
    /// Abort the pass once more than this many moves failed.
    pub max_failed_operations: Option<usize>,
}

impl SpecRelocatorConfig {
    fn dir_selection(&self, depth: i64) -> Result<EnumDirSelection, PluginError> {
        if !self.use_pattern {
            return Ok(EnumDirSelection::Depth(depth));
        }
        let pattern = self.file_pattern.as_deref().unwrap_or_default();
        let matcher = TypePatternMatcher::compile(pattern, self.pattern_mode)?;
        Ok(EnumDirSelection::Pattern(matcher))
    }
}

/// Plugin moving files into a per-leaf target directory.
#[derive(Debug, Clone)]
pub struct Relocator {
    raw_config: serde_json::Value,
}

impl Relocator {
    /// Plugin over the raw `file_relocator` payload.
    pub fn new(raw_config: serde_json::Value) -> Self {
        Self { raw_config }
    }
}

impl Plugin for Relocator {
    fn name(&self) -> &'static str {
        NAME_PLUGIN
    }

    fn description(&self) -> &'static str {
        "Moves selected files into a target folder; leaves chosen by depth or by directory pattern"
    }

    fn process(&self, spec_ctx: &SpecPassContext) -> Result<ReportPass, PluginError> {
        let spec_cfg: SpecRelocatorConfig = parse_plugin_config(NAME_PLUGIN, &self.raw_config)?;
        let rule_selection = spec_cfg.dir_selection(spec_ctx.depth)?;
        let mut builder_pass = ReportPassBuilder::new(NAME_PLUGIN);

        for path_base in spec_ctx.base_dirs(&spec_cfg.target_folders) {
            if !path_base.is_dir() {
                warn!(plugin = NAME_PLUGIN, path = %path_base.display(), "base directory missing, skipped");
                continue;
            }
            for path_leaf in rule_selection.resolve(&path_base) {
                relocate_dir(
                    &path_leaf,
                    &spec_ctx.path_dir_workspace,
                    &spec_cfg,
                    &mut builder_pass,
                )?;
            }
        }

        info!(
            plugin = NAME_PLUGIN,
            failed = builder_pass.failed_count(),
            "relocation finished"
        );
        finalize_pass(
            NAME_PLUGIN,
            builder_pass,
            &spec_ctx.path_dir_workspace,
            spec_cfg.max_failed_operations,
        )
    }
}

/// Files under `path_source`, sorted; never descends into `path_target`.
fn collect_candidates(
    path_source: &Path,
    path_target: &Path,
    if_recursive: bool,
) -> Result<Vec<PathBuf>, PluginError> {
    let n_max_depth = if if_recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(path_source)
        .min_depth(1)
        .max_depth(n_max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.path() != path_target);

    let mut l_files = Vec::new();
    for entry_res in walker {
        let entry = entry_res.map_err(|e| {
            let path = e.path().unwrap_or(path_source).to_path_buf();
            PluginError::Io {
                operation: "list directory",
                path,
                source: e.into(),
            }
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        l_files.push(entry.into_path());
    }
    l_files.sort();
    Ok(l_files)
}

fn ensure_target_dir(path_target: &Path, if_create: bool) -> Result<(), PluginError> {
    if path_target.is_dir() {
        return Ok(());
    }
    if !if_create {
        return Err(PluginError::TargetDirectoryMissing {
            path: path_target.to_path_buf(),
        });
    }
    fs::create_dir_all(path_target).map_err(|source| PluginError::Io {
        operation: "create target directory",
        path: path_target.to_path_buf(),
        source,
    })
}

fn relocate_dir(
    path_leaf: &Path,
    path_dir_workspace: &Path,
    spec_cfg: &SpecRelocatorConfig,
    builder_pass: &mut ReportPassBuilder,
) -> Result<(), PluginError> {
    let path_source = join_location(path_leaf, &spec_cfg.source_location);
    if !path_source.is_dir() {
        debug!(path = %path_source.display(), "source location missing, leaf skipped");
        return Ok(());
    }
    let path_target = join_location(path_leaf, &spec_cfg.target_location);

    let l_candidates: Vec<PathBuf> =
        collect_candidates(&path_source, &path_target, spec_cfg.search_subdirs)?
            .into_iter()
            .filter(|path_file| path_file.parent() != Some(path_target.as_path()))
            .filter(|path_file| !is_pass_log(path_file, path_dir_workspace))
            .filter(|path_file| {
                let c_name = path_file
                    .file_name()
                    .map(|name| name.to_string_lossy())
                    .unwrap_or_default();
                let (_, c_ext) = split_extension(&c_name);
                is_extension_allowed(c_ext, &spec_cfg.file_extensions)
            })
            .collect();
    if l_candidates.is_empty() {
        return Ok(());
    }

    ensure_target_dir(&path_target, spec_cfg.create_folder)?;

    for path_file in l_candidates {
        let Some(name_file) = path_file.file_name() else {
            continue;
        };
        let path_dst = path_target.join(name_file);
        if path_dst.exists() && !spec_cfg.overwrite_files {
            debug!(path = %path_dst.display(), "target file exists, skipped");
            builder_pass.add_skipped();
            continue;
        }
        match fs::rename(&path_file, &path_dst) {
            Ok(()) => builder_pass.add_moved(path_file, path_dst),
            Err(e) => builder_pass.add_failed(EnumFileOperation::Move, path_file, e.to_string()),
        }
    }
    Ok(())
}
