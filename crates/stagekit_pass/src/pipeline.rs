//! Run orchestration: scan, stage, then every configured pass in order.

use std::time::Instant;

use serde::Serialize;
use stagekit_io_fs::{
    EnumPlatform, ReportScan, ReportStage, ScanTreeError, StageError, WorkspaceStager, scan_tree,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::registry::PluginRegistry;
use crate::report::ReportPass;
use crate::spec::{PluginError, SpecPassContext, SpecRunConfig};

/// Host-side knobs that are not part of the job description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecPipelineOptions {
    /// Platform driving copy strategy selection.
    pub platform: EnumPlatform,
    /// Stop after the scan.
    pub if_scan_only: bool,
}

impl SpecPipelineOptions {
    /// Full run on `platform`.
    pub fn new(platform: EnumPlatform) -> Self {
        Self {
            platform,
            if_scan_only: false,
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRun {
    /// Source inventory.
    pub report_scan: ReportScan,
    /// Staging result; `None` when the run stopped after the scan.
    pub report_stage: Option<ReportStage>,
    /// One report per executed pass, in run order.
    pub l_passes: Vec<ReportPass>,
}

impl ReportRun {
    /// Whether staging (and therefore the passes) ran.
    pub fn is_staged(&self) -> bool {
        self.report_stage.is_some()
    }
}

/// Errors aborting a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source scan failed.
    #[error("scan failed")]
    Scan(#[from] ScanTreeError),
    /// Workspace staging failed.
    #[error("staging failed")]
    Stage(#[from] StageError),
    /// A pass could not be resolved or failed.
    #[error("plugin `{name}` failed")]
    Plugin {
        /// Configured plugin identifier.
        name: String,
        /// Underlying failure.
        #[source]
        source: PluginError,
    },
}

/// Run `spec_run` end to end.
///
/// Returns without staging when the source is not ready. Plugins are
/// resolved lazily, so passes before a failing entry have already run and
/// are not rolled back.
pub fn run_pipeline(
    spec_run: &SpecRunConfig,
    spec_opts: &SpecPipelineOptions,
    registry: &PluginRegistry,
) -> Result<ReportRun, PipelineError> {
    let t_total = Instant::now();

    let report_scan = scan_tree(
        &spec_run.path_dir_source,
        &spec_run.target_folders,
        spec_run.depth,
        spec_run.scan_extension_scope,
    )?;
    let mut report_run = ReportRun {
        report_scan,
        report_stage: None,
        l_passes: Vec::new(),
    };

    if !report_run.report_scan.if_ready_to_process {
        warn!(
            missing = ?report_run.report_scan.missing_target_folders(),
            "source not ready, nothing staged"
        );
        return Ok(report_run);
    }
    if spec_opts.if_scan_only {
        info!("scan-only run, nothing staged");
        return Ok(report_run);
    }

    let t_stage = Instant::now();
    let stager = WorkspaceStager::new(spec_opts.platform);
    let report_stage = stager.stage(
        &spec_run.path_dir_source,
        &spec_run.path_dir_workspace,
        &spec_run.target_folders,
        spec_run.if_selective_copy,
    )?;
    info!(
        strategy = stager.strategy_name(),
        elapsed_ms = t_stage.elapsed().as_millis() as u64,
        "workspace staged"
    );
    report_run.report_stage = Some(report_stage);

    let spec_ctx = SpecPassContext::from_run(spec_run);
    for spec_plugin in &spec_run.plugins {
        let to_error = |source| PipelineError::Plugin {
            name: spec_plugin.name.clone(),
            source,
        };
        let t_plugin = Instant::now();
        let plugin = registry.resolve(spec_plugin).map_err(to_error)?;
        info!(plugin = plugin.name(), "{}", plugin.description());

        let report_pass = plugin.process(&spec_ctx).map_err(to_error)?;
        info!(
            plugin = plugin.name(),
            processed = report_pass.cnt_processed,
            failed = report_pass.failed_count(),
            elapsed_ms = t_plugin.elapsed().as_millis() as u64,
            "plugin finished"
        );
        report_run.l_passes.push(report_pass);
    }

    info!(
        elapsed_ms = t_total.elapsed().as_millis() as u64,
        "run finished"
    );
    Ok(report_run)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::json;
    use stagekit_io_fs::{EnumPlatform, EnumScanExtensionScope, StageError};
    use tempfile::TempDir;

    use super::{PipelineError, SpecPipelineOptions, run_pipeline};
    use crate::registry::PluginRegistry;
    use crate::spec::{PluginError, SpecPlugin, SpecRunConfig};

    fn write_text(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(path, content).expect("write text file");
    }

    fn spec_run(path_src: &Path, path_ws: &Path, plugins: Vec<SpecPlugin>) -> SpecRunConfig {
        SpecRunConfig {
            path_dir_source: path_src.to_path_buf(),
            path_dir_workspace: path_ws.to_path_buf(),
            target_folders: vec!["math".to_string()],
            depth: 2,
            if_selective_copy: false,
            scan_extension_scope: EnumScanExtensionScope::AllDepths,
            plugins,
        }
    }

    fn opts() -> SpecPipelineOptions {
        SpecPipelineOptions::new(EnumPlatform::Windows)
    }

    fn plugin(name: &str, config: serde_json::Value) -> SpecPlugin {
        SpecPlugin {
            name: name.to_string(),
            config,
        }
    }

    #[test]
    fn full_run_stages_then_consolidates_in_workspace() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_ws = tmp.path().join("ws");
        write_text(&path_src.join("math/week1/quiz_1.pdf"), "one");
        write_text(&path_src.join("math/week1/quiz_3.pdf"), "three");

        let spec = spec_run(
            &path_src,
            &path_ws,
            vec![plugin("underscore_number", json!({"allowed_extensions": ["pdf"]}))],
        );
        let report = run_pipeline(&spec, &opts(), &PluginRegistry::with_builtin()).expect("run");

        assert!(report.is_staged());
        assert_eq!(report.l_passes.len(), 1);
        assert_eq!(report.l_passes[0].cnt_processed, 2);
        assert_eq!(
            fs::read_to_string(path_ws.join("math/week1/quiz_1.pdf")).expect("read"),
            "three"
        );
        assert!(!path_ws.join("math/week1/quiz_3.pdf").exists());
        // source untouched
        assert!(path_src.join("math/week1/quiz_1.pdf").is_file());
        assert!(path_src.join("math/week1/quiz_3.pdf").is_file());
    }

    #[test]
    fn not_ready_source_stops_before_staging() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_ws = tmp.path().join("ws");
        write_text(&path_src.join("science/a.txt"), "a");

        let spec = spec_run(&path_src, &path_ws, Vec::new());
        let report = run_pipeline(&spec, &opts(), &PluginRegistry::with_builtin()).expect("run");

        assert!(!report.report_scan.if_ready_to_process);
        assert!(!report.is_staged());
        assert!(!path_ws.exists());
    }

    #[test]
    fn scan_only_does_not_touch_workspace() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_ws = tmp.path().join("ws");
        write_text(&path_src.join("math/a.txt"), "a");

        let spec = spec_run(&path_src, &path_ws, Vec::new());
        let spec_opts = SpecPipelineOptions {
            if_scan_only: true,
            ..opts()
        };
        let report = run_pipeline(&spec, &spec_opts, &PluginRegistry::with_builtin()).expect("run");

        assert!(report.report_scan.if_ready_to_process);
        assert!(!report.is_staged());
        assert!(!path_ws.exists());
    }

    #[test]
    fn missing_source_is_a_scan_error() {
        let tmp = TempDir::new().expect("tempdir");
        let spec = spec_run(&tmp.path().join("nope"), &tmp.path().join("ws"), Vec::new());

        let err = run_pipeline(&spec, &opts(), &PluginRegistry::with_builtin())
            .expect_err("missing source");
        assert!(matches!(err, PipelineError::Scan(_)));
    }

    #[test]
    fn non_empty_workspace_aborts_staging() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_ws = tmp.path().join("ws");
        write_text(&path_src.join("math/a.txt"), "a");
        write_text(&path_ws.join("leftover.txt"), "x");

        let spec = spec_run(&path_src, &path_ws, Vec::new());
        let err = run_pipeline(&spec, &opts(), &PluginRegistry::with_builtin())
            .expect_err("non-empty workspace");
        assert!(matches!(
            err,
            PipelineError::Stage(StageError::WorkspaceNotEmpty { .. })
        ));
    }

    #[test]
    fn unknown_plugin_aborts_after_earlier_passes_ran() {
        let tmp = TempDir::new().expect("tempdir");
        let path_src = tmp.path().join("src");
        let path_ws = tmp.path().join("ws");
        write_text(&path_src.join("math/week1/quiz_2.pdf"), "two");

        let spec = spec_run(
            &path_src,
            &path_ws,
            vec![
                plugin("underscore_number", serde_json::Value::Null),
                plugin("shredder", serde_json::Value::Null),
            ],
        );
        let err = run_pipeline(&spec, &opts(), &PluginRegistry::with_builtin())
            .expect_err("unknown plugin");

        assert!(matches!(
            err,
            PipelineError::Plugin {
                ref name,
                source: PluginError::UnknownPlugin { .. },
            } if name == "shredder"
        ));
        assert!(path_ws.join("math/week1/quiz_1.pdf").is_file());
    }
}
