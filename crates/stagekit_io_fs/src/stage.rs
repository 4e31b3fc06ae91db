//! Workspace staging: copy the source into an empty workspace and verify it.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::copy::{CopyStrategy, select_copy_strategy};
use crate::report::{ReportStage, SpecTreeVerification};
use crate::spec::{EnumPlatform, StageError};
use crate::util::{count_tree, is_dir_empty, is_overlap};

/// Copies a source tree into an isolated workspace.
#[derive(Debug)]
pub struct WorkspaceStager {
    strategy: Box<dyn CopyStrategy>,
}

impl WorkspaceStager {
    /// Stager using the copy strategy appropriate for `platform`.
    pub fn new(platform: EnumPlatform) -> Self {
        Self::with_strategy(select_copy_strategy(platform))
    }

    /// Stager with an explicit copy strategy.
    pub fn with_strategy(strategy: Box<dyn CopyStrategy>) -> Self {
        Self { strategy }
    }

    /// Name of the active copy strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Stage `path_source` into `path_workspace`.
    ///
    /// Full mode copies the whole source; selective mode copies each
    /// `source/folder` into `workspace/folder`. The workspace must be absent or
    /// empty. Verification compares file/directory counts per copied root.
    pub fn stage<P, Q>(
        &self,
        path_source: P,
        path_workspace: Q,
        target_folders: &[String],
        if_selective: bool,
    ) -> Result<ReportStage, StageError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let path_source = path_source.as_ref();
        let path_workspace = path_workspace.as_ref();

        self.prepare_workspace(path_source, path_workspace)?;

        let mut l_roots = Vec::new();
        if if_selective {
            for name_folder in target_folders {
                let path_src_sub = path_source.join(name_folder);
                let path_dst_sub = path_workspace.join(name_folder);
                debug!(folder = %name_folder, "staging target folder");

                self.copy_root(&path_src_sub, &path_dst_sub)
                    .map_err(|e| match e {
                        StageError::CopyFailed { source, .. } => StageError::CopyFailed {
                            folder: Some(name_folder.clone()),
                            source,
                        },
                        other => other,
                    })?;
                l_roots.push((path_src_sub, path_dst_sub));
            }
        } else {
            self.copy_root(path_source, path_workspace)?;
            l_roots.push((path_source.to_path_buf(), path_workspace.to_path_buf()));
        }

        let mut l_verified = Vec::with_capacity(l_roots.len());
        for (path_src_root, path_dst_root) in l_roots {
            l_verified.push(verify_copy(&path_src_root, &path_dst_root)?);
        }

        let report_stage = ReportStage {
            name_strategy: self.strategy.name().to_string(),
            if_selective,
            l_verified,
        };
        info!(
            workspace = %path_workspace.display(),
            strategy = self.strategy.name(),
            files = report_stage.cnt_files(),
            dirs = report_stage.cnt_dirs(),
            "workspace staged and verified"
        );
        Ok(report_stage)
    }

    fn prepare_workspace(&self, path_source: &Path, path_workspace: &Path) -> Result<(), StageError> {
        let b_is_empty = is_dir_empty(path_workspace).map_err(|e| StageError::WorkspaceInitFailed {
            path: path_workspace.to_path_buf(),
            message: e.to_string(),
        })?;
        if !b_is_empty {
            return Err(StageError::WorkspaceNotEmpty {
                path: path_workspace.to_path_buf(),
            });
        }
        if is_overlap(path_source, path_workspace) {
            return Err(StageError::SourceWorkspaceOverlap {
                source_dir: path_source.to_path_buf(),
                workspace_dir: path_workspace.to_path_buf(),
            });
        }
        fs::create_dir_all(path_workspace).map_err(|e| StageError::WorkspaceInitFailed {
            path: path_workspace.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn copy_root(&self, path_src_root: &Path, path_dst_root: &Path) -> Result<(), StageError> {
        fs::create_dir_all(path_dst_root).map_err(|e| StageError::WorkspaceInitFailed {
            path: path_dst_root.to_path_buf(),
            message: e.to_string(),
        })?;
        self.strategy
            .copy_dir_contents(path_src_root, path_dst_root)
            .map_err(|source| StageError::CopyFailed {
                folder: None,
                source,
            })
    }
}

/// Compare file/directory counts of a source root and its workspace copy.
///
/// Counts only; contents and sizes are not compared.
pub fn verify_copy(
    path_src_root: &Path,
    path_dst_root: &Path,
) -> Result<SpecTreeVerification, StageError> {
    let to_stage_error = |path: &Path, e: walkdir::Error| StageError::VerificationFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let counts_src = count_tree(path_src_root).map_err(|e| to_stage_error(path_src_root, e))?;
    let counts_dst = count_tree(path_dst_root).map_err(|e| to_stage_error(path_dst_root, e))?;
    let verification = SpecTreeVerification {
        path_src: path_src_root.to_path_buf(),
        path_dst: path_dst_root.to_path_buf(),
        counts_src,
        counts_dst,
    };
    if !verification.is_match() {
        return Err(StageError::VerificationFailed {
            path: path_dst_root.to_path_buf(),
            message: format!(
                "source has {} files / {} dirs, workspace has {} files / {} dirs",
                counts_src.cnt_files, counts_src.cnt_dirs, counts_dst.cnt_files, counts_dst.cnt_dirs
            ),
        });
    }
    Ok(verification)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::{WorkspaceStager, verify_copy};
    use crate::copy::{CopyStrategy, ManualWalkCopy};
    use crate::spec::{EnumPlatform, SpecCopyError, StageError};

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn build_tree(root: &Path) {
        write_text(&root.join("math/week1/quiz_1.pdf"), "q1");
        write_text(&root.join("math/week2/quiz_3.pdf"), "q3");
        write_text(&root.join("science/lab.txt"), "lab");
        write_text(&root.join("other/skip.txt"), "skip");
    }

    fn targets() -> Vec<String> {
        vec!["math".to_string(), "science".to_string()]
    }

    /// Copies nothing, so verification has something to catch.
    #[derive(Debug)]
    struct NoopCopy;

    impl CopyStrategy for NoopCopy {
        fn name(&self) -> &'static str {
            "noop"
        }

        fn copy_dir_contents(&self, _: &Path, _: &Path) -> Result<(), SpecCopyError> {
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingCopy;

    impl CopyStrategy for FailingCopy {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn copy_dir_contents(&self, src: &Path, _: &Path) -> Result<(), SpecCopyError> {
            Err(SpecCopyError {
                path: src.to_path_buf(),
                exception: "boom".to_string(),
            })
        }
    }

    /// Copies everything, then loses one file of the `science` folder.
    #[derive(Debug)]
    struct LossyScienceCopy;

    impl CopyStrategy for LossyScienceCopy {
        fn name(&self) -> &'static str {
            "lossy_science"
        }

        fn copy_dir_contents(&self, src: &Path, dst: &Path) -> Result<(), SpecCopyError> {
            ManualWalkCopy.copy_dir_contents(src, dst)?;
            if dst.ends_with("science") {
                std::fs::remove_file(dst.join("lab.txt")).expect("drop copied file");
            }
            Ok(())
        }
    }

    #[test]
    fn stage_full_copy_with_manual_walk() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("nested/ws");
        build_tree(&src);

        let stager = WorkspaceStager::new(EnumPlatform::Windows);
        let report = stager.stage(&src, &ws, &targets(), false).expect("stage");

        assert_eq!(report.name_strategy, "manual_walk");
        assert_eq!(report.l_verified.len(), 1);
        assert_eq!(report.cnt_files(), 4);
        assert!(ws.join("other/skip.txt").exists());
        assert_eq!(
            std::fs::read_to_string(ws.join("math/week2/quiz_3.pdf")).expect("read"),
            "q3"
        );
        // Source untouched.
        assert!(src.join("math/week1/quiz_1.pdf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn stage_full_copy_with_native_command() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("ws");
        build_tree(&src);

        let stager = WorkspaceStager::new(EnumPlatform::Linux);
        let report = stager.stage(&src, &ws, &targets(), false).expect("stage");
        assert_eq!(report.name_strategy, "native_command");
        assert!(report.l_verified[0].is_match());
        assert!(ws.join("science/lab.txt").exists());
        assert!(!ws.join("src").exists());
    }

    #[test]
    fn stage_selective_copies_only_target_folders() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("ws");
        build_tree(&src);

        let stager = WorkspaceStager::new(EnumPlatform::Other);
        let report = stager.stage(&src, &ws, &targets(), true).expect("stage");

        assert!(report.if_selective);
        assert_eq!(report.l_verified.len(), 2);
        assert_eq!(report.l_verified[0].path_dst, ws.join("math"));
        assert!(ws.join("math/week1/quiz_1.pdf").exists());
        assert!(ws.join("science/lab.txt").exists());
        assert!(!ws.join("other").exists());
    }

    #[test]
    fn stage_refuses_non_empty_workspace() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("ws");
        build_tree(&src);
        write_text(&ws.join("leftover.txt"), "x");

        let stager = WorkspaceStager::new(EnumPlatform::Windows);
        let err = stager.stage(&src, &ws, &targets(), false).expect_err("must fail");
        assert!(matches!(err, StageError::WorkspaceNotEmpty { .. }));
        assert!(!ws.join("math").exists());
    }

    #[test]
    fn stage_accepts_existing_empty_workspace() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("ws");
        build_tree(&src);
        std::fs::create_dir_all(&ws).expect("mkdir ws");

        let stager = WorkspaceStager::new(EnumPlatform::Windows);
        stager.stage(&src, &ws, &targets(), false).expect("stage");
        assert!(ws.join("math/week1/quiz_1.pdf").exists());
    }

    #[test]
    fn stage_refuses_workspace_inside_source() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        build_tree(&src);

        let stager = WorkspaceStager::new(EnumPlatform::Windows);
        let err = stager
            .stage(&src, src.join("ws"), &targets(), false)
            .expect_err("must fail");
        assert!(matches!(err, StageError::SourceWorkspaceOverlap { .. }));
        assert!(!src.join("ws").exists());
    }

    #[test]
    fn stage_selective_failure_names_folder() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("ws");
        build_tree(&src);

        let stager = WorkspaceStager::with_strategy(Box::new(FailingCopy));
        let err = stager.stage(&src, &ws, &targets(), true).expect_err("must fail");
        match err {
            StageError::CopyFailed { folder, source } => {
                assert_eq!(folder.as_deref(), Some("math"));
                assert_eq!(source.exception, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stage_detects_count_mismatch() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("ws");
        build_tree(&src);

        let stager = WorkspaceStager::with_strategy(Box::new(NoopCopy));
        let err = stager.stage(&src, &ws, &targets(), false).expect_err("must fail");
        assert!(matches!(err, StageError::VerificationFailed { .. }));
    }

    #[test]
    fn stage_selective_fails_when_one_folder_mismatches() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let ws = tmp.path().join("ws");
        build_tree(&src);

        let stager = WorkspaceStager::with_strategy(Box::new(LossyScienceCopy));
        let err = stager.stage(&src, &ws, &targets(), true).expect_err("must fail");
        match err {
            StageError::VerificationFailed { path, .. } => assert_eq!(path, ws.join("science")),
            other => panic!("unexpected error: {other}"),
        }
        // The intact folder was copied in full before verification.
        assert!(ws.join("math/week2/quiz_3.pdf").exists());
    }

    #[test]
    fn verify_copy_ignores_content_differences() {
        let tmp = TempDir::new().expect("tempdir");
        write_text(&tmp.path().join("a/x.txt"), "original");
        write_text(&tmp.path().join("b/x.txt"), "changed bytes");

        let verification =
            verify_copy(&tmp.path().join("a"), &tmp.path().join("b")).expect("verify");
        assert!(verification.is_match());
    }
}
