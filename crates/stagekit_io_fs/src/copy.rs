//! Directory-content copy strategies.
//!
//! Both strategies copy the *contents* of `dir_source` into an existing
//! `dir_destination`; they never nest the source directory one level deeper.

use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

use tracing::{debug, warn};

use crate::spec::{EnumPlatform, SpecCopyError};
use crate::util::{copy_file_with_metadata, create_symbolic_link};

/// A way of copying one directory's contents into another.
pub trait CopyStrategy: std::fmt::Debug {
    /// Short identifier used in reports.
    fn name(&self) -> &'static str;

    /// Copy everything below `dir_source` into `dir_destination`.
    ///
    /// Stops at the first failing entry.
    fn copy_dir_contents(&self, dir_source: &Path, dir_destination: &Path)
    -> Result<(), SpecCopyError>;
}

/// Pick the copy strategy for `platform`.
///
/// Linux and macOS delegate to the native `cp`; everything else walks the tree.
pub fn select_copy_strategy(platform: EnumPlatform) -> Box<dyn CopyStrategy> {
    match platform {
        EnumPlatform::Linux | EnumPlatform::MacOs => Box::new(NativeCommandCopy),
        EnumPlatform::Windows | EnumPlatform::Other => Box::new(ManualWalkCopy),
    }
}

////////////////////////////////////////////////////////////////////////////////
// #region NativeCommand

/// Delegates to `cp -R <src>/. <dst>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCommandCopy;

impl CopyStrategy for NativeCommandCopy {
    fn name(&self) -> &'static str {
        "native_command"
    }

    fn copy_dir_contents(
        &self,
        dir_source: &Path,
        dir_destination: &Path,
    ) -> Result<(), SpecCopyError> {
        let path_src_contents = dir_source.join(".");
        debug!(
            src = %path_src_contents.display(),
            dst = %dir_destination.display(),
            "running cp -R"
        );

        let output = Command::new("cp")
            .arg("-R")
            .arg(&path_src_contents)
            .arg(dir_destination)
            .output()
            .map_err(|e| SpecCopyError {
                path: dir_source.to_path_buf(),
                exception: format!("failed to spawn cp: {e}"),
            })?;

        if !output.status.success() {
            return Err(SpecCopyError {
                path: dir_source.to_path_buf(),
                exception: format!(
                    "cp command failed ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ManualWalk

/// Recursive walk: re-creates each directory and streams each file.
///
/// Symlinks are re-created as links, never followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualWalkCopy;

impl CopyStrategy for ManualWalkCopy {
    fn name(&self) -> &'static str {
        "manual_walk"
    }

    fn copy_dir_contents(
        &self,
        dir_source: &Path,
        dir_destination: &Path,
    ) -> Result<(), SpecCopyError> {
        walk_directory(dir_source, dir_destination)
    }
}

fn map_err(path: &Path) -> impl FnOnce(io::Error) -> SpecCopyError {
    let path = path.to_path_buf();
    move |e| SpecCopyError {
        path,
        exception: e.to_string(),
    }
}

fn walk_directory(path_dir_src: &Path, path_dir_dst: &Path) -> Result<(), SpecCopyError> {
    let mut l_entries = fs::read_dir(path_dir_src)
        .map_err(map_err(path_dir_src))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_err(path_dir_src))?;
    l_entries.sort_by_key(|entry| entry.file_name());

    for entry in l_entries {
        let path_entry_src = entry.path();
        let path_entry_dst = path_dir_dst.join(entry.file_name());
        let cfg_file_type = entry.file_type().map_err(map_err(&path_entry_src))?;

        if cfg_file_type.is_symlink() {
            create_symbolic_link(&path_entry_src, &path_entry_dst)
                .map_err(map_err(&path_entry_dst))?;
        } else if cfg_file_type.is_dir() {
            fs::create_dir_all(&path_entry_dst).map_err(map_err(&path_entry_dst))?;
            walk_directory(&path_entry_src, &path_entry_dst)?;
        } else if cfg_file_type.is_file() {
            copy_file_with_metadata(&path_entry_src, &path_entry_dst)
                .map_err(map_err(&path_entry_dst))?;
        } else {
            warn!(path = %path_entry_src.display(), "special file skipped");
        }
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::{CopyStrategy, ManualWalkCopy, NativeCommandCopy, select_copy_strategy};
    use crate::spec::EnumPlatform;

    fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }

    fn build_tree(root: &Path) {
        write_text(&root.join("root.txt"), "root");
        write_text(&root.join("a/file1.txt"), "a");
        write_text(&root.join("b/sub/file2.txt"), "b");
        std::fs::create_dir_all(root.join("empty")).expect("mkdir empty");
    }

    fn assert_copied(dst: &Path) {
        assert_eq!(std::fs::read_to_string(dst.join("root.txt")).expect("read"), "root");
        assert_eq!(std::fs::read_to_string(dst.join("a/file1.txt")).expect("read"), "a");
        assert_eq!(
            std::fs::read_to_string(dst.join("b/sub/file2.txt")).expect("read"),
            "b"
        );
        assert!(dst.join("empty").is_dir());
        // Contents land directly in dst, not under dst/src.
        assert!(!dst.join("src").exists());
    }

    #[test]
    fn strategy_selection_is_pure_function_of_platform() {
        assert_eq!(select_copy_strategy(EnumPlatform::Linux).name(), "native_command");
        assert_eq!(select_copy_strategy(EnumPlatform::MacOs).name(), "native_command");
        assert_eq!(select_copy_strategy(EnumPlatform::Windows).name(), "manual_walk");
        assert_eq!(select_copy_strategy(EnumPlatform::Other).name(), "manual_walk");
    }

    #[test]
    fn manual_walk_copies_contents() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        build_tree(&src);
        std::fs::create_dir_all(&dst).expect("mkdir dst");

        ManualWalkCopy
            .copy_dir_contents(&src, &dst)
            .expect("manual copy");
        assert_copied(&dst);
    }

    #[cfg(unix)]
    #[test]
    fn native_command_copies_contents() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        build_tree(&src);
        std::fs::create_dir_all(&dst).expect("mkdir dst");

        NativeCommandCopy
            .copy_dir_contents(&src, &dst)
            .expect("native copy");
        assert_copied(&dst);
    }

    #[cfg(unix)]
    #[test]
    fn native_command_reports_missing_source() {
        let tmp = TempDir::new().expect("tempdir");
        let dst = tmp.path().join("dst");
        std::fs::create_dir_all(&dst).expect("mkdir dst");

        let err = NativeCommandCopy
            .copy_dir_contents(&tmp.path().join("missing"), &dst)
            .expect_err("must fail");
        assert!(err.exception.contains("cp command failed"));
    }

    #[cfg(unix)]
    #[test]
    fn manual_walk_recreates_symlinks() {
        use std::os::unix::fs::symlink;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("root.txt"), "root");
        symlink("root.txt", src.join("link_root.txt")).expect("create symlink");
        std::fs::create_dir_all(&dst).expect("mkdir dst");

        ManualWalkCopy
            .copy_dir_contents(&src, &dst)
            .expect("manual copy");
        assert!(dst.join("link_root.txt").is_symlink());
        assert_eq!(
            std::fs::read_link(dst.join("link_root.txt")).expect("read link"),
            Path::new("root.txt")
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn manual_walk_preserves_linux_metadata() {
        use filetime::{FileTime, set_file_times};
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let path_file_src = src.join("meta.txt");
        write_text(&path_file_src, "meta");
        std::fs::create_dir_all(&dst).expect("mkdir dst");

        std::fs::set_permissions(&path_file_src, std::fs::Permissions::from_mode(0o640))
            .expect("set permissions");
        set_file_times(
            &path_file_src,
            FileTime::from_unix_time(1_700_000_010, 0),
            FileTime::from_unix_time(1_700_000_020, 0),
        )
        .expect("set times");

        let c_xattr_name = "user.stagekit_fs_test";
        let b_if_has_xattr = xattr::set(&path_file_src, c_xattr_name, b"meta_value").is_ok();

        ManualWalkCopy
            .copy_dir_contents(&src, &dst)
            .expect("manual copy");

        let path_file_dst = dst.join("meta.txt");
        let stat_src = std::fs::metadata(&path_file_src).expect("src metadata");
        let stat_dst = std::fs::metadata(&path_file_dst).expect("dst metadata");
        assert_eq!(
            stat_src.permissions().mode() & 0o777,
            stat_dst.permissions().mode() & 0o777
        );
        assert_eq!(
            FileTime::from_last_modification_time(&stat_src),
            FileTime::from_last_modification_time(&stat_dst)
        );

        if b_if_has_xattr {
            let raw_value_dst = xattr::get(&path_file_dst, c_xattr_name)
                .expect("get dst xattr")
                .expect("xattr exists");
            assert_eq!(raw_value_dst, b"meta_value");
        }
    }
}
