use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::spec::SpecTreeCounts;

////////////////////////////////////////////////////////////////////////////////
// #region NameUtilities

/// Split a file name into `(stem, extension)` at the last `.`.
///
/// The extension keeps its leading dot and is empty when the name has no dot.
pub fn split_extension(name_file: &str) -> (&str, &str) {
    match name_file.rfind('.') {
        Some(idx) => name_file.split_at(idx),
        None => (name_file, ""),
    }
}

/// Whether `ext` (with or without leading dot) is accepted by `l_allowed`.
///
/// Dots are stripped on both sides. An empty allow list accepts everything.
pub fn is_extension_allowed(ext: &str, l_allowed: &[String]) -> bool {
    if l_allowed.is_empty() {
        return true;
    }
    let ext = ext.trim_start_matches('.');
    l_allowed
        .iter()
        .any(|allowed| allowed.trim_start_matches('.') == ext)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

/// Canonicalize `path`, or its closest existing ancestor for paths not created yet.
fn resolve_best_effort(path: &Path) -> PathBuf {
    if let Ok(resolved) = fs::canonicalize(path) {
        return resolved;
    }
    let path_abs = to_absolute(path);
    let mut l_tail = Vec::new();
    let mut path_cursor = path_abs.as_path();
    while let Some(parent) = path_cursor.parent() {
        if let Some(name) = path_cursor.file_name() {
            l_tail.push(name.to_os_string());
        }
        if let Ok(resolved) = fs::canonicalize(parent) {
            return l_tail.iter().rev().fold(resolved, |acc, part| acc.join(part));
        }
        path_cursor = parent;
    }
    path_abs
}

fn to_absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// `src` contains `dst` or vice versa, after resolving symlinks.
pub(crate) fn is_overlap(src: &Path, dst: &Path) -> bool {
    let src_resolved = resolve_best_effort(src);
    let dst_resolved = resolve_best_effort(dst);
    dst_resolved.starts_with(&src_resolved) || src_resolved.starts_with(&dst_resolved)
}

/// Absent directories count as empty; unreadable ones do not.
pub(crate) fn is_dir_empty(path_dir: &Path) -> io::Result<bool> {
    match fs::read_dir(path_dir) {
        Ok(mut iter_entries) => Ok(iter_entries.next().is_none()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

/// Count files and directories below `path_root`, the root included.
///
/// Symlinks are not followed and count as files.
pub(crate) fn count_tree(path_root: &Path) -> Result<SpecTreeCounts, walkdir::Error> {
    let mut counts = SpecTreeCounts::default();
    for entry_res in WalkDir::new(path_root) {
        let entry = entry_res?;
        if entry.file_type().is_dir() {
            counts.cnt_dirs += 1;
        } else {
            counts.cnt_files += 1;
        }
    }
    Ok(counts)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyPrimitives

pub(crate) fn create_symbolic_link(path_src: &Path, path_dst: &Path) -> io::Result<()> {
    let target = fs::read_link(path_src)?;

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(&target, path_dst)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::{symlink_dir, symlink_file};
        if path_src.is_dir() {
            symlink_dir(&target, path_dst)
        } else {
            symlink_file(&target, path_dst)
        }
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = (target, path_dst);
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "Symbolic links are unsupported on this platform",
        ))
    }
}

pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    fs::copy(path_file_src, path_file_dst)?;
    #[cfg(target_os = "linux")]
    {
        apply_metadata_linux(path_file_src, path_file_dst)?;
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn apply_metadata_linux(path_file_src: &Path, path_file_dst: &Path) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;

    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    copy_xattrs_linux(path_file_src, path_file_dst);
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let Ok(iter_xattr_names) = xattr::list(path_file_src) else {
        return;
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        // Namespaces such as `security.*` may be refused for unprivileged users.
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::{count_tree, is_dir_empty, is_extension_allowed, is_overlap, split_extension};

    #[test]
    fn split_extension_uses_last_dot() {
        assert_eq!(split_extension("quiz_1.pdf"), ("quiz_1", ".pdf"));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz"));
        assert_eq!(split_extension("readme"), ("readme", ""));
        assert_eq!(split_extension(".bashrc"), ("", ".bashrc"));
    }

    #[test]
    fn extension_allow_list_strips_dots() {
        let l_allowed = vec!["pdf".to_string(), ".PNG".to_string()];
        assert!(is_extension_allowed(".pdf", &l_allowed));
        assert!(is_extension_allowed("pdf", &l_allowed));
        assert!(is_extension_allowed(".PNG", &l_allowed));
        assert!(!is_extension_allowed(".png", &l_allowed));
        assert!(!is_extension_allowed("", &l_allowed));
        assert!(is_extension_allowed(".anything", &[]));
    }

    #[test]
    fn overlap_detects_nested_and_missing_paths() {
        let tmp = TempDir::new().expect("tempdir");
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).expect("mkdir");

        assert!(is_overlap(&src, &src.join("not/yet/created")));
        assert!(is_overlap(&src.join("inner"), &src));
        assert!(!is_overlap(&src, &tmp.path().join("workspace")));
    }

    #[test]
    fn dir_empty_treats_missing_as_empty() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(is_dir_empty(&tmp.path().join("missing")).expect("check"));
        assert!(is_dir_empty(tmp.path()).expect("check"));
        std::fs::write(tmp.path().join("a"), "a").expect("write");
        assert!(!is_dir_empty(tmp.path()).expect("check"));
    }

    #[test]
    fn count_tree_includes_root() {
        let tmp = TempDir::new().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("a/b")).expect("mkdir");
        std::fs::write(tmp.path().join("a/b/f.txt"), "f").expect("write");
        std::fs::write(tmp.path().join("g.txt"), "g").expect("write");

        let counts = count_tree(tmp.path()).expect("count");
        assert_eq!(counts.cnt_dirs, 3);
        assert_eq!(counts.cnt_files, 2);
    }
}
