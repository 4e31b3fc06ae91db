//! Depth-bounded directory resolution shared by transformation passes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Resolve the directories reached by descending `depth` levels from `path_base`.
///
/// The base itself is level 0 and is returned alone for `depth <= 1`. Each
/// further level lists the immediate sub-directories of the current frontier,
/// sorted by name per directory and concatenated in frontier order. A directory
/// that cannot be listed contributes nothing; the walk continues with the rest.
pub fn resolve_leaf_dirs<P: AsRef<Path>>(path_base: P, depth: i64) -> Vec<PathBuf> {
    let mut l_frontier = vec![path_base.as_ref().to_path_buf()];
    if depth <= 1 {
        return l_frontier;
    }

    for _ in 1..depth {
        let mut l_next = Vec::new();
        for path_dir in &l_frontier {
            l_next.extend(list_sub_dirs(path_dir));
        }
        l_frontier = l_next;
        if l_frontier.is_empty() {
            break;
        }
    }
    l_frontier
}

fn list_sub_dirs(path_dir: &Path) -> Vec<PathBuf> {
    let iter_entries = match fs::read_dir(path_dir) {
        Ok(iter) => iter,
        Err(e) => {
            debug!(path = %path_dir.display(), error = %e, "skipping unreadable directory");
            return Vec::new();
        }
    };

    let mut l_dirs: Vec<PathBuf> = iter_entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path_entry| path_entry.is_dir())
        .collect();
    l_dirs.sort();
    l_dirs
}
