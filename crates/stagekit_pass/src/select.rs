//! Leaf directory selection strategies.
//!
//! A pass either descends a fixed depth from each base directory, or selects
//! every directory under the base whose relative path matches a pattern.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use regex::Regex;
use stagekit_io_fs::resolve_leaf_dirs;
use tracing::debug;
use walkdir::WalkDir;

use crate::spec::{EnumPatternMode, PluginError};

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

/// One compiled selection pattern.
#[derive(Debug, Clone)]
pub enum TypePatternMatcher {
    /// Substring match.
    Literal(String),
    /// Shell-like wildcard.
    Glob(GlobMatcher),
    /// Regular expression.
    Regex(Regex),
}

impl TypePatternMatcher {
    /// Compile `pattern` according to `rule_pattern`.
    pub fn compile(pattern: &str, rule_pattern: EnumPatternMode) -> Result<Self, PluginError> {
        let to_error = |message: String| PluginError::InvalidPattern {
            pattern: pattern.to_string(),
            message,
        };
        if pattern.is_empty() {
            return Err(to_error("pattern must not be empty".to_string()));
        }

        match rule_pattern {
            EnumPatternMode::Literal => Ok(Self::Literal(pattern.to_string())),
            EnumPatternMode::Glob => {
                let matcher = Glob::new(pattern)
                    .map_err(|e| to_error(e.to_string()))?
                    .compile_matcher();
                Ok(Self::Glob(matcher))
            }
            EnumPatternMode::Regex => {
                let regex = Regex::new(pattern).map_err(|e| to_error(e.to_string()))?;
                Ok(Self::Regex(regex))
            }
        }
    }

    /// Whether `value` matches.
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Literal(p) => value.contains(p.as_str()),
            Self::Glob(p) => p.is_match(value),
            Self::Regex(p) => p.is_match(value),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DirSelection

/// How a pass resolves its leaf directories under a base directory.
#[derive(Debug, Clone)]
pub enum EnumDirSelection {
    /// Directories exactly `depth` levels down (base is level 0, see
    /// [`resolve_leaf_dirs`]).
    Depth(i64),
    /// Directories below the base whose `/`-joined relative path matches.
    Pattern(TypePatternMatcher),
}

impl EnumDirSelection {
    /// Resolve the leaf directories under `path_base`.
    ///
    /// Unreadable branches are skipped in both modes.
    pub fn resolve(&self, path_base: &Path) -> Vec<PathBuf> {
        match self {
            Self::Depth(depth) => resolve_leaf_dirs(path_base, *depth),
            Self::Pattern(matcher) => resolve_pattern_dirs(path_base, matcher),
        }
    }
}

fn resolve_pattern_dirs(path_base: &Path, matcher: &TypePatternMatcher) -> Vec<PathBuf> {
    let mut l_dirs = Vec::new();
    for entry_res in WalkDir::new(path_base).min_depth(1).sort_by_file_name() {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) => {
                debug!(base = %path_base.display(), error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let Ok(path_rel) = entry.path().strip_prefix(path_base) else {
            continue;
        };
        let c_rel = path_rel
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if matcher.is_match(&c_rel) {
            l_dirs.push(entry.into_path());
        }
    }
    l_dirs
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
