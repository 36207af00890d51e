// src/sources.rs

//! Source globs: a pattern plus the base directory output paths are
//! mirrored from.
//!
//! For `src/**/*.pug` the base is `src`, so `src/pages/index.pug` has the
//! base-relative path `pages/index.pug`. Leaf tasks write to
//! `<dest>/<base-relative path>`.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::watch::path_utils::relative_str;

/// One file selected by a [`SourceGlob`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path on disk (root joined with the root-relative path).
    pub path: PathBuf,
    /// Path relative to the glob base.
    pub relative: PathBuf,
}

#[derive(Clone)]
pub struct SourceGlob {
    pattern: String,
    base: PathBuf,
    matcher: GlobMatcher,
}

impl fmt::Debug for SourceGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceGlob")
            .field("pattern", &self.pattern)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl SourceGlob {
    /// Compile a root-relative pattern. A leading `./` is ignored.
    pub fn new(pattern: &str) -> Result<Self> {
        let normalized = pattern.trim().trim_start_matches("./").to_string();
        let matcher = GlobBuilder::new(&normalized)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pattern}"))?
            .compile_matcher();

        Ok(Self {
            base: glob_base(&normalized),
            pattern: normalized,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Leading literal directories of the pattern (may be empty).
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Whether a root-relative, forward-slash path is selected.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }

    /// Collect all matching files under `root`, sorted by path.
    ///
    /// A base directory that does not exist selects nothing.
    pub fn collect(&self, root: &Path) -> Result<Vec<SourceFile>> {
        let base_dir = root.join(&self.base);
        if !base_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&base_dir).follow_links(true).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {:?}", base_dir))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(rel) = relative_str(root, entry.path()) else {
                continue;
            };
            if !self.matches(&rel) {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&base_dir)
                .with_context(|| format!("relativizing {:?}", entry.path()))?
                .to_path_buf();
            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                relative,
            });
        }

        Ok(files)
    }
}

/// Literal directory prefix of a glob: every `/`-separated segment before the
/// first one containing a wildcard. The final segment is never part of the
/// base, even when literal.
fn glob_base(pattern: &str) -> PathBuf {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut base = PathBuf::new();
    for segment in &segments[..segments.len().saturating_sub(1)] {
        if segment.contains(['*', '?', '[', '{']) {
            break;
        }
        if !segment.is_empty() {
            base.push(segment);
        }
    }
    base
}
