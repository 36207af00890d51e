// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Removed files cannot be canonicalized, so for those the parent directory
/// is canonicalized instead.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_slash(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = canonicalize_lenient(path)?;
    path_canon.strip_prefix(&root_canon).ok().map(to_slash)
}

fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    if let Ok(canon) = path.canonicalize() {
        return Some(canon);
    }
    let parent = path.parent()?.canonicalize().ok()?;
    Some(parent.join(path.file_name()?))
}

fn to_slash(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Directories to watch recursively for the given glob bases.
///
/// Each base is replaced by its nearest existing ancestor inside `root`, then
/// directories nested in another selected directory are dropped.
pub fn watch_roots<'a, I>(root: &Path, bases: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut dirs: Vec<PathBuf> = Vec::new();
    for base in bases {
        let mut candidate = root.join(base);
        while !candidate.is_dir() && candidate != root {
            match candidate.parent() {
                Some(parent) => candidate = parent.to_path_buf(),
                None => break,
            }
        }
        if candidate.is_dir() && !dirs.contains(&candidate) {
            dirs.push(candidate);
        }
    }

    let snapshot = dirs.clone();
    dirs.retain(|dir| {
        !snapshot
            .iter()
            .any(|other| other != dir && dir.starts_with(other))
    });
    dirs.sort();
    dirs
}
