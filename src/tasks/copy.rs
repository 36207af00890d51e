// src/tasks/copy.rs

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::sources::SourceGlob;

/// Copy every file matched by `glob` (relative to `root`) into `dest`,
/// preserving contents and base-relative paths.
///
/// Returns the written destination paths. The first I/O error aborts the
/// copy and is returned.
pub async fn copy_glob(root: &Path, glob: &SourceGlob, dest: &Path) -> Result<Vec<PathBuf>> {
    let files = glob.collect(root)?;
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target = dest.join(&file.relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating dir {:?}", parent))?;
        }
        tokio::fs::copy(&file.path, &target)
            .await
            .with_context(|| format!("copying {:?} to {:?}", file.path, target))?;
        debug!(from = ?file.path, to = ?target, "copied file");
        written.push(target);
    }

    debug!(pattern = glob.pattern(), count = written.len(), "copy complete");
    Ok(written)
}
