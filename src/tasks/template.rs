// src/tasks/template.rs

use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;

use crate::errors::{Result, SitepipeError};
use crate::site::Site;
use crate::template::{CompileOptions, compile_file};

/// Compile every matched template into the build directory as `.html`.
///
/// The first template that fails to compile aborts the task; files earlier
/// in path order have already been written.
pub async fn compile_templates(site: &Site) -> Result<Vec<PathBuf>> {
    let files = site.templates().collect(site.root())?;
    let options = CompileOptions::from(site.template());
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let source = file.path.clone();
        let opts = options.clone();
        let html = tokio::task::spawn_blocking(move || compile_file(&source, &opts))
            .await
            .context("template compiler panicked")?
            .map_err(|source| SitepipeError::Template {
                path: file.path.clone(),
                source,
            })?;

        let target = site.build_dir().join(file.relative.with_extension("html"));
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating dir {:?}", parent))?;
        }
        tokio::fs::write(&target, html)
            .await
            .with_context(|| format!("writing {:?}", target))?;
        debug!(from = ?file.path, to = ?target, "compiled template");
        written.push(target);
    }

    Ok(written)
}
