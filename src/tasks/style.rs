// src/tasks/style.rs

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, error};

use crate::config::OutputStyle;
use crate::errors::{Result, SitepipeError};
use crate::site::Site;

/// Outcome of a `style` run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleReport {
    /// CSS files written.
    pub written: Vec<PathBuf>,
    /// Sources that failed to compile (lenient mode only).
    pub failed: Vec<PathBuf>,
}

/// Compile every matched stylesheet into the build directory.
///
/// Partials (`_name.scss`) are only reachable through `@use`/`@import` and
/// produce no output of their own. With `[style].lenient = true` a compile
/// error is logged and the remaining files still compile.
pub async fn compile_styles(site: &Site) -> Result<StyleReport> {
    let files = site.styles().collect(site.root())?;
    let settings = site.style().clone();
    let load_paths: Vec<PathBuf> = settings
        .load_paths
        .iter()
        .map(|p| site.root().join(p))
        .collect();

    let mut report = StyleReport::default();

    for file in files.into_iter().filter(|f| !is_partial(&f.path)) {
        let source = file.path.clone();
        let style = settings.output_style;
        let paths = load_paths.clone();
        let compiled = tokio::task::spawn_blocking(move || compile_one(&source, style, &paths))
            .await
            .context("stylesheet compiler panicked")?;

        match compiled {
            Ok(css) => {
                let target = site.build_dir().join(file.relative.with_extension("css"));
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .with_context(|| format!("creating dir {:?}", parent))?;
                }
                tokio::fs::write(&target, css)
                    .await
                    .with_context(|| format!("writing {:?}", target))?;
                debug!(from = ?file.path, to = ?target, "compiled stylesheet");
                report.written.push(target);
            }
            Err(message) => {
                if !settings.lenient {
                    return Err(SitepipeError::Stylesheet {
                        path: file.path,
                        message,
                    });
                }
                error!(file = ?file.path, "stylesheet error:\n{message}");
                report.failed.push(file.path);
            }
        }
    }

    Ok(report)
}

fn compile_one(
    path: &Path,
    style: OutputStyle,
    load_paths: &[PathBuf],
) -> std::result::Result<String, String> {
    let style = match style {
        OutputStyle::Expanded => grass::OutputStyle::Expanded,
        OutputStyle::Compressed => grass::OutputStyle::Compressed,
    };
    let mut options = grass::Options::default().style(style);
    for load_path in load_paths {
        options = options.load_path(load_path);
    }
    grass::from_path(path, &options).map_err(|e| e.to_string())
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}
