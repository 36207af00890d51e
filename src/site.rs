// src/site.rs

//! Resolved project layout: the validated config joined with a project root
//! and compiled into globs the leaf tasks and the watcher share.

use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, ServerSection, StyleSection, TemplateSection};
use crate::errors::{Result, SitepipeError};
use crate::sources::SourceGlob;

#[derive(Debug, Clone)]
pub struct Site {
    root: PathBuf,
    build_dir: PathBuf,
    fonts_dir: PathBuf,
    images_dir: PathBuf,
    stage_dir: PathBuf,
    styles: SourceGlob,
    templates: SourceGlob,
    scripts: SourceGlob,
    fonts: SourceGlob,
    images: SourceGlob,
    build_output: SourceGlob,
    server: ServerSection,
    template: TemplateSection,
    style: StyleSection,
}

impl Site {
    pub fn new(root: impl Into<PathBuf>, cfg: &ConfigFile) -> Result<Self> {
        let root = root.into();
        let paths = cfg.paths();
        let patterns = cfg.patterns();

        let build_rel = paths.build.trim().trim_start_matches("./").trim_end_matches('/');

        Ok(Self {
            build_dir: root.join(build_rel),
            fonts_dir: root.join(&paths.fonts),
            images_dir: root.join(&paths.images),
            stage_dir: root.join(&paths.stage),
            styles: compile_glob("styles", &patterns.styles)?,
            templates: compile_glob("templates", &patterns.templates)?,
            scripts: compile_glob("scripts", &patterns.scripts)?,
            fonts: compile_glob("fonts", &patterns.fonts)?,
            images: compile_glob("images", &patterns.images)?,
            build_output: compile_glob("build", &format!("{build_rel}/**"))?,
            server: cfg.server().clone(),
            template: cfg.template().clone(),
            style: cfg.style().clone(),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn fonts_dir(&self) -> &Path {
        &self.fonts_dir
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn stage_dir(&self) -> &Path {
        &self.stage_dir
    }

    pub fn styles(&self) -> &SourceGlob {
        &self.styles
    }

    pub fn templates(&self) -> &SourceGlob {
        &self.templates
    }

    pub fn scripts(&self) -> &SourceGlob {
        &self.scripts
    }

    pub fn fonts(&self) -> &SourceGlob {
        &self.fonts
    }

    pub fn images(&self) -> &SourceGlob {
        &self.images
    }

    /// Everything under the build directory (`build/**`).
    pub fn build_output(&self) -> &SourceGlob {
        &self.build_output
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn template(&self) -> &TemplateSection {
        &self.template
    }

    pub fn style(&self) -> &StyleSection {
        &self.style
    }
}

fn compile_glob(key: &str, pattern: &str) -> Result<SourceGlob> {
    SourceGlob::new(pattern)
        .map_err(|e| SitepipeError::ConfigError(format!("[patterns].{key}: {e:#}")))
}
