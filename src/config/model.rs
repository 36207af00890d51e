// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from `Sitepipe.toml`.
///
/// ```toml
/// [paths]
/// build = "build"
///
/// [server]
/// port = 3000
///
/// [task.release]
/// series = ["genAssets", "genHtml", "genFiles"]
/// ```
///
/// Every section is optional; an empty file describes the default layout
/// (`src/` in, `build/` out, `y/` staging copy).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub patterns: PatternsSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub template: TemplateSection,

    #[serde(default)]
    pub style: StyleSection,

    /// Extra composite tasks from `[task.<name>]`.
    #[serde(default)]
    pub task: BTreeMap<String, CompositeTaskConfig>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so holders can rely on the invariants checked there.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    paths: PathsSection,
    patterns: PatternsSection,
    server: ServerSection,
    template: TemplateSection,
    style: StyleSection,
    task: BTreeMap<String, CompositeTaskConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            paths: raw.paths,
            patterns: raw.patterns,
            server: raw.server,
            template: raw.template,
            style: raw.style,
            task: raw.task,
        }
    }

    pub fn paths(&self) -> &PathsSection {
        &self.paths
    }

    pub fn patterns(&self) -> &PatternsSection {
        &self.patterns
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

    pub fn tasks(&self) -> &BTreeMap<String, CompositeTaskConfig> {
        &self.task
    }

    /// Replace the dev server port (used by `--port`).
    pub fn set_server_port(&mut self, port: u16) {
        self.server.port = port;
    }
}

/// `[paths]` section: output locations, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    #[serde(default = "default_build")]
    pub build: String,

    /// Destination of `copyFonts`.
    #[serde(default = "default_fonts_out")]
    pub fonts: String,

    /// Destination of `copyImages`.
    #[serde(default = "default_images_out")]
    pub images: String,

    /// Destination of `copyToFirebase`: a full copy of the build output.
    #[serde(default = "default_stage")]
    pub stage: String,
}

fn default_build() -> String {
    "build".to_string()
}

fn default_fonts_out() -> String {
    "build/assets/fonts".to_string()
}

fn default_images_out() -> String {
    "build/assets/images".to_string()
}

fn default_stage() -> String {
    "y".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            build: default_build(),
            fonts: default_fonts_out(),
            images: default_images_out(),
            stage: default_stage(),
        }
    }
}

/// `[patterns]` section: source globs, relative to the project root.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternsSection {
    #[serde(default = "default_styles")]
    pub styles: String,

    #[serde(default = "default_templates")]
    pub templates: String,

    #[serde(default = "default_scripts")]
    pub scripts: String,

    #[serde(default = "default_fonts")]
    pub fonts: String,

    #[serde(default = "default_images")]
    pub images: String,
}

fn default_styles() -> String {
    "src/**/*.scss".to_string()
}

fn default_templates() -> String {
    "src/**/*.pug".to_string()
}

fn default_scripts() -> String {
    "src/**/*.js".to_string()
}

fn default_fonts() -> String {
    "src/assets/fonts/**/*.{ttf,woff,eof}".to_string()
}

fn default_images() -> String {
    "src/assets/images/**/*.{svg,gif,jpg,png}".to_string()
}

impl Default for PatternsSection {
    fn default() -> Self {
        Self {
            styles: default_styles(),
            templates: default_templates(),
            scripts: default_scripts(),
            fonts: default_fonts(),
            images: default_images(),
        }
    }
}

/// `[server]` section for the live-reload dev server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// `0` asks the OS for a free port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Document served for `/`, relative to the build directory.
    #[serde(default = "default_index")]
    pub index: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_index() -> String {
    "pages/index.html".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index: default_index(),
        }
    }
}

/// `[template]` section: options handed to the Pug compiler.
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSection {
    #[serde(default = "default_doctype")]
    pub doctype: String,

    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_doctype() -> String {
    "html".to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for TemplateSection {
    fn default() -> Self {
        Self {
            doctype: default_doctype(),
            pretty: default_pretty(),
        }
    }
}

/// CSS output formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Compressed,
}

/// `[style]` section: options handed to the Sass compiler.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleSection {
    #[serde(default)]
    pub output_style: OutputStyle,

    /// Extra `@use` / `@import` search directories, relative to the root.
    #[serde(default)]
    pub load_paths: Vec<String>,

    /// When true (default), a stylesheet that fails to compile is logged and
    /// skipped instead of failing the `style` task.
    #[serde(default = "default_lenient")]
    pub lenient: bool,
}

fn default_lenient() -> bool {
    true
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            output_style: OutputStyle::default(),
            load_paths: Vec::new(),
            lenient: default_lenient(),
        }
    }
}

/// `[task.<name>]` section: a composite task over other named tasks.
///
/// Exactly one of `series` / `parallel` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompositeTaskConfig {
    /// Run these tasks one after another.
    #[serde(default)]
    pub series: Vec<String>,

    /// Run these tasks concurrently.
    #[serde(default)]
    pub parallel: Vec<String>,

    /// Shown by `--list`.
    #[serde(default)]
    pub description: Option<String>,
}

impl CompositeTaskConfig {
    pub fn series<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            series: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn parallel<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parallel: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// All task names this composite refers to.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.series
            .iter()
            .chain(self.parallel.iter())
            .map(String::as_str)
    }
}
