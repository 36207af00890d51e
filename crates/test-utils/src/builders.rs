#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use sitepipe::config::{CompositeTaskConfig, ConfigFile, OutputStyle, RawConfigFile};
use sitepipe::errors::Result;
use sitepipe::site::Site;
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_series(mut self, name: &str, members: &[&str]) -> Self {
        self.config
            .task
            .insert(name.to_string(), CompositeTaskConfig::series(members.iter().copied()));
        self
    }

    pub fn with_parallel(mut self, name: &str, members: &[&str]) -> Self {
        self.config
            .task
            .insert(name.to_string(), CompositeTaskConfig::parallel(members.iter().copied()));
        self
    }

    pub fn with_task(mut self, name: &str, task: CompositeTaskConfig) -> Self {
        self.config.task.insert(name.to_string(), task);
        self
    }

    /// Port 0 lets the OS pick a free port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_index(mut self, index: &str) -> Self {
        self.config.server.index = index.to_string();
        self
    }

    pub fn with_lenient_styles(mut self, lenient: bool) -> Self {
        self.config.style.lenient = lenient;
        self
    }

    pub fn with_output_style(mut self, style: OutputStyle) -> Self {
        self.config.style.output_style = style;
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.config.template.pretty = pretty;
        self
    }

    pub fn with_stage(mut self, stage: &str) -> Self {
        self.config.paths.stage = stage.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A project directory in a temp dir, with helpers to lay out sources and
/// inspect outputs.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write fixture file");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn read_bytes(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn site(&self, cfg: &ConfigFile) -> Site {
        Site::new(self.root(), cfg).expect("resolve site")
    }

    pub fn default_site(&self) -> Site {
        self.site(&ConfigFileBuilder::new().build())
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}
