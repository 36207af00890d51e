// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate paths, options and composite task declarations (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, load_and_validate, load_from_path, load_or_default};
pub use model::{
    CompositeTaskConfig, ConfigFile, OutputStyle, PathsSection, PatternsSection, RawConfigFile,
    ServerSection, StyleSection, TemplateSection,
};
