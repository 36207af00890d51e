// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::template::TemplateError;

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    TaskCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Template error in {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: TemplateError,
    },

    #[error("Stylesheet error in {}: {message}", path.display())]
    Stylesheet { path: PathBuf, message: String },

    #[error("Dev server error: {0}")]
    Server(String),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: Box<SitepipeError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SitepipeError {
    /// Name of the innermost failing task, if this error came out of the
    /// graph runner.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            SitepipeError::TaskFailed { task, source } => {
                source.failed_task().or(Some(task.as_str()))
            }
            _ => None,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
