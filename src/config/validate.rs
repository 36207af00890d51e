// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SitepipeError};
use crate::graph::registry::BUILTIN_TASKS;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SitepipeError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_options(cfg)?;
    validate_composite_tasks(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let paths = [
        ("build", &cfg.paths.build),
        ("fonts", &cfg.paths.fonts),
        ("images", &cfg.paths.images),
        ("stage", &cfg.paths.stage),
    ];
    for (key, value) in paths {
        if value.trim().is_empty() {
            return Err(SitepipeError::ConfigError(format!(
                "[paths].{key} must not be empty"
            )));
        }
    }

    if normalize(&cfg.paths.stage) == normalize(&cfg.paths.build) {
        return Err(SitepipeError::ConfigError(format!(
            "[paths].stage must differ from [paths].build (both are '{}')",
            cfg.paths.build
        )));
    }

    Ok(())
}

fn validate_options(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.index.trim().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[server].index must not be empty".to_string(),
        ));
    }
    if cfg.server.host.trim().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[server].host must not be empty".to_string(),
        ));
    }
    if cfg.template.doctype.trim().is_empty() {
        return Err(SitepipeError::ConfigError(
            "[template].doctype must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Structural checks on `[task.<name>]`. Reference resolution and cycle
/// detection happen when the registry is built.
fn validate_composite_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if BUILTIN_TASKS.contains(&name.as_str()) {
            return Err(SitepipeError::ConfigError(format!(
                "task '{name}' shadows a built-in task"
            )));
        }

        match (task.series.is_empty(), task.parallel.is_empty()) {
            (false, false) => {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' must set only one of `series` or `parallel`"
                )));
            }
            (true, true) => {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' must set a non-empty `series` or `parallel`"
                )));
            }
            _ => {}
        }

        for dep in task.references() {
            if dep == name {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' cannot refer to itself"
                )));
            }
            if !BUILTIN_TASKS.contains(&dep) && !cfg.task.contains_key(dep) {
                return Err(SitepipeError::ConfigError(format!(
                    "task '{name}' refers to unknown task '{dep}'"
                )));
            }
        }
    }
    Ok(())
}

fn normalize(path: &str) -> &str {
    path.trim()
        .trim_start_matches("./")
        .trim_end_matches('/')
}
