// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `sitepipe`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "sitepipe",
    version,
    about = "Build a static site from Sass, Pug and assets, then serve it with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run (see `--list`). Defaults to `default` (build + watch).
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the config file (TOML). A missing file means all defaults.
    ///
    /// The project root is the directory containing this file.
    #[arg(long, value_name = "PATH", default_value = "Sitepipe.toml")]
    pub config: String,

    /// Override `[server].port` for the dev server.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SITEPIPE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the task registry and exit without running anything.
    #[arg(long)]
    pub list: bool,
}

impl CliArgs {
    /// Task to run, falling back to the default pipeline.
    pub fn task_name(&self) -> &str {
        self.task.as_deref().unwrap_or(crate::graph::DEFAULT_TASK)
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
