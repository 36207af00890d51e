// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod graph;
pub mod logging;
pub mod server;
pub mod site;
pub mod sources;
pub mod tasks;
pub mod template;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_or_default};
use crate::errors::Result;
use crate::exec::PipelineExecutor;
use crate::graph::{GraphRunner, TaskRegistry};
use crate::site::Site;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (defaults when the file is missing)
/// - the resolved site layout
/// - the task registry and graph runner
/// - the production leaf executor
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_or_default(&config_path)?;
    if let Some(port) = args.port {
        cfg.set_server_port(port);
    }

    let root = config_root_dir(&config_path);
    debug!(?root, config = ?config_path, "resolved project root");

    let site = Site::new(root, &cfg)?;
    let registry = TaskRegistry::from_config(&cfg)?;

    if args.list {
        print_registry(&registry);
        return Ok(());
    }

    let runner = GraphRunner::new(registry, Arc::new(PipelineExecutor::new(site)));
    let task = args.task_name();
    info!(task, "running");
    runner.run_task(task).await
}

/// `--list` output: every invocable task with its composition.
fn print_registry(registry: &TaskRegistry) {
    println!("sitepipe tasks:");
    for name in registry.names() {
        let Some(node) = registry.get(name) else {
            continue;
        };
        println!("  - {name}");
        if let Some(description) = registry.description_of(name) {
            println!("      {description}");
        }
        println!("      runs: {node}");
    }
}
