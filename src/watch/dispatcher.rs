// src/watch/dispatcher.rs

//! Turns batches of changed paths into task invocations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::graph::GraphRunner;
use crate::server::ReloadHandle;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBinding;

/// Events flowing into the dispatcher from the filesystem watcher and the
/// Ctrl-C handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Content of these paths changed (created, modified or removed).
    Changed(Vec<PathBuf>),
    /// Stop dispatching; in-flight invocations are awaited.
    Shutdown,
}

/// Consumes [`WatchEvent`]s and re-runs bound tasks.
///
/// Each batch fires every matching binding once. Invocations run
/// independently of each other and of later batches.
pub struct Dispatcher {
    root: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
    runner: GraphRunner,
    reload: Option<ReloadHandle>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("root", &self.root)
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        root: impl Into<PathBuf>,
        bindings: Vec<WatchBinding>,
        runner: GraphRunner,
        reload: Option<ReloadHandle>,
    ) -> Self {
        Self {
            root: root.into(),
            bindings: Arc::new(bindings),
            runner,
            reload,
        }
    }

    /// Indices of bindings matching any of `paths`, each at most once, in
    /// binding order.
    pub fn matching(&self, paths: &[PathBuf]) -> Vec<usize> {
        let rel_paths: Vec<String> = paths
            .iter()
            .filter_map(|path| relativize(&self.root, path))
            .collect();

        self.bindings
            .iter()
            .enumerate()
            .filter(|(_, binding)| rel_paths.iter().any(|rel| binding.matches(rel)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Main loop. Returns once [`WatchEvent::Shutdown`] arrives (or every
    /// sender is gone) and all in-flight invocations have finished.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<WatchEvent>) -> Result<()> {
        info!(bindings = self.bindings.len(), "watch dispatcher started");
        let mut in_flight = JoinSet::new();
        let mut shutdown = false;

        while !shutdown {
            let mut paths = match events.recv().await {
                Some(WatchEvent::Changed(paths)) => paths,
                Some(WatchEvent::Shutdown) => break,
                None => {
                    info!("watch event channel closed; exiting");
                    break;
                }
            };

            // Drain what is already queued so one save that produced several
            // notify events runs each task once.
            loop {
                match events.try_recv() {
                    Ok(WatchEvent::Changed(more)) => paths.extend(more),
                    Ok(WatchEvent::Shutdown) => {
                        shutdown = true;
                        break;
                    }
                    Err(_) => break,
                }
            }

            for index in self.matching(&paths) {
                let binding = self.bindings[index].clone();
                debug!(task = binding.task(), ?paths, "watch match -> running task");
                in_flight.spawn(invoke(self.runner.clone(), binding, self.reload.clone()));
            }

            while let Some(joined) = in_flight.try_join_next() {
                if let Err(err) = joined {
                    warn!(error = %err, "watch invocation panicked");
                }
            }
        }

        if !in_flight.is_empty() {
            info!(in_flight = in_flight.len(), "waiting for running tasks before shutdown");
        }
        while let Some(joined) = in_flight.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "watch invocation panicked");
            }
        }

        info!("watch dispatcher stopped");
        Ok(())
    }
}

/// Run the bound task; on success push its signal to connected clients.
/// Failures are logged and the watcher keeps going.
async fn invoke(runner: GraphRunner, binding: WatchBinding, reload: Option<ReloadHandle>) {
    match runner.run_task(binding.task()).await {
        Ok(()) => {
            if let (Some(signal), Some(reload)) = (binding.reaction().signal(), reload) {
                let clients = reload.send(signal);
                debug!(task = binding.task(), ?signal, clients, "sent reload signal");
            }
        }
        Err(err) => {
            error!(task = binding.task(), error = %err, "watched task failed");
        }
    }
}

fn relativize(root: &Path, path: &Path) -> Option<String> {
    let rel = relative_str(root, path);
    if rel.is_none() {
        warn!(?path, ?root, "could not relativize path against root");
    }
    rel
}
