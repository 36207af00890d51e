// src/graph/runner.rs

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, error, info};

use crate::errors::{Result, SitepipeError};
use crate::exec::TaskExecutor;
use crate::graph::node::{LeafTask, TaskNode};
use crate::graph::registry::TaskRegistry;

/// Executes task graph nodes.
///
/// Cheap to clone: the registry and executor are shared, so a clone can be
/// handed to the watcher to re-run tasks on change.
#[derive(Clone)]
pub struct GraphRunner {
    registry: Arc<TaskRegistry>,
    executor: Arc<dyn TaskExecutor>,
}

impl fmt::Debug for GraphRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphRunner")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl GraphRunner {
    pub fn new(registry: TaskRegistry, executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            registry: Arc::new(registry),
            executor,
        }
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Run a named task to completion.
    pub async fn run_task(&self, name: &str) -> Result<()> {
        let node = self.registry.resolve(name)?.clone();
        self.run_named(name.to_string(), node).await
    }

    fn run_named(&self, name: String, node: TaskNode) -> BoxFuture<'static, Result<()>> {
        let runner = self.clone();
        async move {
            info!(task = %name, "starting task");
            let started = Instant::now();
            let result = runner.run_node(node).await;
            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => info!(task = %name, elapsed_ms, "finished task"),
                Err(err) => error!(task = %name, elapsed_ms, error = %err, "task errored"),
            }
            result
        }
        .boxed()
    }

    /// Run a single node.
    ///
    /// - `Series`: members in order; the first failure returns immediately.
    /// - `Parallel`: each member is spawned; the first failure returns
    ///   immediately while the remaining members keep running detached.
    pub fn run_node(&self, node: TaskNode) -> BoxFuture<'static, Result<()>> {
        let runner = self.clone();
        async move {
            match node {
                TaskNode::Leaf(leaf) => runner.run_leaf(leaf).await,
                TaskNode::Ref(name) => {
                    let node = runner.registry.resolve(&name)?.clone();
                    match node {
                        // A leaf's registry entry is its own name; skip the
                        // extra log pair.
                        TaskNode::Leaf(leaf) if leaf.name() == name => runner.run_leaf(leaf).await,
                        node => runner.run_named(name, node).await,
                    }
                }
                TaskNode::Series(children) => {
                    for child in children {
                        runner.run_node(child).await?;
                    }
                    Ok(())
                }
                TaskNode::Parallel(children) => runner.run_parallel(children).await,
            }
        }
        .boxed()
    }

    async fn run_parallel(&self, children: Vec<TaskNode>) -> Result<()> {
        let mut pending: FuturesUnordered<_> = children
            .into_iter()
            .map(|child| tokio::spawn(self.run_node(child)))
            .collect();

        while let Some(joined) = pending.next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    debug!(
                        still_running = pending.len(),
                        "parallel member failed; leaving siblings detached"
                    );
                    return Err(err);
                }
                Err(join_err) => {
                    return Err(SitepipeError::Other(anyhow::anyhow!(
                        "parallel member panicked: {join_err}"
                    )));
                }
            }
        }
        Ok(())
    }

    async fn run_leaf(&self, leaf: LeafTask) -> Result<()> {
        info!(task = %leaf, "starting task");
        let started = Instant::now();
        let result = self.executor.run_leaf(leaf, self.clone()).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(()) => {
                info!(task = %leaf, elapsed_ms, "finished task");
                Ok(())
            }
            Err(err) => {
                error!(task = %leaf, elapsed_ms, error = %err, "task errored");
                Err(SitepipeError::TaskFailed {
                    task: leaf.name().to_string(),
                    source: Box::new(err),
                })
            }
        }
    }
}
