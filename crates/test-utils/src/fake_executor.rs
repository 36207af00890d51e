use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use std::future::Future;
use std::pin::Pin;

use sitepipe::errors::{Result, SitepipeError};
use sitepipe::exec::TaskExecutor;
use sitepipe::graph::{GraphRunner, LeafTask};

/// A fake executor that:
/// - records which leaves were started, in start order
/// - fails the leaves it was told to fail
/// - optionally sleeps before finishing a leaf
/// - counts leaves that ran to completion (successfully or not)
///
/// `watch` returns immediately, so graphs ending in it terminate.
#[derive(Clone, Default)]
pub struct FakeExecutor {
    started: Arc<Mutex<Vec<String>>>,
    completed: Arc<AtomicUsize>,
    failing: Arc<HashSet<String>>,
    delays: Arc<HashMap<String, Duration>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, leaf: &str) -> Self {
        Arc::make_mut(&mut self.failing).insert(leaf.to_string());
        self
    }

    pub fn with_delay(mut self, leaf: &str, delay: Duration) -> Self {
        Arc::make_mut(&mut self.delays).insert(leaf.to_string(), delay);
        self
    }

    /// Leaf names in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn runs_of(&self, leaf: &str) -> usize {
        self.started.lock().unwrap().iter().filter(|n| *n == leaf).count()
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl TaskExecutor for FakeExecutor {
    fn run_leaf(
        &self,
        leaf: LeafTask,
        _runner: GraphRunner,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>> {
        let name = leaf.name().to_string();
        self.started.lock().unwrap().push(name.clone());

        let fails = self.failing.contains(&name);
        let delay = self.delays.get(&name).copied();
        let completed = Arc::clone(&self.completed);

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            completed.fetch_add(1, Ordering::SeqCst);
            if fails {
                Err(SitepipeError::Other(anyhow::anyhow!("{name} failed on purpose")))
            } else {
                Ok(())
            }
        })
    }
}
