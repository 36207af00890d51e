// src/exec/backend.rs

//! Pluggable leaf executor abstraction.
//!
//! - `PipelineExecutor` is the implementation used by `sitepipe`.
//! - Tests can provide their own `TaskExecutor` that, for example, records
//!   which leaves ran, fails some of them, or delays others.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use crate::errors::Result;
use crate::graph::{GraphRunner, LeafTask};
use crate::site::Site;
use crate::tasks;
use crate::watch;

/// Trait abstracting how leaf tasks are executed.
///
/// `runner` is the graph runner that dispatched the leaf; long-running
/// leaves (the watcher) use it to re-run named tasks.
pub trait TaskExecutor: Send + Sync {
    fn run_leaf(&self, leaf: LeafTask, runner: GraphRunner) -> BoxFuture<'static, Result<()>>;
}

/// Production executor: runs leaves against a resolved [`Site`].
#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    site: Arc<Site>,
}

impl PipelineExecutor {
    pub fn new(site: Site) -> Self {
        Self {
            site: Arc::new(site),
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }
}

impl TaskExecutor for PipelineExecutor {
    fn run_leaf(&self, leaf: LeafTask, runner: GraphRunner) -> BoxFuture<'static, Result<()>> {
        // Clone the Arc so the future doesn't borrow `self`.
        let site = Arc::clone(&self.site);

        async move {
            match leaf {
                LeafTask::Styles => tasks::style::compile_styles(&site).await.map(drop),
                LeafTask::Templates => tasks::template::compile_templates(&site).await.map(drop),
                LeafTask::Scripts => {
                    tasks::copy::copy_glob(site.root(), site.scripts(), site.build_dir())
                        .await
                        .map(drop)
                }
                LeafTask::Fonts => {
                    tasks::copy::copy_glob(site.root(), site.fonts(), site.fonts_dir())
                        .await
                        .map(drop)
                }
                LeafTask::Images => {
                    tasks::copy::copy_glob(site.root(), site.images(), site.images_dir())
                        .await
                        .map(drop)
                }
                LeafTask::Stage => {
                    tasks::copy::copy_glob(site.root(), site.build_output(), site.stage_dir())
                        .await
                        .map(drop)
                }
                LeafTask::Watch => watch::serve_and_watch(site, runner).await,
            }
        }
        .boxed()
    }
}
