// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{Result, SitepipeError};
use crate::graph::GraphRunner;
use crate::server::DevServer;
use crate::site::Site;
use crate::watch::dispatcher::{Dispatcher, WatchEvent};
use crate::watch::path_utils::watch_roots;
use crate::watch::patterns::site_bindings;

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `dirs` recursively and forward content changes as
/// [`WatchEvent::Changed`].
pub fn spawn_watcher(
    dirs: &[PathBuf],
    events_tx: mpsc::UnboundedSender<WatchEvent>,
) -> Result<WatcherHandle> {
    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if !is_content_change(&event.kind) {
                    return;
                }
                if events_tx.send(WatchEvent::Changed(event.paths)).is_err() {
                    debug!("dispatcher gone; dropping notify event");
                }
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )?;

    for dir in dirs {
        watcher.watch(dir, RecursiveMode::Recursive)?;
        info!("file watcher started on {:?}", dir);
    }

    Ok(WatcherHandle { _inner: watcher })
}

/// Creates, removals, renames and data writes. Access and metadata-only
/// events never trigger a rebuild.
pub fn is_content_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(_) | EventKind::Other => false,
    }
}

/// The `watch` leaf: start the dev server on the build directory, watch the
/// source globs and re-run bound tasks until Ctrl-C.
pub async fn serve_and_watch(site: Arc<Site>, runner: GraphRunner) -> Result<()> {
    serve_and_watch_until(site, runner, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// [`serve_and_watch`], stopping when `shutdown` completes instead of on
/// Ctrl-C.
pub async fn serve_and_watch_until<F>(
    site: Arc<Site>,
    runner: GraphRunner,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let bindings = site_bindings(&site);
    let dirs = watch_roots(site.root(), bindings.iter().map(|b| b.glob().base()));
    if dirs.is_empty() {
        return Err(SitepipeError::ConfigError(format!(
            "nothing to watch: no source directory exists under {:?}",
            site.root()
        )));
    }

    // `watch` may run before anything was built.
    tokio::fs::create_dir_all(site.build_dir()).await?;
    let server = DevServer::new(site.build_dir(), site.server()).start().await?;
    info!(url = %server.url(), "dev server listening");

    let (events_tx, events_rx) = mpsc::unbounded_channel::<WatchEvent>();
    let _watcher = match spawn_watcher(&dirs, events_tx.clone()) {
        Ok(handle) => handle,
        Err(err) => {
            server.shutdown().await;
            return Err(err);
        }
    };

    {
        let tx = events_tx.clone();
        tokio::spawn(async move {
            shutdown.await;
            let _ = tx.send(WatchEvent::Shutdown);
        });
    }
    drop(events_tx);

    let dispatcher = Dispatcher::new(
        site.root(),
        bindings,
        runner,
        Some(server.reload_handle()),
    );
    let result = dispatcher.run(events_rx).await;

    server.shutdown().await;
    result
}
