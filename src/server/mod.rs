// src/server/mod.rs

//! Live-reload dev server.
//!
//! - [`reload`]: the signal type and the cloneable handle tasks use to push
//!   signals to connected browsers.
//! - [`assets`]: static file serving with client-script injection, and the
//!   client script itself.
//!
//! The server is an explicit object: [`DevServer::start`] binds, spawns the
//! accept loop and returns a [`ServerHandle`]. Nothing is global.

pub mod assets;
pub mod reload;

use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use futures::stream::{self, Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ServerSection;
use crate::errors::{Result, SitepipeError};

pub use reload::{ReloadHandle, ReloadSignal};

/// Server-sent events stream of reload signals.
pub const EVENTS_PATH: &str = "/__sitepipe/events";
/// The live-reload client script.
pub const CLIENT_PATH: &str = "/__sitepipe/client.js";

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Shared state of the HTTP handlers.
#[derive(Debug)]
pub(crate) struct ServerState {
    root: PathBuf,
    index: String,
    reload: ReloadHandle,
    closing: watch::Receiver<bool>,
}

/// Configuration of a server that is not started yet.
#[derive(Debug, Clone)]
pub struct DevServer {
    root: PathBuf,
    settings: ServerSection,
}

impl DevServer {
    pub fn new(root: impl AsRef<Path>, settings: &ServerSection) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            settings: settings.clone(),
        }
    }

    /// Bind and start serving in the background.
    ///
    /// Fails if the root directory is missing or the address cannot be bound.
    pub async fn start(self) -> Result<ServerHandle> {
        if !self.root.is_dir() {
            return Err(SitepipeError::Server(format!(
                "root directory {:?} does not exist",
                self.root
            )));
        }

        let host = self.settings.host.as_str();
        let port = self.settings.port;
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|e| SitepipeError::Server(format!("cannot listen on {host}:{port}: {e}")))?;
        let addr = listener.local_addr()?;

        let reload = ReloadHandle::new();
        let (closing_tx, closing_rx) = watch::channel(false);

        let state = Arc::new(ServerState {
            root: self.root.clone(),
            index: self.settings.index.clone(),
            reload: reload.clone(),
            closing: closing_rx.clone(),
        });
        let app = router(state);

        let mut shutdown_rx = closing_rx;
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.wait_for(|closing| *closing).await;
                })
                .await;
            if let Err(err) = served {
                error!(error = %err, "dev server stopped with an error");
            }
        });

        info!(%addr, root = ?self.root, index = %self.settings.index, "dev server started");

        Ok(ServerHandle {
            addr,
            reload,
            closing: closing_tx,
            task,
        })
    }
}

/// A running dev server.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    reload: ReloadHandle,
    closing: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn reload_handle(&self) -> ReloadHandle {
        self.reload.clone()
    }

    /// Close event streams, stop accepting connections and wait for the
    /// accept loop to finish.
    pub async fn shutdown(self) {
        let _ = self.closing.send(true);
        match tokio::time::timeout(SHUTDOWN_GRACE, self.task).await {
            Ok(Ok(())) => debug!("dev server shut down"),
            Ok(Err(err)) => warn!(error = %err, "dev server task failed"),
            Err(_) => warn!("dev server did not shut down in time"),
        }
    }
}

fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route(EVENTS_PATH, get(events))
        .route(CLIENT_PATH, get(assets::client_script))
        .fallback(assets::serve_static)
        .with_state(state)
}

/// One subscription per client; ends when the server shuts down.
async fn events(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let signals = state.reload.subscribe();
    debug!(clients = state.reload.client_count(), "live-reload client connected");

    let stream = stream::unfold(signals, |mut signals| async move {
        loop {
            match signals.recv().await {
                Ok(signal) => {
                    let event = Event::default().event(signal.event_name()).data(signal.event_name());
                    return Some((Ok(event), signals));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "live-reload client lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    let mut closing = state.closing.clone();
    let stream = stream.take_until(async move {
        let _ = closing.wait_for(|closing| *closing).await;
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
