// src/server/reload.rs

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

/// A push notification to connected browsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadSignal {
    /// Reload the page.
    Reload,
    /// Re-fetch stylesheets without reloading.
    InjectCss,
}

impl ReloadSignal {
    /// SSE event name understood by the client script.
    pub fn event_name(self) -> &'static str {
        match self {
            ReloadSignal::Reload => "reload",
            ReloadSignal::InjectCss => "css",
        }
    }
}

/// Cloneable sender side of the live-reload channel.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: broadcast::Sender<ReloadSignal>,
}

impl Default for ReloadHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadHandle {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Push a signal to every connected client. Returns how many received
    /// it; zero clients is not an error.
    pub fn send(&self, signal: ReloadSignal) -> usize {
        self.tx.send(signal).unwrap_or(0)
    }

    pub fn inject_css(&self) -> usize {
        self.send(ReloadSignal::InjectCss)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadSignal> {
        self.tx.subscribe()
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
