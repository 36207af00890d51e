// src/watch/mod.rs

//! File watching and change dispatch.
//!
//! This module is responsible for:
//! - Binding source globs to the task each one re-runs ([`patterns`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) that feeds a
//!   channel ([`watcher`]).
//! - Consuming that channel, running bound tasks and pushing reload signals
//!   to the dev server ([`dispatcher`]).

pub mod dispatcher;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use dispatcher::{Dispatcher, WatchEvent};
pub use patterns::{Reaction, WatchBinding, site_bindings};
pub use watcher::{
    WatcherHandle, is_content_change, serve_and_watch, serve_and_watch_until, spawn_watcher,
};
