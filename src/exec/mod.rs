// src/exec/mod.rs

//! Leaf execution layer.
//!
//! The graph runner never touches the filesystem itself; it hands each leaf
//! to a [`TaskExecutor`].
//!
//! - [`backend`] provides the `TaskExecutor` trait and the production
//!   `PipelineExecutor`, which dispatches leaves to [`crate::tasks`] and, for
//!   `watch`, to the dev server + dispatcher. Tests replace it with a fake
//!   implementation.

pub mod backend;

pub use backend::{PipelineExecutor, TaskExecutor};
