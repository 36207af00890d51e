// src/graph/mod.rs

//! Task graph: named tasks composed from leaves with series/parallel
//! combinators.
//!
//! - [`node`] defines the graph node types and the leaf task set.
//! - [`registry`] maps task names to nodes (built-ins plus `[task.*]`
//!   composites) and rejects unknown references and cycles.
//! - [`runner`] executes nodes, delegating leaves to a
//!   [`TaskExecutor`](crate::exec::TaskExecutor).

pub mod node;
pub mod registry;
pub mod runner;

pub use node::{LeafTask, TaskNode};
pub use registry::{BUILTIN_TASKS, TaskRegistry};
pub use runner::GraphRunner;

/// Canonical task name type used throughout the graph.
pub type TaskName = String;

/// Task run when the CLI is given no task name.
pub const DEFAULT_TASK: &str = "default";
