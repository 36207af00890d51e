// src/graph/registry.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::ConfigFile;
use crate::errors::{Result, SitepipeError};
use crate::graph::node::{LeafTask, TaskNode};
use crate::graph::{DEFAULT_TASK, TaskName};

/// Names reserved by the built-in pipeline.
pub const BUILTIN_TASKS: &[&str] = &[
    "style",
    "genHtml",
    "copyJs",
    "copyFonts",
    "copyImages",
    "copyToFirebase",
    "watch",
    "genFiles",
    "genAssets",
    "build",
    DEFAULT_TASK,
];

#[derive(Debug, Clone)]
struct RegistryEntry {
    node: TaskNode,
    description: Option<String>,
}

/// Explicit name → node mapping for every invocable task.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, RegistryEntry>,
}

impl TaskRegistry {
    /// An empty registry (tests compose their own graphs on top of this).
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in pipeline:
    ///
    /// ```text
    /// genAssets = parallel(copyFonts, copyImages, copyToFirebase)
    /// genFiles  = parallel(style, copyJs)
    /// build     = series(genAssets, genHtml, genFiles, watch)
    /// default   = build
    /// ```
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        for leaf in LeafTask::ALL {
            registry.insert_entry(leaf.name(), TaskNode::Leaf(leaf), Some(leaf.description()));
        }

        registry.insert_entry(
            "genFiles",
            TaskNode::parallel_of(["style", "copyJs"]),
            Some("compile stylesheets and copy scripts"),
        );
        registry.insert_entry(
            "genAssets",
            TaskNode::parallel_of(["copyFonts", "copyImages", "copyToFirebase"]),
            Some("copy fonts and images, stage the build output"),
        );
        registry.insert_entry(
            "build",
            TaskNode::series_of(["genAssets", "genHtml", "genFiles", "watch"]),
            Some("full build, then serve and watch"),
        );
        registry.insert_entry(DEFAULT_TASK, TaskNode::reference("build"), Some("alias of build"));

        registry
    }

    /// Built-ins plus every `[task.<name>]` composite of a validated config.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut registry = Self::builtin();
        for (name, task) in cfg.tasks() {
            let node = if task.series.is_empty() {
                TaskNode::parallel_of(task.parallel.iter().cloned())
            } else {
                TaskNode::series_of(task.series.iter().cloned())
            };
            registry.insert_entry(name, node, task.description.as_deref());
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Add (or replace) a task. Call [`TaskRegistry::validate`] once the
    /// registry is complete.
    pub fn insert(&mut self, name: impl Into<TaskName>, node: TaskNode) -> &mut Self {
        self.tasks.insert(
            name.into(),
            RegistryEntry {
                node,
                description: None,
            },
        );
        self
    }

    fn insert_entry(&mut self, name: &str, node: TaskNode, description: Option<&str>) {
        self.tasks.insert(
            name.to_string(),
            RegistryEntry {
                node,
                description: description.map(str::to_string),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&TaskNode> {
        self.tasks.get(name).map(|e| &e.node)
    }

    /// Like [`TaskRegistry::get`], but an unknown name is an error.
    pub fn resolve(&self, name: &str) -> Result<&TaskNode> {
        self.get(name)
            .ok_or_else(|| SitepipeError::TaskNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn description_of(&self, name: &str) -> Option<&str> {
        self.tasks.get(name).and_then(|e| e.description.as_deref())
    }

    /// Check that every reference resolves and that references form a DAG.
    pub fn validate(&self) -> Result<()> {
        // Edge direction: referencing task -> referenced task.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for (name, entry) in self.tasks.iter() {
            graph.add_node(name.as_str());
            for dep in entry.node.references() {
                if !self.tasks.contains_key(dep) {
                    return Err(SitepipeError::ConfigError(format!(
                        "task '{name}' refers to unknown task '{dep}'"
                    )));
                }
                graph.add_edge(name.as_str(), dep, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(SitepipeError::TaskCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }
}
