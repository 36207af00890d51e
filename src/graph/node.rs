// src/graph/node.rs

use std::fmt;

use crate::graph::TaskName;

/// Atomic units of work. Each maps to one leaf body in [`crate::tasks`]
/// (or, for `Watch`, to the dev server + dispatcher).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafTask {
    /// Compile stylesheets to CSS.
    Styles,
    /// Compile templates to HTML.
    Templates,
    /// Copy scripts.
    Scripts,
    /// Copy fonts.
    Fonts,
    /// Copy images.
    Images,
    /// Copy the whole build output to the staging directory.
    Stage,
    /// Start the dev server and watch sources until shutdown.
    Watch,
}

impl LeafTask {
    pub const ALL: [LeafTask; 7] = [
        LeafTask::Styles,
        LeafTask::Templates,
        LeafTask::Scripts,
        LeafTask::Fonts,
        LeafTask::Images,
        LeafTask::Stage,
        LeafTask::Watch,
    ];

    /// Registry name of the task wrapping this leaf.
    pub fn name(self) -> &'static str {
        match self {
            LeafTask::Styles => "style",
            LeafTask::Templates => "genHtml",
            LeafTask::Scripts => "copyJs",
            LeafTask::Fonts => "copyFonts",
            LeafTask::Images => "copyImages",
            LeafTask::Stage => "copyToFirebase",
            LeafTask::Watch => "watch",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            LeafTask::Styles => "compile stylesheets to CSS",
            LeafTask::Templates => "compile templates to HTML",
            LeafTask::Scripts => "copy scripts to the build directory",
            LeafTask::Fonts => "copy fonts to the build directory",
            LeafTask::Images => "copy images to the build directory",
            LeafTask::Stage => "copy the build output to the staging directory",
            LeafTask::Watch => "serve the build with live reload and rebuild on change",
        }
    }
}

impl fmt::Display for LeafTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A node of the task graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskNode {
    Leaf(LeafTask),
    /// Another named task, resolved through the registry at run time.
    Ref(TaskName),
    /// Members run concurrently; joint completion or first failure.
    Parallel(Vec<TaskNode>),
    /// Members run strictly in order; the first failure aborts the rest.
    Series(Vec<TaskNode>),
}

impl TaskNode {
    pub fn reference(name: impl Into<TaskName>) -> Self {
        TaskNode::Ref(name.into())
    }

    pub fn series_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        TaskNode::Series(names.into_iter().map(|n| TaskNode::Ref(n.into())).collect())
    }

    pub fn parallel_of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        TaskNode::Parallel(names.into_iter().map(|n| TaskNode::Ref(n.into())).collect())
    }

    /// Names referenced anywhere below this node.
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TaskNode::Leaf(_) => {}
            TaskNode::Ref(name) => out.push(name.as_str()),
            TaskNode::Parallel(children) | TaskNode::Series(children) => {
                for child in children {
                    child.collect_references(out);
                }
            }
        }
    }
}

impl fmt::Display for TaskNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskNode::Leaf(leaf) => write!(f, "<{}>", leaf.description()),
            TaskNode::Ref(name) => f.write_str(name),
            TaskNode::Parallel(children) => write_group(f, "parallel", children),
            TaskNode::Series(children) => write_group(f, "series", children),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, label: &str, children: &[TaskNode]) -> fmt::Result {
    write!(f, "{label}(")?;
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{child}")?;
    }
    f.write_str(")")
}
