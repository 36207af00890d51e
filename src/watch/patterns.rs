// src/watch/patterns.rs

use std::fmt;

use crate::graph::{LeafTask, TaskName};
use crate::server::ReloadSignal;
use crate::site::Site;
use crate::sources::SourceGlob;

/// What to push to dev-server clients after a bound task succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    /// Nothing beyond re-running the task.
    None,
    /// Full page reload.
    Reload,
    /// Swap stylesheets in place.
    InjectCss,
}

impl Reaction {
    pub fn signal(self) -> Option<ReloadSignal> {
        match self {
            Reaction::None => None,
            Reaction::Reload => Some(ReloadSignal::Reload),
            Reaction::InjectCss => Some(ReloadSignal::InjectCss),
        }
    }
}

/// A glob bound to the task it re-runs.
#[derive(Clone)]
pub struct WatchBinding {
    glob: SourceGlob,
    task: TaskName,
    reaction: Reaction,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("pattern", &self.glob.pattern())
            .field("task", &self.task)
            .field("reaction", &self.reaction)
            .finish()
    }
}

impl WatchBinding {
    pub fn new(glob: SourceGlob, task: impl Into<TaskName>, reaction: Reaction) -> Self {
        Self {
            glob,
            task: task.into(),
            reaction,
        }
    }

    pub fn glob(&self) -> &SourceGlob {
        &self.glob
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    pub fn reaction(&self) -> Reaction {
        self.reaction
    }

    /// Whether a root-relative path (e.g. `"src/pages/index.pug"`) belongs to
    /// this binding.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.glob.matches(rel_path)
    }
}

/// The built-in bindings:
///
/// | glob      | task         | reaction  |
/// |-----------|--------------|-----------|
/// | styles    | `style`      | inject CSS|
/// | templates | `genHtml`    | reload    |
/// | scripts   | `copyJs`     | reload    |
/// | fonts     | `copyFonts`  | reload    |
/// | images    | `copyImages` | reload    |
pub fn site_bindings(site: &Site) -> Vec<WatchBinding> {
    vec![
        WatchBinding::new(site.styles().clone(), LeafTask::Styles.name(), Reaction::InjectCss),
        WatchBinding::new(site.templates().clone(), LeafTask::Templates.name(), Reaction::Reload),
        WatchBinding::new(site.scripts().clone(), LeafTask::Scripts.name(), Reaction::Reload),
        WatchBinding::new(site.fonts().clone(), LeafTask::Fonts.name(), Reaction::Reload),
        WatchBinding::new(site.images().clone(), LeafTask::Images.name(), Reaction::Reload),
    ]
}
