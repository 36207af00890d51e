#![allow(dead_code)]

use std::sync::Arc;

use sitepipe::config::ConfigFile;
use sitepipe::exec::PipelineExecutor;
use sitepipe::graph::{GraphRunner, TaskRegistry};
use sitepipe_test_utils::builders::SiteFixture;
use sitepipe_test_utils::fake_executor::FakeExecutor;

/// Built-in registry driven by a fake executor.
pub fn fake_runner(fake: &FakeExecutor) -> GraphRunner {
    GraphRunner::new(TaskRegistry::builtin(), Arc::new(fake.clone()))
}

/// Registry from `cfg` driven by the real pipeline against `fixture`.
pub fn pipeline_runner(fixture: &SiteFixture, cfg: &ConfigFile) -> GraphRunner {
    let registry = TaskRegistry::from_config(cfg).expect("valid registry");
    let site = fixture.site(cfg);
    GraphRunner::new(registry, Arc::new(PipelineExecutor::new(site)))
}
