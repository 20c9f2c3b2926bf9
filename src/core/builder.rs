//! Build orchestration logic
//!
//! Runs every external step, then builds every listed project with its
//! dependencies first. Any failure ends the run.

use crate::core::events::{BuildEvent, Reporter};
use crate::core::external::run_external_step;
use crate::core::pipeline::Pipeline;
use crate::core::project::{ExternalStepDescriptor, ProjectGraph};
use crate::core::resolver;
use crate::error::BakeError;
use crate::infra::process::CommandRunner;
use crate::infra::toolchain::Toolchain;

/// Build orchestrator state
pub struct BuildOrchestrator<'a> {
    toolchain: Toolchain,
    graph: ProjectGraph,
    externals: Vec<ExternalStepDescriptor>,
    runner: &'a dyn CommandRunner,
    reporter: &'a dyn Reporter,
    jobs: usize,
}

impl<'a> BuildOrchestrator<'a> {
    /// Create a new build orchestrator
    pub fn new(
        toolchain: Toolchain,
        graph: ProjectGraph,
        runner: &'a dyn CommandRunner,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            toolchain,
            graph,
            externals: Vec::new(),
            runner,
            reporter,
            jobs: 1,
        }
    }

    /// Set the external steps, run in order before any project
    #[must_use]
    pub fn with_externals(mut self, externals: Vec<ExternalStepDescriptor>) -> Self {
        self.externals = externals;
        self
    }

    /// Set the number of compile workers per project
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// The project graph and its build state
    pub fn graph(&self) -> &ProjectGraph {
        &self.graph
    }

    /// Run the whole build
    pub fn run(&mut self) -> Result<(), BakeError> {
        resolver::validate(&self.graph)?;

        for step in &self.externals {
            run_external_step(step, self.runner, self.reporter)?;
        }

        for node in 0..self.graph.len() {
            self.build_top_level(node)?;
        }
        Ok(())
    }

    fn build_top_level(&mut self, node: usize) -> Result<(), BakeError> {
        if self.graph.is_built(node) {
            tracing::debug!("{} already built as a dependency", self.graph.get(node).id);
            release(&mut self.graph, node);
            return Ok(());
        }

        let name = self.graph.get(node).display_name.clone();
        self.reporter
            .report(&BuildEvent::ProjectStarted { name: name.clone() });

        self.build_project(node)?;

        self.reporter.report(&BuildEvent::ProjectFinished { name });
        Ok(())
    }

    /// Build `node` after every dependency it has not yet had built
    pub fn build_project(&mut self, node: usize) -> Result<(), BakeError> {
        let order = resolver::build_order(&self.graph, node)?;
        let pipeline =
            Pipeline::new(&self.toolchain, self.runner, self.reporter).with_jobs(self.jobs);

        for current in order {
            let project = self.graph.get(current);
            if current != node {
                self.reporter.report(&BuildEvent::DependencyFetched {
                    name: project.display_name.clone(),
                });
            }
            tracing::info!("Building {} ({})", project.id, project.kind);

            pipeline.build(project)?;

            self.graph.mark_built(current);
            release(&mut self.graph, current);
        }
        Ok(())
    }
}

/// Mark the per-build state of `node` released, once
fn release(graph: &mut ProjectGraph, node: usize) {
    if graph.mark_cleaned(node) {
        tracing::debug!("Released build state of {}", graph.get(node).id);
    }
}
