//! Command-line interface module
//!
//! This module handles argument parsing and console output.
//! It contains no build logic - that belongs in the [`crate::core`] module.

pub mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::defaults::{DEFAULT_BUILD_FILE, DEFAULT_BUILD_JOBS};
use crate::core::builder::BuildOrchestrator;
use crate::core::manifest::load_plan;
use crate::infra::process::SystemRunner;
use output::ConsoleReporter;

/// Bake - minimal native-code build orchestrator
///
/// Compiles the stale C sources of every project in the build file and
/// links them into executables or static archives.
#[derive(Parser, Debug)]
#[command(name = "bake")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Build file to read
    #[arg(value_name = "BUILD_FILE")]
    pub build_file: Option<PathBuf>,

    /// Compile up to N units of a project in parallel (0 = one per CPU)
    #[arg(short, long, value_name = "N", env = "BAKE_JOBS")]
    pub jobs: Option<usize>,

    /// Enable verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Build file path, falling back to the conventional name
    pub fn build_file(&self) -> PathBuf {
        self.build_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_FILE))
    }

    /// Number of compile workers
    pub fn jobs(&self) -> usize {
        match self.jobs {
            None => DEFAULT_BUILD_JOBS,
            Some(0) => num_cpus::get(),
            Some(n) => n,
        }
    }

    /// Execute the build
    pub fn run(self) -> Result<()> {
        let path = self.build_file();
        if !self.quiet {
            output::print_banner(env!("CARGO_PKG_VERSION"));
            output::print_build_file(&path);
        }

        let plan = load_plan(&path)
            .with_context(|| format!("Failed to load build file {}", path.display()))?;

        let jobs = self.jobs();
        tracing::info!(
            "Building {} projects and {} external steps with {} jobs",
            plan.graph.len(),
            plan.externals.len(),
            jobs
        );

        let reporter = ConsoleReporter::new(self.quiet);
        BuildOrchestrator::new(plan.toolchain, plan.graph, &SystemRunner, &reporter)
            .with_externals(plan.externals)
            .with_jobs(jobs)
            .run()?;

        reporter.print_done();
        Ok(())
    }
}
