//! Bake - minimal native-code build orchestrator
//!
//! Reads a declarative build file, works out which C translation units are
//! stale, compiles them and links the results into executables or static
//! archives, honoring inter-project dependencies and external sub-builds.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and console reporting
//! - [`core`] - Build logic: graph, staleness, pipeline, orchestration
//! - [`infra`] - Infrastructure layer (filesystem, processes)
//! - [`config`] - Configuration constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;
