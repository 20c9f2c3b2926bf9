//! Core build logic
//!
//! Everything between a parsed build file and the toolchain invocations.
//! Process spawning and filesystem access go through [`crate::infra`].
//!
//! # Submodules
//!
//! - [`manifest`] - Build file (bake.toml) parsing and validation
//! - [`project`] - Project descriptors and the project graph
//! - [`resolver`] - Dependency ordering, cycle and dangling-id detection
//! - [`staleness`] - Incremental rebuild decisions
//! - [`pipeline`] - Compile, link and archive steps
//! - [`external`] - Externally built sub-projects
//! - [`builder`] - Build orchestration
//! - [`events`] - Progress events for reporters

pub mod builder;
pub mod events;
pub mod external;
pub mod manifest;
pub mod pipeline;
pub mod project;
pub mod resolver;
pub mod staleness;
