//! Build progress events
//!
//! The orchestrator announces step boundaries through a [`Reporter`];
//! rendering is left entirely to the implementation.

use std::path::PathBuf;

/// A step boundary in a build run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    /// An external step is about to run
    ExternalStarted { name: String },
    /// A top-level project that was not already built is starting
    ProjectStarted { name: String },
    /// A dependency is being built on behalf of a dependent
    DependencyFetched { name: String },
    /// About to compile unit `index` (1-based) of `total`
    Compiling {
        project: String,
        index: usize,
        total: usize,
        source: PathBuf,
    },
    /// No unit of the project needed recompiling
    UpToDate { project: String },
    /// Link or archive step is starting
    Linking { project: String },
    /// A top-level project and its dependencies are done
    ProjectFinished { name: String },
}

/// Receives build events
///
/// Compile workers may report concurrently.
pub trait Reporter: Send + Sync {
    /// Handle one event
    fn report(&self, event: &BuildEvent);
}
