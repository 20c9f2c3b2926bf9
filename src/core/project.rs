//! Project descriptors and the project graph
//!
//! The graph owns every project of a run. Build state (`built`, `cleaned`)
//! lives beside the descriptors and is only ever changed through the graph,
//! so every dependent sees the same memoized state.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;

/// What a project produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// Linked executable
    Exec,
    /// Static archive
    Lib,
}

impl ProjectKind {
    /// Parse the `type` field of a project table
    pub fn parse(project: &str, kind: &str) -> Result<Self, ConfigError> {
        match kind {
            "exec" => Ok(Self::Exec),
            "lib" => Ok(Self::Lib),
            other => Err(ConfigError::InvalidKind {
                project: project.to_string(),
                kind: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exec => write!(f, "exec"),
            Self::Lib => write!(f, "lib"),
        }
    }
}

/// One buildable project, immutable for the duration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Unique key, referenced by `deps`
    pub id: String,
    /// Name shown to the user
    pub display_name: String,
    /// Executable or library
    pub kind: ProjectKind,
    /// Directory scanned for `.c` files
    pub source_dir: PathBuf,
    /// Directory receiving objects and the final artifact
    pub output_dir: PathBuf,
    /// File name of the final artifact
    pub output_name: String,
    pub compile_flags: Vec<String>,
    pub include_flags: Vec<String>,
    pub link_flags: Vec<String>,
    /// Ids of projects that must be built first, in visiting order
    pub dependency_ids: Vec<String>,
}

impl ProjectDescriptor {
    /// Path of the linked executable or archive
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_name)
    }
}

/// A build delegated to a user-supplied command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalStepDescriptor {
    pub id: String,
    pub display_name: String,
    /// Directory relative to `base_location` the command runs in
    pub working_dir_relative: PathBuf,
    pub base_location: PathBuf,
    /// Program and arguments; empty means nothing to run
    pub command_argv: Vec<String>,
}

impl ExternalStepDescriptor {
    /// Directory the command runs in
    pub fn working_dir(&self) -> PathBuf {
        self.base_location.join(&self.working_dir_relative)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct BuildState {
    built: bool,
    cleaned: bool,
}

/// Owned collection of projects indexed by id
#[derive(Debug, Default)]
pub struct ProjectGraph {
    projects: Vec<ProjectDescriptor>,
    state: Vec<BuildState>,
    index: HashMap<String, usize>,
}

impl ProjectGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a project, returning its node index
    pub fn insert(&mut self, project: ProjectDescriptor) -> Result<usize, ConfigError> {
        if self.index.contains_key(&project.id) {
            return Err(ConfigError::DuplicateId {
                section: "project".to_string(),
                id: project.id,
            });
        }
        let node = self.projects.len();
        self.index.insert(project.id.clone(), node);
        self.projects.push(project);
        self.state.push(BuildState::default());
        Ok(node)
    }

    /// Number of projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Whether the graph has no projects
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Project at `node`
    ///
    /// Panics if `node` was not returned by [`ProjectGraph::insert`].
    pub fn get(&self, node: usize) -> &ProjectDescriptor {
        &self.projects[node]
    }

    /// Node index of the project with `id`
    pub fn find(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn is_built(&self, node: usize) -> bool {
        self.state[node].built
    }

    /// Record that `node` has been fully built; returns false if it already was
    pub fn mark_built(&mut self, node: usize) -> bool {
        let state = &mut self.state[node];
        if state.built {
            return false;
        }
        state.built = true;
        true
    }

    pub fn is_cleaned(&self, node: usize) -> bool {
        self.state[node].cleaned
    }

    /// Record that per-build resources of `node` were released; returns false
    /// if that already happened
    pub fn mark_cleaned(&mut self, node: usize) -> bool {
        let state = &mut self.state[node];
        if state.cleaned {
            return false;
        }
        state.cleaned = true;
        true
    }
}
