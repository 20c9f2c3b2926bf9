//! Build file (bake.toml) parsing and validation
//!
//! The build file names the toolchain, the projects to build and any
//! external steps. Parsing is a two-stage affair: serde maps the TOML onto
//! loosely typed sections, then [`Bakefile::into_plan`] checks required
//! fields and produces the descriptors the orchestrator works on.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::project::{ExternalStepDescriptor, ProjectDescriptor, ProjectGraph, ProjectKind};
use crate::error::ConfigError;
use crate::infra::toolchain::Toolchain;

/// The whole build file
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Bakefile {
    /// Toolchain command names
    pub config: Option<ToolchainSection>,

    /// Projects and their build order
    pub project: Option<Section<ProjectEntry>>,

    /// External steps
    #[serde(default)]
    pub ext: Option<Section<ExternalEntry>>,
}

/// `[config]`
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ToolchainSection {
    pub cc: Option<String>,
    #[serde(rename = "as")]
    pub assembler: Option<String>,
    pub ld: Option<String>,
}

/// A namespace holding an ordered `sub` list of `[display name, id]` pairs
/// plus one table per id
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Section<T> {
    /// Active entries, in build order
    pub sub: Option<Vec<(String, String)>>,

    /// Entry tables keyed by id
    #[serde(flatten)]
    pub entries: BTreeMap<String, T>,
}

/// `[project.<id>]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProjectEntry {
    /// `"exec"` or `"lib"`
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Source directory
    pub srcs: Option<String>,
    /// Output directory
    pub bin: Option<String>,
    /// Output file name
    pub binname: Option<String>,
    #[serde(default)]
    pub ccflags: Vec<String>,
    #[serde(default)]
    pub incflags: Vec<String>,
    /// `[""]` means no link flags
    #[serde(default)]
    pub ldflags: Vec<String>,
    #[serde(default)]
    pub deps: Vec<String>,
}

/// `[ext.<id>]`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExternalEntry {
    /// Working directory, relative to `loc`
    #[serde(default = "default_dir")]
    pub chdir: String,
    #[serde(default = "default_dir")]
    pub loc: String,
    /// Program and arguments
    #[serde(default)]
    pub buildcmd: Vec<String>,
}

fn default_dir() -> String {
    ".".to_string()
}

/// Everything the orchestrator needs, validated
#[derive(Debug)]
pub struct BuildPlan {
    pub toolchain: Toolchain,
    pub graph: ProjectGraph,
    pub externals: Vec<ExternalStepDescriptor>,
}

fn required(section: &str, field: &str, value: Option<String>) -> Result<String, ConfigError> {
    match value {
        None => Err(ConfigError::MissingField {
            section: section.to_string(),
            field: field.to_string(),
        }),
        Some(v) if v.is_empty() => Err(ConfigError::EmptyField {
            section: section.to_string(),
            field: field.to_string(),
        }),
        Some(v) => Ok(v),
    }
}

/// Check `sub` for duplicate and empty ids, returning the pairs in order
fn active_entries(section: &str, sub: Vec<(String, String)>) -> Result<Vec<(String, String)>, ConfigError> {
    let mut seen = std::collections::HashSet::new();
    for (_, id) in &sub {
        if id.is_empty() {
            return Err(ConfigError::MalformedEntry {
                section: section.to_string(),
                message: "empty id".to_string(),
            });
        }
        if !seen.insert(id.clone()) {
            return Err(ConfigError::DuplicateId {
                section: section.to_string(),
                id: id.clone(),
            });
        }
    }
    Ok(sub)
}

/// Entries named in `sub`, as `(display name, id, table)` in listed order
///
/// Tables that `sub` does not name are ignored.
fn listed_entries<T>(name: &str, section: Section<T>) -> Result<Vec<(String, String, T)>, ConfigError> {
    let sub = section.sub.ok_or_else(|| ConfigError::MissingField {
        section: name.to_string(),
        field: "sub".to_string(),
    })?;
    let mut entries = section.entries;
    let mut listed = Vec::new();
    for (display_name, id) in active_entries(name, sub)? {
        let entry = entries.remove(&id).ok_or_else(|| ConfigError::NotFound {
            section: name.to_string(),
            id: id.clone(),
        })?;
        listed.push((display_name, id, entry));
    }
    for unlisted in entries.keys() {
        tracing::debug!("[{name}.{unlisted}] is not listed in {name}.sub, ignoring");
    }
    Ok(listed)
}

impl Bakefile {
    /// Load build file from path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Load build file from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse { source })
    }

    /// Validate and convert into descriptors
    pub fn into_plan(self) -> Result<BuildPlan, ConfigError> {
        let config = self.config.ok_or_else(|| ConfigError::MissingField {
            section: "config".to_string(),
            field: "cc".to_string(),
        })?;
        let toolchain = Toolchain::new(
            required("config", "cc", config.cc)?,
            required("config", "as", config.assembler)?,
            required("config", "ld", config.ld)?,
        );

        let projects = self.project.ok_or_else(|| ConfigError::MissingField {
            section: "project".to_string(),
            field: "sub".to_string(),
        })?;
        let mut graph = ProjectGraph::new();
        for (display_name, id, entry) in listed_entries("project", projects)? {
            graph.insert(project_descriptor(id, display_name, entry)?)?;
        }

        let mut externals = Vec::new();
        if let Some(ext) = self.ext {
            for (display_name, id, entry) in listed_entries("ext", ext)? {
                externals.push(ExternalStepDescriptor {
                    id,
                    display_name,
                    working_dir_relative: PathBuf::from(entry.chdir),
                    base_location: PathBuf::from(entry.loc),
                    command_argv: entry.buildcmd,
                });
            }
        }

        Ok(BuildPlan {
            toolchain,
            graph,
            externals,
        })
    }
}

fn project_descriptor(
    id: String,
    display_name: String,
    entry: ProjectEntry,
) -> Result<ProjectDescriptor, ConfigError> {
    let section = format!("project.{id}");
    let kind = required(&section, "type", entry.kind)?;
    Ok(ProjectDescriptor {
        kind: ProjectKind::parse(&id, &kind)?,
        source_dir: PathBuf::from(required(&section, "srcs", entry.srcs)?),
        output_dir: PathBuf::from(required(&section, "bin", entry.bin)?),
        output_name: required(&section, "binname", entry.binname)?,
        compile_flags: entry.ccflags,
        include_flags: entry.incflags,
        link_flags: normalize_link_flags(entry.ldflags),
        dependency_ids: entry.deps,
        id,
        display_name,
    })
}

/// `[""]` is the conventional spelling of "no link flags"
fn normalize_link_flags(flags: Vec<String>) -> Vec<String> {
    match flags.as_slice() {
        [only] if only.is_empty() => Vec::new(),
        _ => flags,
    }
}

/// Load, parse and validate a build file
pub fn load_plan(path: &Path) -> Result<BuildPlan, ConfigError> {
    Bakefile::load(path)?.into_plan()
}
