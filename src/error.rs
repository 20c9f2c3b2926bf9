//! Error types for bake
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

/// Build file (configuration) errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Build file could not be read
    #[error("Failed to read build file '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// Build file is not valid TOML or has the wrong shape
    #[error("Failed to parse build file: {source}")]
    Parse { source: toml::de::Error },

    /// Missing required field
    #[error("[{section}] is missing required field '{field}'")]
    MissingField { section: String, field: String },

    /// Required field present but empty
    #[error("[{section}] field '{field}' must not be empty")]
    EmptyField { section: String, field: String },

    /// Unknown project type
    #[error("Project '{project}' has invalid type '{kind}' (expected \"exec\" or \"lib\")")]
    InvalidKind { project: String, kind: String },

    /// Listed in `sub` but no matching table
    #[error("Cannot find [{section}.{id}]")]
    NotFound { section: String, id: String },

    /// Same id listed twice
    #[error("Id '{id}' is listed more than once in [{section}].sub")]
    DuplicateId { section: String, id: String },

    /// Malformed `sub` entry
    #[error("Malformed entry in [{section}].sub: {message}")]
    MalformedEntry { section: String, message: String },
}

/// Dependency resolution errors
#[derive(Error, Debug)]
pub enum ResolverError {
    /// Circular dependency detected
    #[error("Circular dependency detected: {}", cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    /// Missing dependency
    #[error("Missing dependency: '{dependency}' required by '{package}'")]
    MissingDependency { package: String, dependency: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Source file does not exist
    #[error("Source file '{path}' does not exist")]
    SourceMissing { path: PathBuf },

    /// Failed to scan a directory
    #[error("Failed to scan directory '{path}': {error}")]
    ReadDir { path: PathBuf, error: String },

    /// Failed to query file metadata
    #[error("Failed to read modification time of '{path}': {error}")]
    Metadata { path: PathBuf, error: String },

    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },
}

/// Toolchain invocation errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// Process exited with a non-zero status
    #[error("'{program}' exited with status {code}, terminating bake")]
    NonZeroExit { program: String, code: i32 },

    /// Process killed by a signal
    #[error("'{program}' was terminated by signal {signal}")]
    Signaled { program: String, signal: i32 },

    /// Process could not be started
    #[error("Failed to run '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Empty argument vector
    #[error("Cannot run an empty command")]
    EmptyCommand,

    /// Compile worker pool could not be started
    #[error("Failed to start {jobs} compile workers: {error}")]
    WorkerPool { jobs: usize, error: String },
}

/// Top-level bake error type
#[derive(Error, Debug)]
pub enum BakeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Resolver error
    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    /// Filesystem error
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// Toolchain failure
    #[error("Toolchain failure in '{project}': {source}")]
    Toolchain {
        project: String,
        #[source]
        source: BuildError,
    },
}
