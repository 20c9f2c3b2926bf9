//! Process execution
//!
//! Runs one external command to completion with inherited standard streams
//! and classifies how it ended.

use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::BuildError;

/// How a child process terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// Exit status zero
    Success,
    /// Non-zero exit status
    NonZeroExit(i32),
    /// Killed by a signal before exiting
    TerminatedBySignal(i32),
}

impl ExitOutcome {
    /// Classify a raw exit status
    pub fn from_status(status: ExitStatus) -> Self {
        if status.success() {
            return Self::Success;
        }
        if let Some(code) = status.code() {
            return Self::NonZeroExit(code);
        }
        Self::TerminatedBySignal(signal_of(status))
    }

    /// Turn a failed outcome into an error naming `program`
    pub fn into_result(self, program: &str) -> Result<(), BuildError> {
        match self {
            Self::Success => Ok(()),
            Self::NonZeroExit(code) => Err(BuildError::NonZeroExit {
                program: program.to_string(),
                code,
            }),
            Self::TerminatedBySignal(signal) => Err(BuildError::Signaled {
                program: program.to_string(),
                signal,
            }),
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::NonZeroExit(code) => write!(f, "exit status {code}"),
            Self::TerminatedBySignal(signal) => write!(f, "signal {signal}"),
        }
    }
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status.signal().unwrap_or(-1)
}

#[cfg(not(unix))]
fn signal_of(_status: ExitStatus) -> i32 {
    -1
}

/// Capability to run one command and wait for it
///
/// Implementations must be shareable across compile workers.
pub trait CommandRunner: Send + Sync {
    /// Run `argv` (program first) in `cwd`, or the current directory when `None`
    fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<ExitOutcome, BuildError>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<ExitOutcome, BuildError> {
        let (program, args) = argv.split_first().ok_or(BuildError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        tracing::debug!(?argv, ?cwd, "spawning process");

        let status = cmd.status().map_err(|e| BuildError::Spawn {
            program: program.clone(),
            error: e.to_string(),
        })?;
        let outcome = ExitOutcome::from_status(status);

        tracing::debug!(program = %program, %outcome, "process finished");
        Ok(outcome)
    }
}
