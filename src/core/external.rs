//! External build steps
//!
//! Runs user-supplied commands (vendored `make`, `cmake --build`, ...) in
//! their own working directory. The directory is handed to the spawned
//! process; the orchestrator's own working directory never changes.

use crate::core::events::{BuildEvent, Reporter};
use crate::core::project::ExternalStepDescriptor;
use crate::error::BakeError;
use crate::infra::process::CommandRunner;

/// Run one external step to completion
///
/// A step with an empty command is a no-op: its build is handled elsewhere.
pub fn run_external_step(
    step: &ExternalStepDescriptor,
    runner: &dyn CommandRunner,
    reporter: &dyn Reporter,
) -> Result<(), BakeError> {
    reporter.report(&BuildEvent::ExternalStarted {
        name: step.display_name.clone(),
    });

    let Some(program) = step.command_argv.first() else {
        tracing::info!("External step '{}' has no command, skipping", step.id);
        return Ok(());
    };

    let cwd = step.working_dir();
    tracing::info!("Running external step '{}' in {}", step.id, cwd.display());

    runner
        .run(&step.command_argv, Some(&cwd))
        .and_then(|outcome| outcome.into_result(program))
        .map_err(|source| BakeError::Toolchain {
            project: step.display_name.clone(),
            source,
        })
}
