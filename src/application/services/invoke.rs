//! Juju command execution: capture-and-classify and run-and-check.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::process::{ExitStatus, Output};

use crate::application::ports::{CommandRunner, ProgressReporter};
use crate::domain::{CommandLine, JujuError, ProcessFailure};

/// Run `command` capturing its output and return stdout.
///
/// A non-zero exit is classified: stderr carrying a connectivity marker
/// becomes [`JujuError::CannotConnect`]; anything else is reported through
/// `reporter` and returned as [`JujuError::CommandFailed`].
///
/// # Errors
///
/// Returns an error if the process cannot be spawned or exits non-zero.
pub async fn capture(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    command: &CommandLine,
) -> Result<String, JujuError> {
    tracing::debug!(%command, "capturing juju output");
    let output = runner.run(command).await?;
    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
    }
    let err = JujuError::from_failure(failure(command, &output));
    if let JujuError::CommandFailed(failure) = &err {
        reporter.warn(&format!("!!! {}", failure.stderr.trim_end()));
    }
    Err(err)
}

/// Echo `command`, run it with inherited stdio, and return its exit status.
///
/// With `check` set a non-zero exit is an error; without it the raw status
/// is returned so the caller can tolerate failure.
///
/// # Errors
///
/// Returns an error if the process cannot be spawned, or if `check` is set
/// and the process exits non-zero.
pub async fn run_checked(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    command: &CommandLine,
    check: bool,
) -> Result<ExitStatus, JujuError> {
    reporter.step(&command.to_string());
    let status = runner.run_status(command).await?;
    tracing::debug!(%command, code = ?status.code(), "juju exited");
    if check && !status.success() {
        return Err(JujuError::CommandFailed(ProcessFailure {
            command: command.to_string(),
            code: status.code(),
            output: String::new(),
            stderr: String::new(),
        }));
    }
    Ok(status)
}

fn failure(command: &CommandLine, output: &Output) -> ProcessFailure {
    ProcessFailure {
        command: command.to_string(),
        code: output.status.code(),
        output: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
