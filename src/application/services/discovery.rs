//! Locating the juju binary and reading its version.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::application::ports::{CommandRunner, ProgressReporter};
use crate::application::services::invoke::capture;
use crate::domain::{CommandLine, JujuError, ToolBinding, ToolVersion};

/// Fixed install location of the Windows client.
pub const WIN_JUJU_CMD: &str = r"\Progra~2\Juju\juju.exe";

/// Resolve the juju to drive: its version and absolute path.
///
/// With `juju_path` the given binary is queried and its path made
/// absolute; otherwise `juju` is looked up on `PATH`.
///
/// # Errors
///
/// Returns [`JujuError::UnsupportedVersion`] before anything else runs if
/// the tool is too old, or an error if either probe fails.
pub async fn discover(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    juju_path: Option<&Path>,
) -> Result<ToolBinding, JujuError> {
    let version = get_version(runner, reporter, juju_path).await?;
    let full_path = match juju_path {
        Some(path) => std::path::absolute(path)
            .with_context(|| format!("cannot resolve {}", path.display()))?,
        None => get_full_path(runner, reporter).await?,
    };
    tracing::info!(%version, path = %full_path.display(), "using juju");
    Ok(ToolBinding { version, full_path })
}

/// Run `<juju> --version`.
///
/// # Errors
///
/// Returns an error if the probe fails or the version is unsupported.
pub async fn get_version(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    juju_path: Option<&Path>,
) -> Result<ToolVersion, JujuError> {
    let program = juju_path.map_or_else(|| "juju".to_string(), |p| p.display().to_string());
    let command = CommandLine::from_argv(vec![program, "--version".to_string()]);
    ToolVersion::parse(&capture(runner, reporter, &command).await?)
}

/// Find `juju` on `PATH`, or the fixed install location on Windows.
///
/// # Errors
///
/// Returns an error if `which juju` fails.
pub async fn get_full_path(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
) -> Result<PathBuf, JujuError> {
    if cfg!(windows) {
        return Ok(PathBuf::from(WIN_JUJU_CMD));
    }
    let command = CommandLine::from_argv(vec!["which".to_string(), "juju".to_string()]);
    let found = capture(runner, reporter, &command).await?;
    Ok(PathBuf::from(found.trim_end_matches('\n')))
}
