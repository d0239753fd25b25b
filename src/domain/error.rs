//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, or `std::process`. Port failures arrive here as
//! `anyhow::Error` and are wrapped in [`JujuError::External`].

use std::fmt;

use thiserror::Error;

// ── Process failures ─────────────────────────────────────────────────────────

/// Stderr fragments that mark a failure as a transient loss of connectivity
/// to the environment's API server rather than a real command failure.
pub const CONNECTIVITY_MARKERS: &[&str] = &[
    "Unable to connect to environment",
    "MissingOrIncorrectVersionHeader",
    "307: Temporary Redirect",
];

/// A juju invocation that exited non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessFailure {
    /// Space-joined argv of the failed command.
    pub command: String,
    /// Exit code, `None` when the process was killed by a signal.
    pub code: Option<i32>,
    /// Captured stdout.
    pub output: String,
    /// Captured stderr.
    pub stderr: String,
}

impl ProcessFailure {
    /// Whether stderr carries one of the [`CONNECTIVITY_MARKERS`].
    #[must_use]
    pub fn is_connectivity(&self) -> bool {
        CONNECTIVITY_MARKERS
            .iter()
            .any(|marker| self.stderr.contains(marker))
    }
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "'{}' exited with status {code}", self.command)?,
            None => write!(f, "'{}' was terminated by a signal", self.command)?,
        }
        let stderr = self.stderr.trim_end();
        if !stderr.is_empty() {
            write!(f, ": {stderr}")?;
        }
        Ok(())
    }
}

// ── Cluster faults ───────────────────────────────────────────────────────────

/// An agent reported an error state or error diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{item} is in state {state}")]
pub struct ErroredUnit {
    /// Machine, container or unit name.
    pub item: String,
    /// The offending state or diagnostic text.
    pub state: String,
}

// ── Configuration errors ─────────────────────────────────────────────────────

/// Errors from looking up an environment's configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment '{0}' is not defined in environments.yaml")]
    UnknownEnvironment(String),

    #[error("No environment named and environments.yaml has no default")]
    NoDefault,

    #[error("Environment '{name}' must be a mapping of settings")]
    NotAMapping { name: String },
}

// ── Client errors ────────────────────────────────────────────────────────────

/// Every failure an environment client can surface.
#[derive(Debug, Error)]
pub enum JujuError {
    #[error("Command failed: {0}")]
    CommandFailed(ProcessFailure),

    #[error("Unable to reach the environment: {0}")]
    CannotConnect(ProcessFailure),

    #[error(transparent)]
    ErroredUnit(#[from] ErroredUnit),

    #[error("Timed out waiting for juju status to succeed: {}", describe_last(.last_error.as_deref()))]
    StatusTimeout { last_error: Option<Box<JujuError>> },

    #[error("Timed out waiting for agents to start in {environment}. Pending: {pending}")]
    AgentsNotStarted { environment: String, pending: String },

    #[error("Some versions did not update in {environment}. Expected {expected}, seen: {seen}")]
    VersionsNotConverged {
        environment: String,
        expected: String,
        seen: String,
    },

    #[error("Unsupported juju: {0}")]
    UnsupportedVersion(String),

    #[error(transparent)]
    StatusParse(#[from] serde_yaml::Error),

    /// A port failed: the process could not be spawned, timed out in the
    /// runner, or the configuration could not be loaded.
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

fn describe_last(last: Option<&JujuError>) -> String {
    last.map_or_else(|| "no attempt completed".to_string(), ToString::to_string)
}

impl JujuError {
    /// Classify a non-zero exit as either a connectivity blip or a real failure.
    #[must_use]
    pub fn from_failure(failure: ProcessFailure) -> Self {
        if failure.is_connectivity() {
            Self::CannotConnect(failure)
        } else {
            Self::CommandFailed(failure)
        }
    }

    /// Whether a polling loop may retry past this error.
    ///
    /// True for [`JujuError::CannotConnect`] and for a status timeout whose
    /// last observed error was itself transient.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::CannotConnect(_) => true,
            Self::StatusTimeout {
                last_error: Some(last),
            } => last.is_transient(),
            _ => false,
        }
    }

    /// Whether this is a process failure that `get_status` retries.
    #[must_use]
    pub fn is_process_failure(&self) -> bool {
        matches!(self, Self::CommandFailed(_) | Self::CannotConnect(_))
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
