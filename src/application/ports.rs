//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` and never from `crate::infra`.

use std::process::{ExitStatus, Output};

use anyhow::Result;

use crate::domain::{CommandLine, EnvironmentConfig};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so the juju binary can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a command and capture stdout and stderr.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds the
    /// runner's timeout. On timeout the child must be killed, not orphaned.
    /// A non-zero exit is NOT an error at this level.
    async fn run(&self, command: &CommandLine) -> Result<Output>;

    /// Run a command with inherited stdio and return only its exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    async fn run_status(&self, command: &CommandLine) -> Result<ExitStatus>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts operator-facing output so services can emit events without
/// depending on the terminal. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message (echoed commands, pending agents).
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Configuration Port ────────────────────────────────────────────────────────

/// Looks up an environment's settings by name.
pub trait EnvironmentConfigSource {
    /// Load the settings of `name`; an empty name selects the default
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read or does not
    /// define the environment.
    fn load(&self, name: &str) -> Result<EnvironmentConfig>;
}
