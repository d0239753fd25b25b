//! Environment client: juju commands scoped to one environment, and the
//! polling loops that wait for its agents to converge.
//!
//! Imports only from `crate::domain` and `crate::application`.

use std::process::ExitStatus;
use std::time::Duration;

use anyhow::Context;

use crate::application::ports::{CommandRunner, ProgressReporter};
use crate::application::services::invoke::{capture, run_checked};
use crate::application::timeout::UntilTimeout;
use crate::domain::command::{full_args, tool_search_path};
use crate::domain::status::STARTED;
use crate::domain::{
    ClientSettings, CommandLine, Convergence, EnvironmentDescriptor, ErroredUnit, Invocation,
    JujuError, Status, ToolBinding, format_listing,
};

/// Default retry window of [`EnvClient::get_status`].
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(60);

/// Default deadline of [`EnvClient::wait_for_started`].
pub const STARTED_TIMEOUT: Duration = Duration::from_secs(1200);

/// Default deadline of [`EnvClient::wait_for_version`].
pub const VERSION_TIMEOUT: Duration = Duration::from_secs(300);

/// Constraints every bootstrap node is launched with.
pub const BOOTSTRAP_CONSTRAINTS: &str = "mem=2G";

/// Result of inspecting one snapshot inside a polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// The target state has been reached.
    Done,
    /// Not there yet; a rendering of what is outstanding.
    Pending(String),
}

/// States of a convergence wait.
///
/// Every state but `Polling` is terminal.
#[derive(Debug)]
pub enum WaitState {
    /// Still polling; carries the last outstanding listing seen.
    Polling { last_seen: Option<String> },
    /// Every agent matched; the snapshot that proved it.
    Converged(Status),
    /// An agent reported an error. Never retried.
    Errored(ErroredUnit),
    /// The deadline passed first.
    TimedOut { last_seen: Option<String> },
}

/// Juju commands bound to one environment and one resolved tool.
///
/// Holds its own copy of the environment descriptor, so nothing the caller
/// does to its descriptor afterwards is observed here.
pub struct EnvClient<'a, R, P> {
    runner: &'a R,
    reporter: &'a P,
    env: EnvironmentDescriptor,
    tool: ToolBinding,
    settings: ClientSettings,
}

impl<'a, R: CommandRunner, P: ProgressReporter> EnvClient<'a, R, P> {
    #[must_use]
    pub fn new(
        runner: &'a R,
        reporter: &'a P,
        env: &EnvironmentDescriptor,
        tool: ToolBinding,
        settings: ClientSettings,
    ) -> Self {
        Self {
            runner,
            reporter,
            env: env.clone(),
            tool,
            settings,
        }
    }

    #[must_use]
    pub fn environment(&self) -> &EnvironmentDescriptor {
        &self.env
    }

    #[must_use]
    pub fn tool(&self) -> &ToolBinding {
        &self.tool
    }

    // ── Command construction ──────────────────────────────────────────────────

    /// Build the command line for `invocation`, with the tool's directory
    /// prepended to `PATH` so juju plugins resolve.
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting `PATH` cannot be joined.
    pub fn command_line(&self, invocation: &Invocation<'_>) -> Result<CommandLine, JujuError> {
        let argv = full_args(
            &self.tool.full_path,
            Some(self.env.name()),
            self.settings.debug,
            invocation,
        );
        let path = tool_search_path(
            &self.tool.full_path,
            std::env::var_os("PATH").as_deref(),
        )
        .context("building PATH for juju")?;
        Ok(CommandLine::from_argv(argv).with_env("PATH", path))
    }

    /// Run a scoped subcommand and return its stdout.
    ///
    /// # Errors
    ///
    /// Returns [`JujuError::CannotConnect`] when the environment cannot be
    /// reached, or [`JujuError::CommandFailed`] for any other non-zero exit.
    pub async fn get_juju_output(
        &self,
        command: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<String, JujuError> {
        let line = self.command_line(&Invocation::new(command, args).timeout(timeout))?;
        capture(self.runner, self.reporter, &line).await
    }

    /// Echo and run `invocation`; see [`run_checked`] for `check`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned, or if `check` is
    /// set and it exits non-zero.
    pub async fn run(
        &self,
        invocation: &Invocation<'_>,
        check: bool,
    ) -> Result<ExitStatus, JujuError> {
        let line = self.command_line(invocation)?;
        run_checked(self.runner, self.reporter, &line, check).await
    }

    /// Run a scoped subcommand and require it to succeed.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot run or exits non-zero.
    pub async fn juju(&self, command: &str, args: &[&str]) -> Result<ExitStatus, JujuError> {
        self.run(&Invocation::new(command, args), true).await
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────────

    /// Bootstrap the environment, elevated for local providers.
    ///
    /// # Errors
    ///
    /// Returns an error if bootstrap fails.
    pub async fn bootstrap(&self) -> Result<ExitStatus, JujuError> {
        let args = ["--constraints", BOOTSTRAP_CONSTRAINTS];
        let invocation = Invocation::new("bootstrap", &args).sudo(self.env.needs_sudo());
        self.run(&invocation, true).await
    }

    /// Destroy the environment, tolerating failure.
    ///
    /// The environment is named explicitly rather than through `-e`, since
    /// it may already be gone.
    ///
    /// # Errors
    ///
    /// Returns an error only if the command cannot be spawned.
    pub async fn destroy_environment(&self) -> Result<ExitStatus, JujuError> {
        let args = [self.env.name(), "--force", "-y"];
        let invocation = Invocation::new("destroy-environment", &args)
            .sudo(self.env.needs_sudo())
            .include_e(false);
        let status = self.run(&invocation, false).await?;
        if !status.success() {
            tracing::warn!(environment = self.env.name(), code = ?status.code(), "destroy-environment failed");
        }
        Ok(status)
    }

    // ── Options ───────────────────────────────────────────────────────────────

    /// Value of an environment option, without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns an error if `get-env` fails.
    pub async fn get_env_option(&self, option: &str) -> Result<String, JujuError> {
        let value = self.get_juju_output("get-env", &[option], None).await?;
        Ok(value.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Set an environment option.
    ///
    /// # Errors
    ///
    /// Returns an error if `set-env` fails.
    pub async fn set_env_option(
        &self,
        option: &str,
        value: &str,
    ) -> Result<ExitStatus, JujuError> {
        let option_value = format!("{option}={value}");
        self.juju("set-env", &[&option_value]).await
    }

    // ── Upgrades ──────────────────────────────────────────────────────────────

    /// The agent version matching the bound tool.
    #[must_use]
    pub fn get_matching_agent_version(&self, no_build: bool) -> String {
        self.tool
            .version
            .matching_agent_version(self.env.is_local(), no_build)
    }

    /// Upgrade the environment's agents, pinned to the tool's own version
    /// when `force_version` is set. Local providers re-upload tools.
    ///
    /// # Errors
    ///
    /// Returns an error if `upgrade-juju` fails.
    pub async fn upgrade_juju(&self, force_version: bool) -> Result<ExitStatus, JujuError> {
        let version = self.get_matching_agent_version(true);
        let mut args = Vec::new();
        if force_version {
            args.extend(["--version", version.as_str()]);
        }
        if self.env.is_local() {
            args.push("--upload-tools");
        }
        self.juju("upgrade-juju", &args).await
    }

    // ── Status ────────────────────────────────────────────────────────────────

    /// Fetch and parse `juju status`, retrying failed fetches until
    /// `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns [`JujuError::StatusTimeout`] carrying the last failure when
    /// no fetch succeeds in time. Spawn and parse failures are returned at
    /// once.
    pub async fn get_status(&self, timeout: Duration) -> Result<Status, JujuError> {
        let timer = UntilTimeout::new(timeout);
        let mut last_error = None;
        for remaining in timer.clone() {
            match self.get_juju_output("status", &[], None).await {
                Ok(document) => return Ok(Status::parse(&document)?),
                Err(err) if err.is_process_failure() => {
                    tracing::debug!(
                        environment = self.env.name(),
                        ?remaining,
                        error = %err,
                        "juju status failed, retrying"
                    );
                    last_error = Some(Box::new(err));
                    timer.pause(self.settings.poll_interval).await;
                }
                Err(err) => return Err(err),
            }
        }
        Err(JujuError::StatusTimeout { last_error })
    }

    /// Wait until every machine and unit agent is `started`.
    ///
    /// # Errors
    ///
    /// Returns [`JujuError::ErroredUnit`] as soon as an agent reports an
    /// error, or [`JujuError::AgentsNotStarted`] when `timeout` elapses.
    pub async fn wait_for_started(&self, timeout: Duration) -> Result<Status, JujuError> {
        let inspect = |status: &Status| -> Result<Progress, ErroredUnit> {
            Ok(match status.check_convergence(STARTED)? {
                Convergence::Converged => Progress::Done,
                Convergence::Pending(states) => Progress::Pending(format_listing(&states, STARTED)),
            })
        };
        match self
            .wait_until(timeout, self.settings.status_timeout, inspect)
            .await?
        {
            WaitState::Converged(status) => {
                self.reporter
                    .success(&format!("All agents started in {}", self.env.name()));
                Ok(status)
            }
            WaitState::Errored(unit) => Err(unit.into()),
            WaitState::TimedOut { last_seen } | WaitState::Polling { last_seen } => {
                Err(JujuError::AgentsNotStarted {
                    environment: self.env.name().to_string(),
                    pending: last_seen.unwrap_or_else(|| "no status".to_string()),
                })
            }
        }
    }

    /// Wait until every agent reports `version`.
    ///
    /// # Errors
    ///
    /// Returns [`JujuError::ErroredUnit`] as soon as an agent reports an
    /// error, or [`JujuError::VersionsNotConverged`] when `timeout` elapses.
    pub async fn wait_for_version(
        &self,
        version: &str,
        timeout: Duration,
    ) -> Result<Status, JujuError> {
        let inspect = |status: &Status| -> Result<Progress, ErroredUnit> {
            status.check_errors()?;
            let versions = status.agent_versions();
            if versions.len() == 1 && versions.contains_key(version) {
                Ok(Progress::Done)
            } else {
                Ok(Progress::Pending(format_listing(&versions, version)))
            }
        };
        match self
            .wait_until(timeout, self.settings.version_status_timeout, inspect)
            .await?
        {
            WaitState::Converged(status) => {
                self.reporter.success(&format!(
                    "All agents at {version} in {}",
                    self.env.name()
                ));
                Ok(status)
            }
            WaitState::Errored(unit) => Err(unit.into()),
            WaitState::TimedOut { last_seen } | WaitState::Polling { last_seen } => {
                Err(JujuError::VersionsNotConverged {
                    environment: self.env.name().to_string(),
                    expected: version.to_string(),
                    seen: last_seen.unwrap_or_else(|| "no status".to_string()),
                })
            }
        }
    }

    /// Drive the wait state machine until it reaches a terminal state.
    ///
    /// Transient connectivity failures and pending snapshots loop. An
    /// errored agent ends the wait in `Errored`; non-transient fetch
    /// failures end it with `Err`.
    async fn wait_until<F>(
        &self,
        timeout: Duration,
        status_timeout: Duration,
        mut inspect: F,
    ) -> Result<WaitState, JujuError>
    where
        F: FnMut(&Status) -> Result<Progress, ErroredUnit>,
    {
        let timer = UntilTimeout::new(timeout);
        let mut state = WaitState::Polling { last_seen: None };
        loop {
            state = match state {
                WaitState::Polling { last_seen } => match timer.remaining() {
                    None => WaitState::TimedOut { last_seen },
                    Some(remaining) => {
                        self.poll(&timer, status_timeout.min(remaining), last_seen, &mut inspect)
                            .await?
                    }
                },
                terminal => return Ok(terminal),
            };
        }
    }

    /// One `Polling` step: fetch, inspect, and pause before the next step.
    async fn poll<F>(
        &self,
        timer: &UntilTimeout,
        status_timeout: Duration,
        last_seen: Option<String>,
        inspect: &mut F,
    ) -> Result<WaitState, JujuError>
    where
        F: FnMut(&Status) -> Result<Progress, ErroredUnit>,
    {
        let status = match self.get_status(status_timeout).await {
            Ok(status) => status,
            // The fetch window closed before a single attempt: the wait's own
            // deadline has been reached.
            Err(JujuError::StatusTimeout { last_error: None }) => {
                timer.pause(self.settings.poll_interval).await;
                return Ok(WaitState::Polling { last_seen });
            }
            Err(err) if err.is_transient() => {
                self.reporter
                    .warn("Suppressing \"Unable to connect to environment\"");
                tracing::debug!(environment = self.env.name(), error = %err, "transient failure");
                timer.pause(self.settings.poll_interval).await;
                return Ok(WaitState::Polling { last_seen });
            }
            Err(err) => return Err(err),
        };
        match inspect(&status) {
            Err(unit) => Ok(WaitState::Errored(unit)),
            Ok(Progress::Done) => Ok(WaitState::Converged(status)),
            Ok(Progress::Pending(listing)) => {
                self.reporter.step(&listing);
                timer.pause(self.settings.poll_interval).await;
                Ok(WaitState::Polling {
                    last_seen: Some(listing),
                })
            }
        }
    }
}
