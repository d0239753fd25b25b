//! Versioned juju client: one resolved tool, shared by every environment.
//!
//! Imports only from `crate::domain` and `crate::application`.

use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;

use crate::application::ports::{CommandRunner, ProgressReporter};
use crate::application::services::discovery::discover;
use crate::application::services::env_client::EnvClient;
use crate::domain::{
    ClientSettings, EnvironmentDescriptor, JujuError, Status, ToolBinding, ToolVersion,
};

/// A juju binary whose version was checked once, at construction.
///
/// Hands out an [`EnvClient`] per environment; the environment-taking
/// methods here are shorthands for `env_client(env).<op>()`.
pub struct JujuClient<R, P> {
    runner: R,
    reporter: P,
    tool: ToolBinding,
    settings: ClientSettings,
}

impl<R: CommandRunner, P: ProgressReporter> JujuClient<R, P> {
    /// Bind an already resolved tool.
    #[must_use]
    pub fn new(runner: R, reporter: P, tool: ToolBinding, settings: ClientSettings) -> Self {
        Self {
            runner,
            reporter,
            tool,
            settings,
        }
    }

    /// Discover juju (at `juju_path`, or on `PATH`) and bind it.
    ///
    /// # Errors
    ///
    /// Returns [`JujuError::UnsupportedVersion`] for unsupported tools, or
    /// an error if discovery fails.
    pub async fn by_version(
        runner: R,
        reporter: P,
        juju_path: Option<&Path>,
        settings: ClientSettings,
    ) -> Result<Self, JujuError> {
        let tool = discover(&runner, &reporter, juju_path).await?;
        Ok(Self::new(runner, reporter, tool, settings))
    }

    #[must_use]
    pub fn version(&self) -> &ToolVersion {
        &self.tool.version
    }

    #[must_use]
    pub fn full_path(&self) -> &Path {
        &self.tool.full_path
    }

    #[must_use]
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    #[must_use]
    pub fn runner(&self) -> &R {
        &self.runner
    }

    #[must_use]
    pub fn reporter(&self) -> &P {
        &self.reporter
    }

    /// A client scoped to `env`, holding its own copy of the descriptor.
    #[must_use]
    pub fn env_client(&self, env: &EnvironmentDescriptor) -> EnvClient<'_, R, P> {
        EnvClient::new(
            &self.runner,
            &self.reporter,
            env,
            self.tool.clone(),
            self.settings,
        )
    }

    /// # Errors
    ///
    /// See [`EnvClient::bootstrap`].
    pub async fn bootstrap(&self, env: &EnvironmentDescriptor) -> Result<ExitStatus, JujuError> {
        self.env_client(env).bootstrap().await
    }

    /// # Errors
    ///
    /// See [`EnvClient::destroy_environment`].
    pub async fn destroy_environment(
        &self,
        env: &EnvironmentDescriptor,
    ) -> Result<ExitStatus, JujuError> {
        self.env_client(env).destroy_environment().await
    }

    /// # Errors
    ///
    /// See [`EnvClient::get_juju_output`].
    pub async fn get_juju_output(
        &self,
        env: &EnvironmentDescriptor,
        command: &str,
        args: &[&str],
        timeout: Option<Duration>,
    ) -> Result<String, JujuError> {
        self.env_client(env)
            .get_juju_output(command, args, timeout)
            .await
    }

    /// # Errors
    ///
    /// See [`EnvClient::get_status`].
    pub async fn get_status(
        &self,
        env: &EnvironmentDescriptor,
        timeout: Duration,
    ) -> Result<Status, JujuError> {
        self.env_client(env).get_status(timeout).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::get_env_option`].
    pub async fn get_env_option(
        &self,
        env: &EnvironmentDescriptor,
        option: &str,
    ) -> Result<String, JujuError> {
        self.env_client(env).get_env_option(option).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::set_env_option`].
    pub async fn set_env_option(
        &self,
        env: &EnvironmentDescriptor,
        option: &str,
        value: &str,
    ) -> Result<ExitStatus, JujuError> {
        self.env_client(env).set_env_option(option, value).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::juju`].
    pub async fn juju(
        &self,
        env: &EnvironmentDescriptor,
        command: &str,
        args: &[&str],
    ) -> Result<ExitStatus, JujuError> {
        self.env_client(env).juju(command, args).await
    }
}
