//! Environment handle: a named environment bound to a versioned client.
//!
//! Imports only from `crate::domain` and `crate::application`.

use std::process::ExitStatus;
use std::time::Duration;

use crate::application::ports::{CommandRunner, EnvironmentConfigSource, ProgressReporter};
use crate::application::services::env_client::{
    EnvClient, STARTED_TIMEOUT, STATUS_TIMEOUT, VERSION_TIMEOUT,
};
use crate::application::services::juju_client::JujuClient;
use crate::domain::{EnvironmentDescriptor, JujuError, Status};

/// Option holding the simplestreams URL agents fetch tools from.
pub const TOOLS_METADATA_URL: &str = "tools-metadata-url";

/// A named environment plus the client that drives it.
///
/// Every operation builds a fresh [`EnvClient`] from the current client,
/// so nothing version-specific is cached between calls.
pub struct Environment<R, P> {
    descriptor: EnvironmentDescriptor,
    client: JujuClient<R, P>,
}

impl<R: CommandRunner, P: ProgressReporter> Environment<R, P> {
    #[must_use]
    pub fn new(descriptor: EnvironmentDescriptor, client: JujuClient<R, P>) -> Self {
        Self { descriptor, client }
    }

    /// Look `name` up in `source` and bind it to `client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn from_config(
        name: &str,
        source: &impl EnvironmentConfigSource,
        client: JujuClient<R, P>,
    ) -> Result<Self, JujuError> {
        let config = source.load(name)?;
        Ok(Self::new(EnvironmentDescriptor::new(name, Some(config)), client))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    #[must_use]
    pub fn descriptor(&self) -> &EnvironmentDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn client(&self) -> &JujuClient<R, P> {
        &self.client
    }

    /// Swap in another client, e.g. after upgrading the local juju.
    pub fn set_client(&mut self, client: JujuClient<R, P>) {
        self.client = client;
    }

    fn env_client(&self) -> EnvClient<'_, R, P> {
        self.client.env_client(&self.descriptor)
    }

    /// # Errors
    ///
    /// See [`EnvClient::bootstrap`].
    pub async fn bootstrap(&self) -> Result<ExitStatus, JujuError> {
        self.env_client().bootstrap().await
    }

    /// # Errors
    ///
    /// See [`EnvClient::destroy_environment`].
    pub async fn destroy_environment(&self) -> Result<ExitStatus, JujuError> {
        self.env_client().destroy_environment().await
    }

    /// Deploy `charm` into the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `juju deploy` fails.
    pub async fn deploy(&self, charm: &str) -> Result<ExitStatus, JujuError> {
        self.juju("deploy", &[charm]).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::juju`].
    pub async fn juju(&self, command: &str, args: &[&str]) -> Result<ExitStatus, JujuError> {
        self.env_client().juju(command, args).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::get_juju_output`].
    pub async fn get_juju_output(&self, command: &str, args: &[&str]) -> Result<String, JujuError> {
        self.env_client().get_juju_output(command, args, None).await
    }

    /// Status with the default retry window.
    ///
    /// # Errors
    ///
    /// See [`EnvClient::get_status`].
    pub async fn get_status(&self) -> Result<Status, JujuError> {
        self.get_status_within(STATUS_TIMEOUT).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::get_status`].
    pub async fn get_status_within(&self, timeout: Duration) -> Result<Status, JujuError> {
        self.env_client().get_status(timeout).await
    }

    /// Wait up to twenty minutes for every agent to start.
    ///
    /// # Errors
    ///
    /// See [`EnvClient::wait_for_started`].
    pub async fn wait_for_started(&self) -> Result<Status, JujuError> {
        self.wait_for_started_within(STARTED_TIMEOUT).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::wait_for_started`].
    pub async fn wait_for_started_within(&self, timeout: Duration) -> Result<Status, JujuError> {
        self.env_client().wait_for_started(timeout).await
    }

    /// Wait up to five minutes for every agent to report `version`.
    ///
    /// # Errors
    ///
    /// See [`EnvClient::wait_for_version`].
    pub async fn wait_for_version(&self, version: &str) -> Result<Status, JujuError> {
        self.wait_for_version_within(version, VERSION_TIMEOUT).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::wait_for_version`].
    pub async fn wait_for_version_within(
        &self,
        version: &str,
        timeout: Duration,
    ) -> Result<Status, JujuError> {
        self.env_client().wait_for_version(version, timeout).await
    }

    #[must_use]
    pub fn get_matching_agent_version(&self, no_build: bool) -> String {
        self.env_client().get_matching_agent_version(no_build)
    }

    /// # Errors
    ///
    /// See [`EnvClient::upgrade_juju`].
    pub async fn upgrade_juju(&self, force_version: bool) -> Result<ExitStatus, JujuError> {
        self.env_client().upgrade_juju(force_version).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::get_env_option`].
    pub async fn get_env_option(&self, option: &str) -> Result<String, JujuError> {
        self.env_client().get_env_option(option).await
    }

    /// # Errors
    ///
    /// See [`EnvClient::set_env_option`].
    pub async fn set_env_option(&self, option: &str, value: &str) -> Result<ExitStatus, JujuError> {
        self.env_client().set_env_option(option, value).await
    }

    /// Point `tools-metadata-url` at the testing stream.
    ///
    /// Rewrites `/tools` to `/testing/tools` unless the URL already mentions
    /// `testing`, so calling it twice leaves the URL as one call did.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing the option fails.
    pub async fn set_testing_tools_metadata_url(&self) -> Result<(), JujuError> {
        let url = self.get_env_option(TOOLS_METADATA_URL).await?;
        if url.contains("testing") {
            tracing::debug!(environment = self.name(), %url, "already on testing tools");
            return Ok(());
        }
        let testing_url = url.replace("/tools", "/testing/tools");
        self.set_env_option(TOOLS_METADATA_URL, &testing_url).await?;
        Ok(())
    }
}
