//! Drive the juju CLI to stand up, query and tear down test environments,
//! and block until their agents converge.
//!
//! ```no_run
//! use juju_env::application::services::{Environment, JujuClient};
//! use juju_env::domain::ClientSettings;
//! use juju_env::infra::{ConsoleReporter, TokioCommandRunner, YamlEnvironmentStore};
//!
//! # async fn demo() -> Result<(), juju_env::domain::JujuError> {
//! let settings = ClientSettings::default();
//! let client = JujuClient::by_version(
//!     TokioCommandRunner::default(),
//!     ConsoleReporter::new(false),
//!     None,
//!     settings,
//! )
//! .await?;
//! let env = Environment::from_config("local", &YamlEnvironmentStore, client)?;
//! env.bootstrap().await?;
//! env.wait_for_started().await?;
//! env.destroy_environment().await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod application;
pub mod domain;
pub mod infra;
