//! Application services: juju invocation, discovery, and the clients.
//!
//! Each module imports only from `crate::domain` and `crate::application`.

pub mod discovery;
pub mod env_client;
pub mod environment;
pub mod invoke;
pub mod juju_client;

#[cfg(test)]
pub(crate) mod test_support;

pub use env_client::{EnvClient, Progress, WaitState};
pub use environment::Environment;
pub use juju_client::JujuClient;
