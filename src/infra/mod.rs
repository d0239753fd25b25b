//! Adapters for the application ports: processes, terminal, YAML config.

pub mod command_runner;
pub mod config;
pub mod logging;
pub mod reporter;

pub use command_runner::TokioCommandRunner;
pub use config::YamlEnvironmentStore;
pub use reporter::ConsoleReporter;
