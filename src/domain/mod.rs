//! Domain layer: pure types and functions.
//!
//! Nothing in here spawns processes, touches the filesystem or awaits.

pub mod command;
pub mod config;
pub mod environment;
pub mod error;
pub mod status;
pub mod version;

pub use command::{CommandLine, Invocation};
pub use config::ClientSettings;
pub use environment::{EnvironmentConfig, EnvironmentDescriptor};
pub use error::{ConfigError, ErroredUnit, JujuError, ProcessFailure};
pub use status::{AgentItem, AgentStates, AgentVersions, Convergence, Status, format_listing};
pub use version::{ToolBinding, ToolVersion};
