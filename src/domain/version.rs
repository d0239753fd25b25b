//! Juju tool versions as printed by `juju --version`.

use std::fmt;
use std::path::PathBuf;

use crate::domain::error::JujuError;

/// Release lines this crate refuses to drive.
pub const UNSUPPORTED_PREFIXES: &[&str] = &["1.16"];

/// Build suffix the local provider appends to uploaded tools.
const LOCAL_BUILD_SUFFIX: &str = ".1";

/// A full tool version such as `1.18.1-trusty-amd64` or
/// `1.21-beta1-trusty-amd64`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolVersion(String);

impl ToolVersion {
    /// Wrap a version string, rejecting unsupported release lines.
    ///
    /// # Errors
    ///
    /// Returns [`JujuError::UnsupportedVersion`] for `1.16.x` tools.
    pub fn parse(raw: &str) -> Result<Self, JujuError> {
        let version = raw.trim();
        if UNSUPPORTED_PREFIXES
            .iter()
            .any(|prefix| version.starts_with(prefix))
        {
            return Err(JujuError::UnsupportedVersion(version.to_string()));
        }
        Ok(Self(version.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The agent version matching this tool: series and architecture
    /// stripped, with the local build suffix unless `no_build`.
    #[must_use]
    pub fn matching_agent_version(&self, is_local: bool, no_build: bool) -> String {
        let parts: Vec<&str> = self.0.split('-').collect();
        let mut number = if parts.len() == 4 {
            parts[..2].join("-")
        } else {
            parts[0].to_string()
        };
        if !no_build && is_local {
            number.push_str(LOCAL_BUILD_SUFFIX);
        }
        number
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved juju: its version and absolute executable path.
///
/// Discovered once and kept for the life of a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolBinding {
    pub version: ToolVersion,
    pub full_path: PathBuf,
}
