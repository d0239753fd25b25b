//! Infrastructure implementation of the `EnvironmentConfigSource` port.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::application::ports::EnvironmentConfigSource;
use crate::domain::{ConfigError, EnvironmentConfig};

/// Top level of `environments.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvironmentsFile {
    default: Option<String>,
    environments: BTreeMap<String, serde_yaml::Value>,
}

/// Reads environments from `$JUJU_HOME/environments.yaml`, falling back
/// to `~/.juju/environments.yaml`.
pub struct YamlEnvironmentStore;

impl YamlEnvironmentStore {
    /// Location of `environments.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if `JUJU_HOME` is unset and the home directory
    /// cannot be determined.
    pub fn path(&self) -> Result<PathBuf> {
        if let Some(home) = std::env::var_os("JUJU_HOME") {
            return Ok(PathBuf::from(home).join("environments.yaml"));
        }
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        Ok(home.join(".juju").join("environments.yaml"))
    }
}

impl EnvironmentConfigSource for YamlEnvironmentStore {
    fn load(&self, name: &str) -> Result<EnvironmentConfig> {
        let path = self.path()?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let file: EnvironmentsFile = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;
        select(file, name)
    }
}

fn select(mut file: EnvironmentsFile, name: &str) -> Result<EnvironmentConfig> {
    let name = if name.is_empty() {
        file.default.clone().ok_or(ConfigError::NoDefault)?
    } else {
        name.to_string()
    };
    let value = file
        .environments
        .remove(&name)
        .ok_or_else(|| ConfigError::UnknownEnvironment(name.clone()))?;
    let config = serde_yaml::from_value(value).map_err(|_| ConfigError::NotAMapping { name })?;
    Ok(config)
}
