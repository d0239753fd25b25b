//! Environment descriptors: a name plus its immutable configuration.
//!
//! Pure types only. Loading the configuration is the job of an
//! `EnvironmentConfigSource` port.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

/// Provider type used by the local (LXC/KVM on this host) provider.
pub const LOCAL_PROVIDER: &str = "local";

/// Immutable settings of one environment, as read from `environments.yaml`.
///
/// Cloning is cheap and never aliases a mutable map: the settings are
/// frozen behind an `Arc` at construction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<String, serde_yaml::Value>")]
pub struct EnvironmentConfig {
    settings: Arc<BTreeMap<String, serde_yaml::Value>>,
}

impl From<BTreeMap<String, serde_yaml::Value>> for EnvironmentConfig {
    fn from(settings: BTreeMap<String, serde_yaml::Value>) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }
}

impl<K: Into<String>, V: Into<serde_yaml::Value>> FromIterator<(K, V)> for EnvironmentConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<BTreeMap<_, _>>()
            .into()
    }
}

impl EnvironmentConfig {
    /// Raw value of a setting.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.settings.get(key)
    }

    /// A setting as a string, `None` when absent or not a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(serde_yaml::Value::as_str)
    }

    /// The provider `type`, e.g. `local`, `ec2`, `openstack`.
    #[must_use]
    pub fn provider_type(&self) -> Option<&str> {
        self.get_str("type")
    }
}

/// A named environment and the flags derived from its configuration.
///
/// The flags are computed once in [`EnvironmentDescriptor::new`] and stored;
/// they are never re-derived from the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentDescriptor {
    name: String,
    config: Option<EnvironmentConfig>,
    is_local: bool,
    uses_kvm: bool,
    is_hpcloud: bool,
}

impl EnvironmentDescriptor {
    /// Build a descriptor, deriving the provider flags from `config`.
    #[must_use]
    pub fn new(name: impl Into<String>, config: Option<EnvironmentConfig>) -> Self {
        let (is_local, uses_kvm, is_hpcloud) = config.as_ref().map_or((false, false, false), |c| {
            let is_local = c.provider_type() == Some(LOCAL_PROVIDER);
            let uses_kvm = is_local && c.get_str("container") == Some("kvm");
            let is_hpcloud = c.get_str("auth-url").unwrap_or_default().contains("hpcloudsvc");
            (is_local, uses_kvm, is_hpcloud)
        });
        Self {
            name: name.into(),
            config,
            is_local,
            uses_kvm,
            is_hpcloud,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn config(&self) -> Option<&EnvironmentConfig> {
        self.config.as_ref()
    }

    /// Whether the environment uses the local provider.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// Whether a local environment runs KVM rather than LXC containers.
    #[must_use]
    pub fn uses_kvm(&self) -> bool {
        self.uses_kvm
    }

    /// Whether the environment targets HP Cloud.
    #[must_use]
    pub fn is_hpcloud(&self) -> bool {
        self.is_hpcloud
    }

    /// Local providers manage the host itself and must run elevated.
    #[must_use]
    pub fn needs_sudo(&self) -> bool {
        self.is_local
    }
}
