//! Parsed `juju status` snapshots and convergence checks.
//!
//! Pure functions only: a [`Status`] is built from the YAML text of one
//! `juju status` call and never mutated afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::domain::error::ErroredUnit;

/// State reported for items that carry no `agent-state` key.
pub const NO_AGENT: &str = "no-agent";

/// Version reported for items that carry no `agent-version` key.
pub const UNKNOWN_VERSION: &str = "unknown";

/// Default convergence target.
pub const STARTED: &str = "started";

// ── Document schema ──────────────────────────────────────────────────────────

/// A machine, container or unit as reported by `juju status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AgentItem {
    pub agent_state: Option<String>,
    pub agent_state_info: Option<String>,
    pub agent_version: Option<String>,
    /// Only machines have containers.
    pub containers: BTreeMap<String, AgentItem>,
}

impl AgentItem {
    /// The agent state, or [`NO_AGENT`] when absent.
    #[must_use]
    pub fn state(&self) -> &str {
        self.agent_state.as_deref().unwrap_or(NO_AGENT)
    }

    /// The agent version, or [`UNKNOWN_VERSION`] when absent.
    #[must_use]
    pub fn version(&self) -> &str {
        self.agent_version.as_deref().unwrap_or(UNKNOWN_VERSION)
    }

    /// Diagnostic text, empty when absent.
    #[must_use]
    pub fn state_info(&self) -> &str {
        self.agent_state_info.as_deref().unwrap_or_default()
    }
}

/// A deployed service and its units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Service {
    pub units: BTreeMap<String, AgentItem>,
}

/// One point-in-time snapshot of the environment.
///
/// Machines, containers, services and units are all keyed by name in
/// sorted maps, so every traversal is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Status {
    pub machines: BTreeMap<String, AgentItem>,
    pub services: BTreeMap<String, Service>,
}

/// Item names grouped by agent state.
pub type AgentStates = BTreeMap<String, Vec<String>>;

/// Item names grouped by agent version.
pub type AgentVersions = BTreeMap<String, BTreeSet<String>>;

/// Outcome of [`Status::check_convergence`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Convergence {
    /// Every agent is in the target state.
    Converged,
    /// Not there yet; the full state distribution.
    Pending(AgentStates),
}

// ── Queries ──────────────────────────────────────────────────────────────────

impl Status {
    /// Parse the YAML output of `juju status`.
    ///
    /// # Errors
    ///
    /// Returns the underlying YAML error for malformed documents.
    pub fn parse(document: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(document)
    }

    /// Machines in name order.
    pub fn iter_machines(&self) -> impl Iterator<Item = (&str, &AgentItem)> {
        self.machines.iter().map(|(name, item)| (name.as_str(), item))
    }

    /// Every agent item: each machine followed by its containers, then the
    /// units of every service, services in name order.
    pub fn agent_items(&self) -> impl Iterator<Item = (&str, &AgentItem)> {
        let machines = self.iter_machines().flat_map(|(name, machine)| {
            std::iter::once((name, machine)).chain(
                machine
                    .containers
                    .iter()
                    .map(|(name, item)| (name.as_str(), item)),
            )
        });
        let units = self.services.values().flat_map(|service| {
            service
                .units
                .iter()
                .map(|(name, item)| (name.as_str(), item))
        });
        machines.chain(units)
    }

    /// Map agent states to the items in those states.
    #[must_use]
    pub fn agent_state_counts(&self) -> AgentStates {
        let mut states = AgentStates::new();
        for (name, item) in self.agent_items() {
            states
                .entry(item.state().to_string())
                .or_default()
                .push(name.to_string());
        }
        states
    }

    /// Scan for agents in trouble and return the state distribution.
    ///
    /// # Errors
    ///
    /// Returns [`ErroredUnit`] for the first item whose diagnostic text
    /// mentions `error`, or, failing that, for the first item in a state
    /// whose name mentions `error`.
    pub fn check_errors(&self) -> Result<AgentStates, ErroredUnit> {
        if let Some((name, item)) = self
            .agent_items()
            .find(|(_, item)| item.state_info().contains("error"))
        {
            return Err(ErroredUnit {
                item: name.to_string(),
                state: item.state_info().to_string(),
            });
        }
        let states = self.agent_state_counts();
        for (state, entries) in &states {
            if state.contains("error") {
                if let Some(first) = entries.first() {
                    return Err(ErroredUnit {
                        item: first.clone(),
                        state: state.clone(),
                    });
                }
            }
        }
        Ok(states)
    }

    /// Check whether every agent has reached `target`.
    ///
    /// # Errors
    ///
    /// Returns [`ErroredUnit`] as [`Status::check_errors`] does.
    pub fn check_convergence(&self, target: &str) -> Result<Convergence, ErroredUnit> {
        let states = self.check_errors()?;
        if states.len() == 1 && states.contains_key(target) {
            return Ok(Convergence::Converged);
        }
        Ok(Convergence::Pending(states))
    }

    /// Map agent versions to the items running them.
    #[must_use]
    pub fn agent_versions(&self) -> AgentVersions {
        let mut versions = AgentVersions::new();
        for (name, item) in self.agent_items() {
            versions
                .entry(item.version().to_string())
                .or_default()
                .insert(name.to_string());
        }
        versions
    }
}

/// Render a distribution as `state: a, b | other: c`, skipping `expected`.
pub fn format_listing<I, K, V, S>(listing: I, expected: &str) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    listing
        .into_iter()
        .filter(|(value, _)| value.as_ref() != expected)
        .map(|(value, entries)| {
            let names: Vec<String> = entries
                .into_iter()
                .map(|entry| entry.as_ref().to_string())
                .collect();
            format!("{}: {}", value.as_ref(), names.join(", "))
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

// ── Unit tests ───────────────────────────────────────────────────────────────
