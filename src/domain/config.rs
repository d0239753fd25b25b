//! Client settings threaded explicitly through construction.
//!
//! Pure values only; there is no process-wide debug switch.

use std::time::Duration;

/// Minimum pause between two polls of `juju status`.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long one status fetch inside `wait_for_started` may retry.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(60);

/// How long one status fetch inside `wait_for_version` may retry.
pub const DEFAULT_VERSION_STATUS_TIMEOUT: Duration = Duration::from_secs(120);

/// Behaviour knobs for an environment client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSettings {
    /// Pass `--debug` instead of `--show-log` to juju.
    pub debug: bool,
    /// Pause between polls; a tunable, not a correctness requirement.
    pub poll_interval: Duration,
    /// Per-fetch retry window used by `wait_for_started`.
    pub status_timeout: Duration,
    /// Per-fetch retry window used by `wait_for_version`.
    pub version_status_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            debug: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
            status_timeout: DEFAULT_STATUS_TIMEOUT,
            version_status_timeout: DEFAULT_VERSION_STATUS_TIMEOUT,
        }
    }
}

impl ClientSettings {
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
