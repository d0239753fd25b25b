//! Deadline-bounded iteration for polling loops.

use std::iter::FusedIterator;
use std::time::Duration;

use tokio::time::Instant;

/// Yields the time remaining until a deadline fixed at construction.
///
/// Stops once the deadline passes; never yields a zero duration. The yielded
/// value is informational: callers pace themselves between steps.
///
/// Uses the tokio clock, so tests running with paused time see the deadline
/// advance together with `tokio::time::sleep`.
#[derive(Debug, Clone)]
pub struct UntilTimeout {
    deadline: Instant,
}

impl UntilTimeout {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
        }
    }

    /// Time left before the deadline, `None` once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }

    /// Sleep for `interval`, cut short at the deadline.
    pub async fn pause(&self, interval: Duration) {
        if let Some(left) = self.remaining() {
            tokio::time::sleep(interval.min(left)).await;
        }
    }
}

impl Iterator for UntilTimeout {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.remaining()
    }
}

// Once the deadline has passed `remaining` can never be `Some` again.
impl FusedIterator for UntilTimeout {}
