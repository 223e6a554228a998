//! Connection lifecycle as a small state machine.
//!
//! Transitions are pure: they take the current state plus an input and return
//! the next state. The actor in [`crate::sync`] owns the only instance and is
//! the only place that turns a `Backoff` deadline into an actual timer.

use std::time::Duration;
use tokio::time::Instant;

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (0-indexed): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle { attempt: u32 },
    Connecting { attempt: u32 },
    Connected,
    Backoff { attempt: u32, deadline: Instant },
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Idle { attempt: 0 }
    }
}

impl ConnectionState {
    pub fn status(&self) -> ConnectionStatus {
        match self {
            ConnectionState::Idle { .. } | ConnectionState::Backoff { .. } => {
                ConnectionStatus::Disconnected
            }
            ConnectionState::Connecting { .. } => ConnectionStatus::Connecting,
            ConnectionState::Connected => ConnectionStatus::Connected,
        }
    }

    /// Consecutive reconnect attempts since the last successful open.
    pub fn attempt(&self) -> u32 {
        match *self {
            ConnectionState::Idle { attempt }
            | ConnectionState::Connecting { attempt }
            | ConnectionState::Backoff { attempt, .. } => attempt,
            ConnectionState::Connected => 0,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        match *self {
            ConnectionState::Backoff { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// Manual `connect()`. Returns the next state and whether a dial must start.
    ///
    /// A pending backoff is abandoned in favour of dialing right away; the
    /// attempt counter is left alone until an open succeeds.
    pub fn connect_requested(self) -> (Self, bool) {
        match self {
            ConnectionState::Idle { attempt } | ConnectionState::Backoff { attempt, .. } => {
                (ConnectionState::Connecting { attempt }, true)
            }
            ConnectionState::Connecting { .. } | ConnectionState::Connected => (self, false),
        }
    }

    pub fn opened(self) -> Self {
        ConnectionState::Connected
    }

    /// Unexpected close of the session, or a dial that never opened.
    pub fn closed(self, policy: &ReconnectPolicy, now: Instant) -> Self {
        let attempt = self.attempt();
        match self {
            ConnectionState::Connecting { .. } | ConnectionState::Connected => {
                if policy.allows_retry(attempt) {
                    ConnectionState::Backoff {
                        attempt,
                        deadline: now
                            .checked_add(policy.delay_for(attempt))
                            .unwrap_or_else(|| now + FAR_FUTURE),
                    }
                } else {
                    ConnectionState::Idle { attempt }
                }
            }
            // Nothing was open; a stray close changes nothing.
            ConnectionState::Idle { .. } | ConnectionState::Backoff { .. } => self,
        }
    }

    /// Backoff timer fired: count the attempt and dial again.
    pub fn backoff_elapsed(self) -> (Self, bool) {
        match self {
            ConnectionState::Backoff { attempt, .. } => (
                ConnectionState::Connecting {
                    attempt: attempt.saturating_add(1),
                },
                true,
            ),
            other => (other, false),
        }
    }

    /// Manual `disconnect()`: always lands in `Idle`, no timer survives.
    pub fn disconnected(self) -> Self {
        ConnectionState::Idle {
            attempt: self.attempt(),
        }
    }
}
