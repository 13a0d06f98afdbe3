//! Host lifecycle state machine.
//!
//! # States
//! ```text
//! NotStarted → Starting → Running → ShuttingDown → Stopped
//!                  └──────────────────────────────────┘
//!                     (fatal wiring failure)
//! ```
//!
//! # Design Decisions
//! - Transitions are checked; anything not drawn above is rejected
//! - Current state is published on a watch channel so tasks can await it
//! - State changes logged for observability

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::observability::metrics;

/// Lifecycle state of the application host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostState {
    NotStarted,
    Starting,
    Running,
    ShuttingDown,
    Stopped,
}

impl HostState {
    /// Whether `self → next` is a legal transition.
    pub fn can_transition_to(self, next: HostState) -> bool {
        use HostState::*;
        matches!(
            (self, next),
            (NotStarted, Starting)
                | (Starting, Running)
                | (Starting, Stopped)
                | (Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    /// Numeric code exported as the `host_state` gauge.
    pub fn as_code(self) -> u8 {
        match self {
            HostState::NotStarted => 0,
            HostState::Starting => 1,
            HostState::Running => 2,
            HostState::ShuttingDown => 3,
            HostState::Stopped => 4,
        }
    }
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HostState::NotStarted => "NotStarted",
            HostState::Starting => "Starting",
            HostState::Running => "Running",
            HostState::ShuttingDown => "ShuttingDown",
            HostState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Rejected state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move host from {from} to {to}")]
pub struct InvalidTransition {
    pub from: HostState,
    pub to: HostState,
}

/// Shared handle to the host's lifecycle state.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    tx: Arc<watch::Sender<HostState>>,
}

impl Lifecycle {
    /// Create a lifecycle in `NotStarted`.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(HostState::NotStarted);
        Self { tx: Arc::new(tx) }
    }

    /// Current state.
    pub fn current(&self) -> HostState {
        *self.tx.borrow()
    }

    /// Move to `next` if legal from the current state.
    pub fn transition(&self, next: HostState) -> Result<HostState, InvalidTransition> {
        let mut previous = self.current();
        let changed = self.tx.send_if_modified(|state| {
            previous = *state;
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        });

        if !changed {
            return Err(InvalidTransition {
                from: previous,
                to: next,
            });
        }

        tracing::info!(from = %previous, to = %next, "Host state changed");
        metrics::record_host_state(next);
        Ok(previous)
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<HostState> {
        self.tx.subscribe()
    }

    /// Wait until the host reaches `target`.
    pub async fn wait_for(&self, target: HostState) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|state| *state == target).await;
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.current(), HostState::NotStarted);

        for next in [
            HostState::Starting,
            HostState::Running,
            HostState::ShuttingDown,
            HostState::Stopped,
        ] {
            lifecycle.transition(next).unwrap();
        }
        assert_eq!(lifecycle.current(), HostState::Stopped);
    }

    #[test]
    fn starting_may_abort_to_stopped() {
        let lifecycle = Lifecycle::new();
        lifecycle.transition(HostState::Starting).unwrap();
        assert_eq!(
            lifecycle.transition(HostState::Stopped).unwrap(),
            HostState::Starting
        );
    }

    #[test]
    fn illegal_transitions_rejected() {
        let lifecycle = Lifecycle::new();
        let err = lifecycle.transition(HostState::Running).unwrap_err();
        assert_eq!(
            err,
            InvalidTransition {
                from: HostState::NotStarted,
                to: HostState::Running
            }
        );

        lifecycle.transition(HostState::Starting).unwrap();
        assert!(lifecycle.transition(HostState::Starting).is_err());
        assert!(lifecycle.transition(HostState::ShuttingDown).is_err());
        assert_eq!(lifecycle.current(), HostState::Starting);
    }

    #[test]
    fn stopped_is_terminal() {
        assert!(!HostState::Stopped.can_transition_to(HostState::Starting));
        assert!(!HostState::Stopped.can_transition_to(HostState::Running));
        assert!(!HostState::Stopped.can_transition_to(HostState::Stopped));
    }

    #[tokio::test]
    async fn wait_for_observes_transition() {
        let lifecycle = Lifecycle::new();
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.wait_for(HostState::Running).await })
        };

        lifecycle.transition(HostState::Starting).unwrap();
        lifecycle.transition(HostState::Running).unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}
