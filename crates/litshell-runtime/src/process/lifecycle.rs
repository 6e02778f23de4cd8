//! Shared lifecycle state for one backend launch.
//!
//! Replaces ambient module flags with an explicit value object shared by
//! Arc between the supervisor's monitor task, the shutdown path, and any
//! caller awaiting readiness.

use litshell_core::ReadinessState;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Lifecycle state of a supervised backend.
#[derive(Debug)]
pub struct Lifecycle {
    readiness: watch::Sender<ReadinessState>,
    quitting: AtomicBool,
    exit_code: OnceLock<Option<i32>>,
}

impl Lifecycle {
    #[must_use]
    pub fn new() -> Self {
        let (readiness, _) = watch::channel(ReadinessState::Starting);
        Self {
            readiness,
            quitting: AtomicBool::new(false),
            exit_code: OnceLock::new(),
        }
    }

    /// Current readiness state.
    #[must_use]
    pub fn readiness(&self) -> ReadinessState {
        *self.readiness.borrow()
    }

    /// Subscribe to readiness changes.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ReadinessState> {
        self.readiness.subscribe()
    }

    /// Transition out of `Starting`.
    ///
    /// Exactly one transition is permitted; later calls are no-ops.
    /// Returns whether this call performed the transition.
    pub fn transition(&self, to: ReadinessState) -> bool {
        self.readiness.send_if_modified(|state| {
            if *state == ReadinessState::Starting && to != ReadinessState::Starting {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// Mark the start of a deliberate shutdown. Sticky: once set, the
    /// exit observer treats any termination as expected.
    pub fn begin_quit(&self) {
        self.quitting.store(true, Ordering::SeqCst);
    }

    /// Whether a deliberate shutdown is in progress.
    #[must_use]
    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }

    /// Record the subprocess exit code. First write wins.
    pub fn set_exit_code(&self, code: Option<i32>) {
        let _ = self.exit_code.set(code);
    }

    /// Exit code recorded by the exit observer, if the process has
    /// terminated.
    #[must_use]
    pub fn exit_code(&self) -> Option<Option<i32>> {
        self.exit_code.get().copied()
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
    fn only_one_transition_out_of_starting() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.readiness(), ReadinessState::Starting);

        assert!(lifecycle.transition(ReadinessState::Ready));
        assert!(!lifecycle.transition(ReadinessState::Failed));
        assert!(!lifecycle.transition(ReadinessState::TimedOut));
        assert_eq!(lifecycle.readiness(), ReadinessState::Ready);
    }

    #[test]
    fn transition_to_starting_is_rejected() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.transition(ReadinessState::Starting));
        assert_eq!(lifecycle.readiness(), ReadinessState::Starting);
    }

    #[test]
    fn quitting_flag_is_sticky() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_quitting());
        lifecycle.begin_quit();
        lifecycle.begin_quit();
        assert!(lifecycle.is_quitting());
    }

    #[test]
    fn first_exit_code_wins() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.exit_code(), None);
        lifecycle.set_exit_code(Some(1));
        lifecycle.set_exit_code(Some(2));
        assert_eq!(lifecycle.exit_code(), Some(Some(1)));
    }

    #[tokio::test]
    async fn watch_observes_transition() {
        let lifecycle = Lifecycle::new();
        let mut rx = lifecycle.watch();
        lifecycle.transition(ReadinessState::Ready);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ReadinessState::Ready);
    }
}
