//! Runtime state machine.
//!
//! # States
//! ```text
//! Created → SettingUp → Ready → Running → Cancelling → Stopped
//! ```
//!
//! Every transition moves forward. `Stopped` is terminal and reachable from
//! every other state.

use tokio::sync::watch;

/// Lifecycle state of a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuntimeState {
    Created,
    SettingUp,
    Ready,
    Running,
    Cancelling,
    Stopped,
}

/// Shared, observable state cell. Transitions never move backwards.
#[derive(Debug)]
pub struct StateCell {
    tx: watch::Sender<RuntimeState>,
}

impl StateCell {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(RuntimeState::Created);
        Self { tx }
    }

    pub fn get(&self) -> RuntimeState {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RuntimeState> {
        self.tx.subscribe()
    }

    /// Move `from → to` only if the current state is exactly `from`.
    pub fn transition(&self, from: RuntimeState, to: RuntimeState) -> bool {
        debug_assert!(from < to);
        self.tx.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        })
    }

    /// Enter `Cancelling` unless already cancelling or stopped.
    ///
    /// Returns the state observed before the call.
    pub fn begin_cancel(&self) -> RuntimeState {
        let mut previous = RuntimeState::Stopped;
        self.tx.send_if_modified(|state| {
            previous = *state;
            if *state < RuntimeState::Cancelling {
                *state = RuntimeState::Cancelling;
                true
            } else {
                false
            }
        });
        previous
    }

    /// Enter `Stopped`. Returns false if it was already stopped.
    pub fn stop(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == RuntimeState::Stopped {
                false
            } else {
                *state = RuntimeState::Stopped;
                true
            }
        })
    }

    /// Wait until `Stopped` has been reached.
    pub async fn wait_stopped(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| *state == RuntimeState::Stopped).await;
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_requires_exact_source_state() {
        let cell = StateCell::new();
        assert!(!cell.transition(RuntimeState::Ready, RuntimeState::Running));
        assert!(cell.transition(RuntimeState::Created, RuntimeState::SettingUp));
        assert!(!cell.transition(RuntimeState::Created, RuntimeState::SettingUp));
        assert_eq!(cell.get(), RuntimeState::SettingUp);
    }

    #[test]
    fn begin_cancel_reports_previous_state_once() {
        let cell = StateCell::new();
        assert!(cell.transition(RuntimeState::Created, RuntimeState::SettingUp));
        assert_eq!(cell.begin_cancel(), RuntimeState::SettingUp);
        assert_eq!(cell.get(), RuntimeState::Cancelling);
        assert_eq!(cell.begin_cancel(), RuntimeState::Cancelling);

        // A late setup cannot resurrect the runtime.
        assert!(!cell.transition(RuntimeState::SettingUp, RuntimeState::Ready));
    }

    #[test]
    fn stop_is_terminal() {
        let cell = StateCell::new();
        assert!(cell.stop());
        assert!(!cell.stop());
        assert_eq!(cell.begin_cancel(), RuntimeState::Stopped);
        assert_eq!(cell.get(), RuntimeState::Stopped);
    }

    #[tokio::test]
    async fn wait_stopped_wakes_on_stop() {
        let cell = std::sync::Arc::new(StateCell::new());
        let waiter = {
            let cell = cell.clone();
            tokio::spawn(async move { cell.wait_stopped().await })
        };
        cell.stop();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }
}
