//! Ready-or-shutdown signal shared between a runtime and its supervisor.
//!
//! The signal is a one-shot boolean backed by a mutex and condition variable,
//! so a supervisor thread can block on it without touching the runtime's own
//! event loop. It is set when the runtime becomes ready *and* when it gives
//! up without ever becoming ready, so waiters never hang on a failed start.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// One-shot, cross-thread readiness event. Cloning shares the same event.
#[derive(Debug, Clone, Default)]
pub struct ReadinessSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    set: Mutex<bool>,
    cond: Condvar,
}

impl ReadinessSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal and wake every waiter.
    ///
    /// Returns `true` only for the call that actually set it.
    pub fn set(&self) -> bool {
        let mut set = self.lock();
        if *set {
            return false;
        }
        *set = true;
        self.inner.cond.notify_all();
        true
    }

    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Block until set, or until `timeout` elapses. `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let guard = self.lock();
        match timeout {
            None => *self
                .inner
                .cond
                .wait_while(guard, |set| !*set)
                .unwrap_or_else(PoisonError::into_inner),
            Some(timeout) => {
                let (guard, _) = self
                    .inner
                    .cond
                    .wait_timeout_while(guard, timeout, |set| !*set)
                    .unwrap_or_else(PoisonError::into_inner);
                *guard
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner.set.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Supervisor-side query: `true` once the runtime is ready or has given up,
/// `false` if `timeout` elapses first.
///
/// Blocks the calling thread; call it from the supervisor's context (or
/// `spawn_blocking`), never from inside the runtime's event loop.
pub fn wait_ready_or_shutdown(timeout: Option<Duration>, signal: &ReadinessSignal) -> bool {
    signal.wait(timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn times_out_when_never_set() {
        let signal = ReadinessSignal::new();
        let start = Instant::now();
        assert!(!wait_ready_or_shutdown(Some(Duration::from_millis(50)), &signal));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn wakes_promptly_when_set_from_another_thread() {
        let signal = ReadinessSignal::new();
        let setter = signal.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            setter.set()
        });

        let start = Instant::now();
        assert!(wait_ready_or_shutdown(Some(Duration::from_secs(5)), &signal));
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(handle.join().unwrap());
    }

    #[test]
    fn set_only_once() {
        let signal = ReadinessSignal::new();
        assert!(!signal.is_set());
        assert!(signal.set());
        assert!(!signal.set());
        assert!(signal.is_set());
        // Already set: no timeout needed.
        assert!(wait_ready_or_shutdown(None, &signal));
    }
}
