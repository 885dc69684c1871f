//! Runtime hosted on its own thread and event loop.
//!
//! # Data Flow
//! ```text
//! supervisor thread                      runtime thread (current-thread tokio)
//!     spawn_runtime() ───────────────▶   setup() → run_forever()
//!     wait_ready_or_shutdown() ◀──────   readiness signal
//!     cancel() ── stop token ────────▶   cancel() → drain → Stopped
//!     join() ◀────────────────────────   setup result
//! ```
//!
//! The supervisor never touches the runtime's event loop directly: the stop
//! request is a thread-safe token the loop observes, and readiness is a
//! condvar-backed signal.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::RuntimeError;
use crate::lifecycle::readiness::{wait_ready_or_shutdown, ReadinessSignal};
use crate::lifecycle::runtime::RuntimeLifecycle;
use crate::lifecycle::state::RuntimeState;

/// Supervisor-side handle to a runtime running on a dedicated thread.
#[derive(Debug)]
pub struct RuntimeHandle {
    lifecycle: Arc<RuntimeLifecycle>,
    readiness: ReadinessSignal,
    stop: CancellationToken,
    thread: JoinHandle<Result<(), RuntimeError>>,
}

/// Start `lifecycle` on a new thread with its own event loop.
pub fn spawn_runtime(lifecycle: RuntimeLifecycle) -> io::Result<RuntimeHandle> {
    spawn(lifecycle, None)
}

/// Start `lifecycle` on a new thread, serving on an already-bound listener.
pub fn spawn_runtime_on(
    lifecycle: RuntimeLifecycle,
    listener: std::net::TcpListener,
) -> io::Result<RuntimeHandle> {
    spawn(lifecycle, Some(listener))
}

fn spawn(
    lifecycle: RuntimeLifecycle,
    listener: Option<std::net::TcpListener>,
) -> io::Result<RuntimeHandle> {
    let lifecycle = Arc::new(lifecycle);
    let readiness = lifecycle.readiness();
    let stop = CancellationToken::new();

    let event_loop = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let worker = Arc::clone(&lifecycle);
    let stop_requested = stop.clone();
    let thread = std::thread::Builder::new()
        .name("gateway-runtime".to_string())
        .spawn(move || event_loop.block_on(drive(worker, listener, stop_requested)))?;

    Ok(RuntimeHandle {
        lifecycle,
        readiness,
        stop,
        thread,
    })
}

async fn drive(
    lifecycle: Arc<RuntimeLifecycle>,
    listener: Option<std::net::TcpListener>,
    stop: CancellationToken,
) -> Result<(), RuntimeError> {
    // Runs beside setup/run_forever so a stop request is honoured in any state.
    let canceller = {
        let lifecycle = Arc::clone(&lifecycle);
        tokio::spawn(async move {
            stop.cancelled().await;
            lifecycle.cancel().await;
        })
    };

    let result = match listener {
        Some(listener) => lifecycle.setup_with_listener(listener).await,
        None => lifecycle.setup().await,
    };
    if result.is_ok() {
        lifecycle.run_forever().await;
    }

    canceller.abort();
    result
}

impl RuntimeHandle {
    /// See [`wait_ready_or_shutdown`].
    pub fn wait_ready_or_shutdown(&self, timeout: Option<Duration>) -> bool {
        wait_ready_or_shutdown(timeout, &self.readiness)
    }

    pub fn readiness(&self) -> ReadinessSignal {
        self.readiness.clone()
    }

    pub fn state(&self) -> RuntimeState {
        self.lifecycle.state()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lifecycle.local_addr()
    }

    /// Observe state transitions from any runtime or thread.
    pub fn subscribe_state(&self) -> watch::Receiver<RuntimeState> {
        self.lifecycle.subscribe_state()
    }

    /// Ask the runtime to stop. Non-blocking and idempotent.
    pub fn cancel(&self) {
        self.stop.cancel();
    }

    /// Wait for the runtime thread to finish, returning the setup result.
    pub fn join(self) -> Result<(), RuntimeError> {
        self.thread
            .join()
            .unwrap_or(Err(RuntimeError::WorkerPanicked))
    }
}
