//! Runtime error definitions.

use thiserror::Error;

use crate::lifecycle::RuntimeState;

/// Errors surfaced by the runtime lifecycle and embedded servers.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The embedded server implementation is not compiled into this build.
    #[error("embedded server dependency `{0}` is not available; rebuild with the `embedded-axum` feature")]
    MissingDependency(&'static str),

    /// Host/port could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A startup hook failed before the server became ready.
    #[error("startup failed: {0}")]
    Startup(String),

    /// Draining or a shutdown hook failed. Logged, never fatal.
    #[error("shutdown failed: {0}")]
    Shutdown(String),

    /// Configuration rejected at setup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// An operation was invoked out of order.
    #[error("expected runtime state {expected:?}, found {actual:?}")]
    InvalidState {
        expected: RuntimeState,
        actual: RuntimeState,
    },

    /// Setup was abandoned because `cancel()` was requested.
    #[error("setup aborted by cancellation")]
    Cancelled,

    /// The dedicated runtime thread panicked.
    #[error("runtime worker thread panicked")]
    WorkerPanicked,
}
