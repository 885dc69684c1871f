//! Lifecycle controller for an embedded HTTP/WebSocket gateway.
//!
//! An orchestrator builds a [`RuntimeLifecycle`], calls `setup()`, runs
//! `run_forever()` and later `cancel()`, while waiting on
//! [`wait_ready_or_shutdown`] from its own thread. The embedded server never
//! installs process signal handlers; the orchestrator owns them.

pub mod config;
pub mod error;
#[cfg(feature = "embedded-axum")]
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::{LogLevel, RuntimeConfig};
pub use error::RuntimeError;
pub use lifecycle::{
    spawn_runtime, spawn_runtime_on, wait_ready_or_shutdown, ReadinessSignal, RuntimeHandle,
    RuntimeLifecycle, RuntimeState,
};
