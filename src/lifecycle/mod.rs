//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Setup (runtime.rs):
//!     Validate config → Resolve server (adapter.rs) → Startup hooks → Bind
//!     → Ready → readiness signal set
//!
//! Run (runtime.rs):
//!     Serve loop until the exit token is cancelled
//!
//! Cancel (runtime.rs):
//!     Cancelling → exit token → Drain connections → Shutdown hooks → Stopped
//!
//! Supervision (readiness.rs, handle.rs):
//!     wait_ready_or_shutdown() blocks the supervisor, never the runtime loop
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → orchestrator → cancel()
//! ```
//!
//! # Design Decisions
//! - Forward-only state machine (state.rs); Stopped reachable from anywhere
//! - Readiness is set on success and on permanent failure alike; `setup()`'s
//!   result tells the two apart
//! - Cancellation is cooperative: the serve loop observes a token

pub mod adapter;
pub mod handle;
pub mod readiness;
pub mod runtime;
pub mod signals;
pub mod state;

pub use adapter::{default_factory, EmbeddedServer, ServerFactory, ServerSettings, Unavailable};
pub use handle::{spawn_runtime, spawn_runtime_on, RuntimeHandle};
pub use readiness::{wait_ready_or_shutdown, ReadinessSignal};
pub use runtime::RuntimeLifecycle;
pub use state::{RuntimeState, StateCell};
