//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle + embedded server
//!     → tracing events (state transitions, bind, drain, hook failures)
//!     → logging.rs subscriber (installed by the binary)
//! ```

pub mod logging;
