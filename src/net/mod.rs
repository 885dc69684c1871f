//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! startup
//!     → listener.rs (bind or adopt, bind failures are fatal)
//! serve loop
//!     → accept → connection.rs (tracked until closed)
//!     → hand off to the HTTP layer
//! shutdown
//!     → stop accepting → begin_drain → wait_idle (bounded) → release socket
//! ```
//!
//! # Design Decisions
//! - Each connection tracked for graceful shutdown
//! - Per-connection accept errors never stop the accept loop

pub mod connection;
pub mod listener;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
