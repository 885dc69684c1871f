//! Embedded HTTP/WebSocket server.
//!
//! # Data Flow
//! ```text
//! AxumFactory (app factory + extend hook + lifespan hooks)
//!     → server.rs (AxumServer: startup → serve → shutdown)
//!     → hyper connection per accepted socket
//!     → app.rs routes: /status, /ws (websocket.rs)
//! ```

pub mod app;
pub mod lifespan;
pub mod server;
pub mod websocket;

pub use app::{gateway_app, AppFactory, ExtendInterface, StatusDocument};
pub use lifespan::{HookError, Lifespan};
pub use server::{AxumFactory, AxumServer, ServerContext};
