//! Default gateway application and the hooks used to customise it.

use std::sync::Arc;

use axum::{routing::get, Extension, Json, Router};
use serde::Serialize;

use crate::http::server::ServerContext;
use crate::http::websocket;

/// Builds the application router served by the embedded server.
pub type AppFactory = Arc<dyn Fn() -> Router + Send + Sync>;

/// Post-processes the application before it is served.
pub type ExtendInterface = Arc<dyn Fn(Router) -> Router + Send + Sync>;

#[derive(Debug, Serialize)]
pub struct StatusDocument {
    pub version: &'static str,
    pub status: &'static str,
    pub open_connections: u64,
}

/// Default gateway: a status document and a WebSocket endpoint.
pub fn gateway_app() -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/ws", get(websocket::upgrade))
}

async fn status(Extension(context): Extension<ServerContext>) -> Json<StatusDocument> {
    let status = if context.should_exit.is_cancelled() {
        "shutting_down"
    } else {
        "ready"
    };
    Json(StatusDocument {
        version: env!("CARGO_PKG_VERSION"),
        status,
        open_connections: context.connections.active_count(),
    })
}
