//! WebSocket gateway endpoint.
//!
//! # Responsibilities
//! - Complete the upgrade handshake with the configured size limits
//! - Echo text and binary frames back to the client
//! - Close sessions with "going away" when the server is told to exit
//!
//! # Design Decisions
//! - Upgraded sessions are tracked like connections so shutdown drains them
//! - Ping/pong handled by the protocol layer

use axum::{
    extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    response::Response,
    Extension,
};

use crate::http::server::ServerContext;

/// Upgrade handler for the gateway's WebSocket route.
pub async fn upgrade(ws: WebSocketUpgrade, Extension(context): Extension<ServerContext>) -> Response {
    let limit = context.max_message_size;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| session(socket, context))
}

async fn session(mut socket: WebSocket, context: ServerContext) {
    let guard = context.connections.track();
    tracing::debug!(connection_id = %guard.id(), "WebSocket session opened");

    loop {
        tokio::select! {
            _ = context.should_exit.cancelled() => {
                let frame = CloseFrame {
                    code: close_code::AWAY,
                    reason: Utf8Bytes::from_static("server shutting down"),
                };
                let _ = socket.send(Message::Close(Some(frame))).await;
                break;
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(message @ (Message::Text(_) | Message::Binary(_)))) => {
                    if socket.send(message).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::debug!(connection_id = %guard.id(), error = %err, "WebSocket receive failed");
                    break;
                }
            },
        }
    }

    tracing::debug!(connection_id = %guard.id(), "WebSocket session closed");
}
