//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind to the configured host/port, mapping failures to `RuntimeError::Bind`
//! - Adopt listeners bound by the orchestrator ahead of time
//! - Classify accept errors that only affect a single connection

use std::io;
use tokio::net::TcpListener;

use crate::error::RuntimeError;

/// Bind a listener on `host:port`. Host names are resolved.
pub async fn bind(host: &str, port: u16) -> Result<TcpListener, RuntimeError> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(|source| RuntimeError::Bind {
            address: format!("{}:{}", host, port),
            source,
        })?;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Listener bound");
    }
    Ok(listener)
}

/// Take over a listener bound elsewhere. Must run inside a Tokio runtime.
pub fn adopt(listener: std::net::TcpListener) -> Result<TcpListener, RuntimeError> {
    let address = listener
        .local_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "<unbound>".to_string());

    let listener = listener
        .set_nonblocking(true)
        .and_then(|()| TcpListener::from_std(listener))
        .map_err(|source| RuntimeError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(address = %address, "Adopted pre-bound listener");
    Ok(listener)
}

/// Errors scoped to one connection; the accept loop should simply continue.
pub fn is_connection_error(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
    )
}
