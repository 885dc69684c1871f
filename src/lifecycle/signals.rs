//! OS signal handling for the orchestrating process.
//!
//! # Responsibilities
//! - Wait for SIGINT/SIGTERM (Ctrl-C on other platforms)
//!
//! # Design Decisions
//! - Only the orchestrator calls this; embedded servers never install
//!   handlers, so there is exactly one owner of process signals
//! - Uses Tokio's signal handling (async-safe)

/// Completes when the process receives a termination signal.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    };
    Ok(name)
}

/// Completes when the process receives a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl-C")
}
