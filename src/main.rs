//! Gateway runtime orchestrator.
//!
//! Runs one gateway runtime on its own thread and event loop, waits for it
//! to report ready, and cancels it on SIGINT/SIGTERM. This process is the
//! only place signal handlers are installed.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use gateway_runtime::config::{load_config, validate_config, RuntimeConfig};
use gateway_runtime::lifecycle::signals::wait_for_shutdown_signal;
use gateway_runtime::observability::logging;
use gateway_runtime::{spawn_runtime, RuntimeLifecycle, RuntimeState};

#[derive(Parser)]
#[command(name = "gateway-runtime")]
#[command(about = "Run an embedded HTTP/WebSocket gateway under lifecycle control", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Seconds to wait for the runtime to become ready.
    #[arg(long, default_value_t = 30)]
    ready_timeout: u64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RuntimeConfig::from_env()?,
    };
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("invalid configuration: {}", error);
        }
        return Err("invalid configuration".into());
    }

    logging::init(config.log_level)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.bind_address(),
        "gateway-runtime starting"
    );

    let handle = spawn_runtime(RuntimeLifecycle::new(config))?;

    if !handle.wait_ready_or_shutdown(Some(Duration::from_secs(cli.ready_timeout))) {
        tracing::error!(timeout_secs = cli.ready_timeout, "Runtime did not become ready");
        handle.cancel();
        handle.join()?;
        return Err("runtime did not become ready in time".into());
    }
    if handle.state() == RuntimeState::Stopped {
        // Ready-or-shutdown fired on the failure path; join surfaces the cause.
        handle.join()?;
        return Ok(());
    }
    tracing::info!(address = ?handle.local_addr(), "Runtime ready");

    let signals = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut state = handle.subscribe_state();
    let signal = signals.block_on(async {
        tokio::select! {
            signal = wait_for_shutdown_signal() => signal.map(Some),
            _ = state.wait_for(|state| *state == RuntimeState::Stopped) => Ok(None),
        }
    })?;
    match signal {
        Some(signal) => tracing::info!(signal, "Shutdown signal received"),
        None => tracing::warn!("Runtime stopped without a shutdown signal"),
    }

    handle.cancel();
    handle.join()?;
    tracing::info!("Shutdown complete");
    Ok(())
}
