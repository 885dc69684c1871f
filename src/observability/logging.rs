//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the orchestrator binary
//! - Map the configured `LogLevel` onto an `EnvFilter`
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins when set; otherwise the configured level applies
//! - The library never installs a subscriber itself

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;

/// Filter directives for `level` when `RUST_LOG` is absent.
pub fn default_directives(level: LogLevel) -> String {
    format!("gateway_runtime={},tower_http={}", level.as_filter(), level.as_filter())
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(level: LogLevel) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directives(level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
