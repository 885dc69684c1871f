//! Embedded server seam.
//!
//! # Responsibilities
//! - Define the `{startup, serve, shutdown}` contract every embedded server
//!   implements so the runtime can drive it
//! - Translate `RuntimeConfig` into the server's native settings
//! - Resolve the embedded server implementation at setup, failing with a
//!   typed `MissingDependency` when it is not compiled in
//!
//! # Design Decisions
//! - Implementations never install process signal handlers; signal ownership
//!   belongs to the orchestrator
//! - `should_exit` is a cancellation token owned by the adapter and observed by
//!   its serve loop; it moves false → true once

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;

/// Native settings handed to an embedded server.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Maximum WebSocket message/frame and request body size in bytes.
    pub max_message_size: usize,
    pub log_level: tracing::Level,
    pub drain_timeout: Duration,
    /// Exit flag observed by the serve loop.
    pub should_exit: CancellationToken,
}

impl ServerSettings {
    pub fn from_config(config: &RuntimeConfig, should_exit: CancellationToken) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            max_message_size: config.max_message_size,
            log_level: config.log_level.as_tracing_level(),
            drain_timeout: config.drain_timeout(),
            should_exit,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// An embedded server driven entirely by an external lifecycle.
#[async_trait]
pub trait EmbeddedServer: Send {
    /// Load configuration, run startup hooks and bind (or adopt `listener`).
    ///
    /// Returns early without binding when exit was already requested.
    async fn startup(
        &mut self,
        listener: Option<std::net::TcpListener>,
    ) -> Result<(), RuntimeError>;

    /// Accept and dispatch until `should_exit` is observed.
    async fn serve(&mut self);

    /// Drain in-flight work, run shutdown hooks and release sockets.
    async fn shutdown(&mut self) -> Result<(), RuntimeError>;

    /// Address bound during startup, if any.
    fn local_addr(&self) -> Option<SocketAddr>;
}

/// Capability that constructs an embedded server.
pub trait ServerFactory: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn build(&self, settings: ServerSettings) -> Result<Box<dyn EmbeddedServer>, RuntimeError>;
}

/// Factory standing in for an implementation that is not compiled in.
#[derive(Debug, Clone, Copy)]
pub struct Unavailable {
    dependency: &'static str,
}

impl Unavailable {
    pub fn new(dependency: &'static str) -> Self {
        Self { dependency }
    }
}

impl ServerFactory for Unavailable {
    fn name(&self) -> &'static str {
        self.dependency
    }

    fn build(&self, _settings: ServerSettings) -> Result<Box<dyn EmbeddedServer>, RuntimeError> {
        Err(RuntimeError::MissingDependency(self.dependency))
    }
}

/// The embedded server this build was compiled with.
#[cfg(feature = "embedded-axum")]
pub fn default_factory() -> Box<dyn ServerFactory> {
    Box::new(crate::http::AxumFactory::default())
}

/// The embedded server this build was compiled with.
#[cfg(not(feature = "embedded-axum"))]
pub fn default_factory() -> Box<dyn ServerFactory> {
    Box::new(Unavailable::new("axum"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn settings_translate_runtime_config() {
        let config = RuntimeConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            max_message_size: 1_048_576,
            log_level: LogLevel::Info,
            drain_timeout_secs: 5,
        };
        let settings = ServerSettings::from_config(&config, CancellationToken::new());

        assert_eq!(settings.bind_address(), "127.0.0.1:8080");
        assert_eq!(settings.max_message_size, 1_048_576);
        assert_eq!(settings.log_level, tracing::Level::INFO);
        assert_eq!(settings.drain_timeout, Duration::from_secs(5));
        assert!(!settings.should_exit.is_cancelled());
    }

    #[test]
    fn unavailable_factory_reports_missing_dependency() {
        let settings = ServerSettings::from_config(&RuntimeConfig::default(), CancellationToken::new());
        let err = Unavailable::new("axum").build(settings).err().unwrap();
        assert!(matches!(err, RuntimeError::MissingDependency("axum")));
    }
}
