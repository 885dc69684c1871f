//! Shared utilities for lifecycle and gateway integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use gateway_runtime::config::{LogLevel, RuntimeConfig};
use gateway_runtime::lifecycle::{EmbeddedServer, ServerFactory, ServerSettings};
use gateway_runtime::RuntimeError;

/// Loopback config with a short drain timeout.
pub fn test_config(port: u16) -> RuntimeConfig {
    RuntimeConfig {
        host: "127.0.0.1".into(),
        port,
        max_message_size: 1024 * 1024,
        log_level: LogLevel::Debug,
        drain_timeout_secs: 5,
    }
}

/// Bind an ephemeral loopback port for a runtime to adopt.
pub fn loopback_listener() -> (std::net::TcpListener, SocketAddr) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// Ordered record of calls the runtime made into a [`MockServer`].
#[derive(Debug, Clone, Default)]
pub struct Events(Arc<Mutex<Vec<&'static str>>>);

impl Events {
    pub fn push(&self, event: &'static str) {
        self.0.lock().unwrap().push(event);
    }

    pub fn snapshot(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().unwrap().iter().filter(|e| **e == event).count()
    }
}

/// Programmable embedded server that never touches the network.
#[derive(Debug, Clone, Default)]
pub struct MockFactory {
    pub events: Events,
    pub startup_delay: Option<Duration>,
    pub fail_startup: bool,
    pub fail_shutdown: bool,
    /// Serve returns without waiting for the exit flag.
    pub serve_exits_early: bool,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ServerFactory for MockFactory {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn build(&self, settings: ServerSettings) -> Result<Box<dyn EmbeddedServer>, RuntimeError> {
        self.events.push("build");
        Ok(Box::new(MockServer {
            factory: self.clone(),
            settings,
        }))
    }
}

pub struct MockServer {
    factory: MockFactory,
    settings: ServerSettings,
}

#[async_trait]
impl EmbeddedServer for MockServer {
    async fn startup(
        &mut self,
        _listener: Option<std::net::TcpListener>,
    ) -> Result<(), RuntimeError> {
        self.factory.events.push("startup");
        if let Some(delay) = self.factory.startup_delay {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.settings.should_exit.cancelled() => {
                    self.factory.events.push("startup_interrupted");
                }
            }
        }
        if self.factory.fail_startup {
            return Err(RuntimeError::Startup("mock startup failure".into()));
        }
        Ok(())
    }

    async fn serve(&mut self) {
        self.factory.events.push("serve");
        if !self.factory.serve_exits_early {
            self.settings.should_exit.cancelled().await;
        }
        self.factory.events.push("serve_done");
    }

    async fn shutdown(&mut self) -> Result<(), RuntimeError> {
        self.factory.events.push("shutdown");
        if self.factory.fail_shutdown {
            return Err(RuntimeError::Shutdown("mock shutdown failure".into()));
        }
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }
}
