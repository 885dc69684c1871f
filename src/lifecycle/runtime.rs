//! Runtime lifecycle controller.
//!
//! # Operations
//! ```text
//! setup()        Created → SettingUp → Ready        (signal set)
//!                         └──────────→ Stopped      (signal set, error returned)
//! run_forever()  Ready → Running ... → Stopped      (returns after cancel)
//! cancel()       any → Cancelling → Stopped         (idempotent)
//! ```
//!
//! All three take `&self`: the runtime is shared through `Arc` so `cancel()`
//! can be called from a different task or thread while `run_forever()` is
//! suspended. The embedded server sits behind an async mutex; whichever
//! operation takes it out runs its shutdown exactly once.

use std::net::SocketAddr;
use std::sync::OnceLock;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

use crate::config::{validate_config, RuntimeConfig};
use crate::error::RuntimeError;
use crate::lifecycle::adapter::{default_factory, EmbeddedServer, ServerFactory, ServerSettings};
use crate::lifecycle::readiness::ReadinessSignal;
use crate::lifecycle::state::{RuntimeState, StateCell};

/// Drives one embedded server through setup, serving and cancellation.
pub struct RuntimeLifecycle {
    config: RuntimeConfig,
    factory: Box<dyn ServerFactory>,
    state: StateCell,
    readiness: ReadinessSignal,
    should_exit: CancellationToken,
    server: Mutex<Option<Box<dyn EmbeddedServer>>>,
    local_addr: OnceLock<SocketAddr>,
}

impl RuntimeLifecycle {
    /// Create a runtime backed by the embedded server compiled into this build.
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_factory(config, default_factory())
    }

    pub fn with_factory(config: RuntimeConfig, factory: Box<dyn ServerFactory>) -> Self {
        Self {
            config,
            factory,
            state: StateCell::new(),
            readiness: ReadinessSignal::new(),
            should_exit: CancellationToken::new(),
            server: Mutex::new(None),
            local_addr: OnceLock::new(),
        }
    }

    /// Use a readiness signal owned by the orchestrator.
    pub fn with_readiness(mut self, readiness: ReadinessSignal) -> Self {
        self.readiness = readiness;
        self
    }

    pub fn state(&self) -> RuntimeState {
        self.state.get()
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<RuntimeState> {
        self.state.subscribe()
    }

    /// Handle to the ready-or-shutdown signal; outlives the runtime.
    pub fn readiness(&self) -> ReadinessSignal {
        self.readiness.clone()
    }

    /// Address the embedded server bound, once setup succeeded.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr.get().copied()
    }

    /// Build the embedded server, bind and run startup hooks.
    ///
    /// On success the runtime is `Ready`. On failure it is `Stopped` and the
    /// error is returned; either way the readiness signal is set.
    pub async fn setup(&self) -> Result<(), RuntimeError> {
        self.setup_inner(None).await
    }

    /// Like [`setup`](Self::setup), adopting an already-bound listener.
    pub async fn setup_with_listener(
        &self,
        listener: std::net::TcpListener,
    ) -> Result<(), RuntimeError> {
        self.setup_inner(Some(listener)).await
    }

    async fn setup_inner(
        &self,
        listener: Option<std::net::TcpListener>,
    ) -> Result<(), RuntimeError> {
        if !self
            .state
            .transition(RuntimeState::Created, RuntimeState::SettingUp)
        {
            let actual = self.state.get();
            tracing::warn!(state = ?actual, "setup called out of order");
            return Err(if actual >= RuntimeState::Cancelling {
                RuntimeError::Cancelled
            } else {
                RuntimeError::InvalidState {
                    expected: RuntimeState::Created,
                    actual,
                }
            });
        }

        let abort = AbortedSetup::arm(self);
        let result = self.bring_up(listener).await;
        abort.disarm();
        result
    }

    /// Everything `setup` does once the runtime is `SettingUp`.
    async fn bring_up(&self, listener: Option<std::net::TcpListener>) -> Result<(), RuntimeError> {
        tracing::info!(
            server = self.factory.name(),
            bind_address = %self.config.bind_address(),
            max_message_size = self.config.max_message_size,
            log_level = %self.config.log_level,
            "Runtime setting up"
        );

        if let Err(err) = self.start_server(listener).await {
            tracing::error!(error = %err, "Runtime setup failed");
            self.abandon().await;
            return Err(err);
        }

        if self
            .state
            .transition(RuntimeState::SettingUp, RuntimeState::Ready)
        {
            self.readiness.set();
            tracing::info!(address = ?self.local_addr(), "Runtime ready");
            Ok(())
        } else {
            // cancel() arrived while starting. It may have run before the
            // server was inserted, so release whatever is still here.
            tracing::info!("Setup finished after cancellation was requested");
            self.shutdown_server().await;
            self.state.wait_stopped().await;
            Err(RuntimeError::Cancelled)
        }
    }

    async fn start_server(
        &self,
        listener: Option<std::net::TcpListener>,
    ) -> Result<(), RuntimeError> {
        validate_config(&self.config).map_err(|errors| {
            let detail = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            RuntimeError::InvalidConfig(detail)
        })?;

        let settings = ServerSettings::from_config(&self.config, self.should_exit.clone());
        let server = self.factory.build(settings)?;

        let mut slot = self.server.lock().await;
        let server = slot.insert(server);
        if let Err(err) = server.startup(listener).await {
            slot.take();
            return Err(err);
        }
        if let Some(addr) = server.local_addr() {
            let _ = self.local_addr.set(addr);
        }
        Ok(())
    }

    /// Give up on a runtime that never became ready.
    async fn abandon(&self) {
        self.should_exit.cancel();
        self.server.lock().await.take();
        self.finish();
    }

    /// Serve until cancelled. Returns once the runtime is `Stopped`.
    ///
    /// Returns immediately if the runtime is not `Ready`.
    pub async fn run_forever(&self) {
        if !self
            .state
            .transition(RuntimeState::Ready, RuntimeState::Running)
        {
            tracing::warn!(state = ?self.state.get(), "run_forever called while not ready");
            return;
        }
        tracing::info!("Runtime running");

        {
            let mut slot = self.server.lock().await;
            if let Some(server) = slot.as_mut() {
                server.serve().await;
            }
        }

        if !self.should_exit.is_cancelled() {
            tracing::warn!("Serve loop exited without cancellation, shutting down");
            self.cancel().await;
        }
        self.state.wait_stopped().await;
        tracing::info!("Runtime stopped");
    }

    /// Request shutdown and wait for it to complete.
    ///
    /// Safe to call from any task, any number of times, in any state; past
    /// `Stopped` it is a no-op.
    pub async fn cancel(&self) {
        match self.state.begin_cancel() {
            RuntimeState::Stopped => {
                tracing::debug!("cancel on stopped runtime ignored");
                return;
            }
            RuntimeState::Cancelling => {
                self.state.wait_stopped().await;
                return;
            }
            RuntimeState::Created => {
                tracing::info!("Runtime cancelled before setup");
                self.should_exit.cancel();
                self.finish();
                return;
            }
            previous => {
                tracing::info!(state = ?previous, "Runtime cancelling");
            }
        }

        // The flag must be visible before the server is asked to shut down.
        self.should_exit.cancel();

        self.shutdown_server().await;
        self.finish();
    }

    /// Shut the embedded server down if nobody else has taken it yet.
    ///
    /// Waits for an in-progress startup or serve loop to release the server.
    async fn shutdown_server(&self) {
        let server = self.server.lock().await.take();
        if let Some(mut server) = server {
            if let Err(err) = server.shutdown().await {
                tracing::warn!(error = %err, "Embedded server shutdown reported an error");
            }
        }
    }

    /// Terminal transition; also releases any supervisor still waiting.
    fn finish(&self) {
        if self.state.stop() {
            tracing::debug!("Runtime state is now Stopped");
        }
        self.readiness.set();
    }
}

/// Stops a runtime whose `setup()` future was dropped before finishing.
struct AbortedSetup<'a> {
    lifecycle: Option<&'a RuntimeLifecycle>,
}

impl<'a> AbortedSetup<'a> {
    fn arm(lifecycle: &'a RuntimeLifecycle) -> Self {
        Self {
            lifecycle: Some(lifecycle),
        }
    }

    fn disarm(mut self) {
        self.lifecycle = None;
    }
}

impl Drop for AbortedSetup<'_> {
    fn drop(&mut self) {
        let Some(lifecycle) = self.lifecycle.take() else {
            return;
        };
        tracing::warn!("setup aborted before completion, stopping runtime");
        lifecycle.should_exit.cancel();
        // The interrupted startup future is dropped before this guard, so the
        // slot is normally free. Dropping the server closes its listener.
        if let Ok(mut slot) = lifecycle.server.try_lock() {
            slot.take();
        }
        lifecycle.finish();
    }
}

impl std::fmt::Debug for RuntimeLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeLifecycle")
            .field("config", &self.config)
            .field("server", &self.factory.name())
            .field("state", &self.state.get())
            .finish_non_exhaustive()
    }
}
