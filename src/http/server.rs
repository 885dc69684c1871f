//! Embedded HTTP/WebSocket server driven by the runtime lifecycle.
//!
//! # Responsibilities
//! - Build the application router (factory, extend hook, middleware)
//! - Run lifespan startup hooks and bind the listener
//! - Accept connections until the exit token is cancelled
//! - Serve HTTP/1.1, HTTP/2 and upgrades via hyper
//! - Drain connections and run shutdown hooks on request
//!
//! Unlike a standalone `axum::serve`, nothing here installs a signal
//! handler: the exit token is the only way to stop the accept loop.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    extract::{DefaultBodyLimit, Request},
    Extension, Router,
};
use hyper::body::Incoming;
use hyper_util::{
    rt::{TokioExecutor, TokioIo},
    server::conn::auto::Builder,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tower::Service;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};

use crate::error::RuntimeError;
use crate::http::app::{gateway_app, AppFactory, ExtendInterface};
use crate::http::lifespan::{HookError, Lifespan};
use crate::lifecycle::{EmbeddedServer, ServerFactory, ServerSettings};
use crate::net::listener::{adopt, bind, is_connection_error};
use crate::net::ConnectionTracker;

/// Pause after an accept error that is not tied to a single connection
/// (e.g. file descriptor exhaustion).
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Server state injected into handlers as an extension.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub should_exit: CancellationToken,
    pub connections: ConnectionTracker,
    pub max_message_size: usize,
}

/// Builds [`AxumServer`]s around an application router.
#[derive(Clone)]
pub struct AxumFactory {
    app: AppFactory,
    extend: Option<ExtendInterface>,
    lifespan: Lifespan,
}

impl AxumFactory {
    /// Serve the router produced by `app`.
    pub fn new<F>(app: F) -> Self
    where
        F: Fn() -> Router + Send + Sync + 'static,
    {
        Self {
            app: Arc::new(app),
            extend: None,
            lifespan: Lifespan::new(),
        }
    }

    /// Post-process the application router before it is served.
    pub fn with_extension<F>(mut self, extend: F) -> Self
    where
        F: Fn(Router) -> Router + Send + Sync + 'static,
    {
        self.extend = Some(Arc::new(extend));
        self
    }

    pub fn on_startup<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.lifespan.on_startup(hook);
        self
    }

    pub fn on_shutdown<F, Fut>(mut self, hook: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.lifespan.on_shutdown(hook);
        self
    }
}

impl Default for AxumFactory {
    fn default() -> Self {
        Self::new(gateway_app)
    }
}

impl std::fmt::Debug for AxumFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AxumFactory")
            .field("extended", &self.extend.is_some())
            .field("lifespan", &self.lifespan)
            .finish()
    }
}

impl ServerFactory for AxumFactory {
    fn name(&self) -> &'static str {
        "axum"
    }

    fn build(&self, settings: ServerSettings) -> Result<Box<dyn EmbeddedServer>, RuntimeError> {
        Ok(Box::new(AxumServer::new(self.clone(), settings)))
    }
}

/// axum application served by hyper, with an externally owned lifecycle.
pub struct AxumServer {
    factory: AxumFactory,
    settings: ServerSettings,
    router: Option<Router>,
    lifespan: Option<Lifespan>,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    connections: ConnectionTracker,
}

impl AxumServer {
    pub fn new(factory: AxumFactory, settings: ServerSettings) -> Self {
        Self {
            factory,
            settings,
            router: None,
            lifespan: None,
            listener: None,
            local_addr: None,
            connections: ConnectionTracker::new(),
        }
    }

    /// Build the served router once; later calls are no-ops.
    fn load(&mut self) {
        if self.router.is_some() {
            return;
        }

        let app = (self.factory.app)();
        let app = match &self.factory.extend {
            Some(extend) => extend(app),
            None => app,
        };

        let context = ServerContext {
            should_exit: self.settings.should_exit.clone(),
            connections: self.connections.clone(),
            max_message_size: self.settings.max_message_size,
        };
        let level = self.settings.log_level;
        let router = app
            .layer(DefaultBodyLimit::max(self.settings.max_message_size))
            .layer(Extension(context))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(level))
                    .on_response(DefaultOnResponse::new().level(level)),
            );

        self.router = Some(router);
    }

    fn spawn_connection(&self, router: Router, stream: TcpStream, peer_addr: SocketAddr) {
        let guard = self.connections.track();
        let mut drain = self.connections.drain_receiver();
        tracing::debug!(connection_id = %guard.id(), peer_addr = %peer_addr, "Connection accepted");

        tokio::spawn(async move {
            let service = hyper::service::service_fn(move |request: Request<Incoming>| {
                router.clone().call(request)
            });
            let builder = Builder::new(TokioExecutor::new());
            let conn = builder.serve_connection_with_upgrades(TokioIo::new(stream), service);
            tokio::pin!(conn);

            let mut draining = false;
            loop {
                tokio::select! {
                    result = conn.as_mut() => {
                        if let Err(err) = result {
                            tracing::debug!(connection_id = %guard.id(), error = %err, "Connection error");
                        }
                        break;
                    }
                    _ = drain.wait_for(|requested| *requested), if !draining => {
                        draining = true;
                        conn.as_mut().graceful_shutdown();
                    }
                }
            }
            drop(guard);
        });
    }
}

#[async_trait]
impl EmbeddedServer for AxumServer {
    async fn startup(
        &mut self,
        prebound: Option<std::net::TcpListener>,
    ) -> Result<(), RuntimeError> {
        if self.settings.should_exit.is_cancelled() {
            tracing::debug!("Exit requested before startup, skipping");
            return Ok(());
        }

        self.load();
        // No process signal handlers are installed; the orchestrator owns them.
        let lifespan = self.lifespan.insert(self.factory.lifespan.clone());
        if let Err(err) = lifespan.startup().await {
            self.lifespan = None;
            return Err(err);
        }

        let bound = match prebound {
            Some(listener) => adopt(listener),
            None => bind(&self.settings.host, self.settings.port).await,
        };
        let listener = match bound {
            Ok(listener) => listener,
            Err(err) => {
                if let Some(lifespan) = self.lifespan.take() {
                    lifespan.shutdown().await;
                }
                return Err(err);
            }
        };

        self.local_addr = listener.local_addr().ok();
        self.listener = Some(listener);

        if self.settings.should_exit.is_cancelled() {
            tracing::info!("Exit requested during startup");
        }
        Ok(())
    }

    async fn serve(&mut self) {
        self.load();
        let Some(router) = self.router.clone() else {
            return;
        };
        let Some(listener) = self.listener.as_ref() else {
            tracing::warn!("serve called without a bound listener");
            return;
        };
        let should_exit = self.settings.should_exit.clone();

        tracing::info!(address = ?self.local_addr, "Accepting connections");
        loop {
            let accepted = tokio::select! {
                biased;
                _ = should_exit.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer_addr)) => self.spawn_connection(router.clone(), stream, peer_addr),
                Err(err) if is_connection_error(&err) => continue,
                Err(err) => {
                    tracing::error!(error = %err, "Accept failed");
                    tokio::select! {
                        _ = should_exit.cancelled() => break,
                        _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                    }
                }
            }
        }
        tracing::info!("Serve loop observed exit request");
    }

    async fn shutdown(&mut self) -> Result<(), RuntimeError> {
        self.settings.should_exit.cancel();

        if self.listener.take().is_some() {
            tracing::debug!(address = ?self.local_addr, "Listener closed");
        }

        self.connections.begin_drain();
        let open = self.connections.active_count();
        if open > 0 {
            tracing::info!(
                open_connections = open,
                timeout = ?self.settings.drain_timeout,
                "Draining connections"
            );
        }

        let mut failures = Vec::new();
        let drained =
            tokio::time::timeout(self.settings.drain_timeout, self.connections.wait_idle()).await;
        if drained.is_err() {
            failures.push(format!(
                "{} connection(s) still open after {:?}",
                self.connections.active_count(),
                self.settings.drain_timeout
            ));
        }

        if let Some(lifespan) = self.lifespan.take() {
            failures.extend(lifespan.shutdown().await);
        }

        tracing::info!("Embedded server shut down");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RuntimeError::Shutdown(failures.join("; ")))
        }
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }
}
