//! Application lifespan hooks.
//!
//! Startup hooks run in registration order before the socket is bound; the
//! first failure aborts startup. Shutdown hooks run after connections have
//! drained; every hook runs and failures are collected.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;

use crate::error::RuntimeError;

/// Error type returned by lifespan hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

type Hook = Arc<dyn Fn() -> BoxFuture<'static, Result<(), HookError>> + Send + Sync>;

/// Ordered startup and shutdown hooks for one server instance.
#[derive(Clone, Default)]
pub struct Lifespan {
    startup: Vec<Hook>,
    shutdown: Vec<Hook>,
}

impl Lifespan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_startup<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.startup.push(Arc::new(move || hook().boxed()));
    }

    pub fn on_shutdown<F, Fut>(&mut self, hook: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HookError>> + Send + 'static,
    {
        self.shutdown.push(Arc::new(move || hook().boxed()));
    }

    /// Run startup hooks, stopping at the first failure.
    pub async fn startup(&self) -> Result<(), RuntimeError> {
        for (index, hook) in self.startup.iter().enumerate() {
            hook()
                .await
                .map_err(|err| RuntimeError::Startup(format!("startup hook {}: {}", index, err)))?;
        }
        if !self.startup.is_empty() {
            tracing::debug!(hooks = self.startup.len(), "Startup hooks complete");
        }
        Ok(())
    }

    /// Run every shutdown hook. Returns the failures, if any.
    pub async fn shutdown(&self) -> Vec<String> {
        let mut failures = Vec::new();
        for (index, hook) in self.shutdown.iter().enumerate() {
            if let Err(err) = hook().await {
                tracing::warn!(hook = index, error = %err, "Shutdown hook failed");
                failures.push(format!("shutdown hook {}: {}", index, err));
            }
        }
        failures
    }
}

impl std::fmt::Debug for Lifespan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifespan")
            .field("startup_hooks", &self.startup.len())
            .field("shutdown_hooks", &self.shutdown.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test]
    async fn startup_stops_at_first_failure() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut lifespan = Lifespan::new();
        for name in ["first", "second", "third"] {
            let calls = calls.clone();
            lifespan.on_startup(move || {
                let calls = calls.clone();
                async move {
                    calls.lock().unwrap().push(name);
                    if name == "second" {
                        return Err::<(), HookError>("boom".into());
                    }
                    Ok(())
                }
            });
        }

        let err = lifespan.startup().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Startup(ref msg) if msg.contains("boom")));
        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn shutdown_runs_every_hook() {
        let mut lifespan = Lifespan::new();
        lifespan.on_shutdown(|| async { Err::<(), HookError>("disk full".into()) });
        lifespan.on_shutdown(|| async { Ok::<(), HookError>(()) });
        lifespan.on_shutdown(|| async { Err::<(), HookError>("socket gone".into()) });

        let failures = lifespan.shutdown().await;
        assert_eq!(failures.len(), 2);
        assert!(failures[1].contains("socket gone"));
    }
}
