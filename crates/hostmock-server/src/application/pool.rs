//! The pool of running mock endpoints.
//!
//! Owns every [`Listener`] the process has started, keyed by bound port.
//! `shutdown()` closes them all and only returns once every accept task and
//! every connection worker has fully stopped, so a test can rely on all
//! sockets being released when it completes.

use std::collections::HashMap;
use std::sync::Arc;

use hostmock_core::ResponseRegistry;
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::EndpointOptions;
use crate::infrastructure::network::hooks::{ConnectionHooks, LogHooks};
use crate::infrastructure::network::listener::{Listener, ListenerError};

/// Owns all running endpoints; the process entry point holds one of these
/// and passes it by reference wherever endpoints are added or stopped.
#[derive(Default)]
pub struct ServerPool {
    listeners: Mutex<HashMap<u16, Arc<Listener>>>,
}

impl ServerPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts an endpoint on `port` with default behavior and no forwards.
    ///
    /// Port 0 binds an ephemeral port.  Returns the port actually bound,
    /// which is also the key for [`ServerPool::get`].
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::BindFailed`] when the port cannot be bound.
    pub async fn add(&self, port: u16) -> Result<u16, ListenerError> {
        self.add_endpoint(
            port,
            EndpointOptions::default(),
            ResponseRegistry::new(),
            Arc::new(LogHooks),
        )
        .await
    }

    /// Starts an endpoint with explicit behavior, forwards, and hooks.
    ///
    /// The registry is frozen here: once the listener is accepting there is
    /// no way to mutate it, which is what lets connections share it without
    /// locking.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::BindFailed`] when the port cannot be bound.
    pub async fn add_endpoint(
        &self,
        port: u16,
        options: EndpointOptions,
        registry: ResponseRegistry,
        hooks: Arc<dyn ConnectionHooks>,
    ) -> Result<u16, ListenerError> {
        let listener = Listener::bind(port, options, Arc::new(registry), hooks).await?;
        let bound = listener.port();
        self.listeners
            .lock()
            .await
            .insert(bound, Arc::new(listener));
        Ok(bound)
    }

    /// The listener bound to `port`, if the pool has one.
    pub async fn get(&self, port: u16) -> Option<Arc<Listener>> {
        self.listeners.lock().await.get(&port).cloned()
    }

    /// The bound ports of every running endpoint, in no particular order.
    pub async fn ports(&self) -> Vec<u16> {
        self.listeners.lock().await.keys().copied().collect()
    }

    /// Closes every endpoint and waits for all of their connections to fully
    /// terminate.  Idempotent; the pool is empty afterwards.
    pub async fn shutdown(&self) {
        // The map stays locked for the whole teardown so a concurrent
        // shutdown() waits for it instead of draining nothing and returning
        // while listeners are still stopping.
        let mut listeners = self.listeners.lock().await;
        let drained: Vec<Arc<Listener>> = listeners
            .drain()
            .map(|(_, listener)| listener)
            .collect();
        for listener in drained {
            listener.close().await;
        }
        info!("server pool stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_port_zero_returns_bound_port() {
        let pool = ServerPool::new();
        let port = pool.add(0).await.expect("add");
        assert_ne!(port, 0);
        assert!(pool.get(port).await.is_some());
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_get_unknown_port_returns_none() {
        let pool = ServerPool::new();
        assert!(pool.get(1).await.is_none());
    }

    #[tokio::test]
    async fn test_add_duplicate_port_fails() {
        let pool = ServerPool::new();
        let port = pool.add(0).await.expect("first add");
        let second = pool.add(port).await;
        assert!(matches!(second, Err(ListenerError::BindFailed { .. })));
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_empties_the_pool_and_is_idempotent() {
        let pool = ServerPool::new();
        let one = pool.add(0).await.expect("add one");
        let two = pool.add(0).await.expect("add two");
        assert_eq!(pool.ports().await.len(), 2);

        pool.shutdown().await;
        assert!(pool.ports().await.is_empty());
        assert!(pool.get(one).await.is_none());
        assert!(pool.get(two).await.is_none());

        pool.shutdown().await;
    }
}
