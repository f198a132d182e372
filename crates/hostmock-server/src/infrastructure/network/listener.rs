//! TCP listener for one mock endpoint.
//!
//! A [`Listener`] owns one bound socket and an accept task.  Every accepted
//! peer is handed to its own [`Connection`] worker; the accept task keeps
//! going until the listener is closed, and `close()` waits for the accept
//! task and every spawned connection to fully stop before returning.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex as StdMutex};

use hostmock_core::ResponseRegistry;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex as TokioMutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::EndpointOptions;
use crate::infrastructure::network::connection::Connection;
use crate::infrastructure::network::hooks::ConnectionHooks;

/// Error type for listener setup.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listening socket could not be bound.
    #[error("failed to bind endpoint on {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// One mock endpoint: a bound socket, its accept task, and the connections
/// it has accepted.
pub struct Listener {
    local_addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    accept_task: TokioMutex<Option<JoinHandle<()>>>,
    connections: Arc<StdMutex<Vec<Arc<Connection>>>>,
}

impl Listener {
    /// Binds `port` on all interfaces and starts accepting.
    ///
    /// Port 0 binds an ephemeral port; [`Listener::port`] reports the port
    /// actually bound either way.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::BindFailed`] when the socket cannot be bound,
    /// for example because the port is already in use.
    pub async fn bind(
        port: u16,
        options: EndpointOptions,
        registry: Arc<ResponseRegistry>,
        hooks: Arc<dyn ConnectionHooks>,
    ) -> Result<Self, ListenerError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let socket = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::BindFailed { addr, source })?;
        let local_addr = socket
            .local_addr()
            .map_err(|source| ListenerError::BindFailed { addr, source })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let connections: Arc<StdMutex<Vec<Arc<Connection>>>> = Arc::default();

        let accept_task = tokio::spawn(accept_loop(
            socket,
            options,
            registry,
            hooks,
            Arc::clone(&connections),
            shutdown_rx,
        ));
        info!("endpoint listening on {local_addr}");

        Ok(Self {
            local_addr,
            shutdown: shutdown_tx,
            accept_task: TokioMutex::new(Some(accept_task)),
            connections,
        })
    }

    /// The port actually bound.
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// The full bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Snapshot of every connection accepted so far, including closed ones.
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.connections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of connections accepted so far.
    pub fn connection_count(&self) -> usize {
        self.connections
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Stops accepting, closes every connection, and waits for all of their
    /// workers to finish.  Idempotent; the bound port is free again once this
    /// returns.
    pub async fn close(&self) {
        let _ = self.shutdown.send(true);
        // The accept slot stays locked until every worker has been joined so
        // that a concurrent close() blocks for the full teardown instead of
        // returning while connections are still stopping.
        let mut slot = self.accept_task.lock().await;
        if let Some(handle) = slot.take() {
            let _ = handle.await;
        }

        let connections = self.connections();
        for connection in connections {
            connection.close().await;
        }
        debug!("endpoint {} closed", self.local_addr);
    }
}

/// Accepts peers until shutdown is requested; each one gets its own worker.
async fn accept_loop(
    socket: TcpListener,
    options: EndpointOptions,
    registry: Arc<ResponseRegistry>,
    hooks: Arc<dyn ConnectionHooks>,
    connections: Arc<StdMutex<Vec<Arc<Connection>>>>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            accepted = socket.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    let connection = Connection::spawn(
                        stream,
                        peer_addr,
                        options.clone(),
                        Arc::clone(&registry),
                        Arc::clone(&hooks),
                    );
                    connections
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .push(connection);
                }
                Err(e) => warn!("accept failed: {e}"),
            }
        }
    }
    debug!("accept loop stopped");
}

// ── Tests ─────────────────────────────────────────────────────────────────────
