//! Outbound delivery of registered response payloads.
//!
//! When a received message matches a registry key, the connection asks the
//! [`OutboundDispatcher`] to deliver each registered payload: open a fresh
//! TCP connection to the target, write the bytes, optionally wait for (and
//! discard) a one-byte acknowledgement, then close.  The write side is shut
//! down before the acknowledgement wait so a target that frames by
//! end-of-stream sees the payload immediately.
//!
//! Failures are caught, logged, and recorded.  They are never retried and
//! never allowed to abort the sibling deliveries for the same key.

use std::time::Duration;

use hostmock_core::Delivery;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

/// Upper bound on one complete delivery (connect + write + optional ack).
pub const DISPATCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Error type for a single outbound delivery attempt.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The target endpoint refused or never completed the connection.
    #[error("connect to {target} failed: {source}")]
    ConnectFailed {
        target: String,
        #[source]
        source: std::io::Error,
    },
    /// The connection opened but the payload could not be written.
    #[error("write to {target} failed: {source}")]
    WriteFailed {
        target: String,
        #[source]
        source: std::io::Error,
    },
    /// The delivery did not finish within the dispatcher's time budget.
    #[error("delivery to {target} timed out after {timeout:?}")]
    TimedOut { target: String, timeout: Duration },
}

/// Terminal result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Payload written (and acknowledgement drained, when requested).
    Delivered,
    /// The attempt failed; carries the rendered error.
    Failed(String),
}

impl DispatchOutcome {
    /// `true` for [`DispatchOutcome::Delivered`].
    pub fn is_delivered(&self) -> bool {
        matches!(self, DispatchOutcome::Delivered)
    }
}

/// One recorded delivery attempt, kept on the owning connection so tests can
/// assert what was sent where.
#[derive(Debug, Clone)]
pub struct DispatchRecord {
    /// Target hostname or IP address.
    pub host: String,
    /// Target TCP port.
    pub port: u16,
    /// The bytes that were (or would have been) written.
    pub payload: Vec<u8>,
    /// How the attempt ended.
    pub outcome: DispatchOutcome,
}

/// Opens short-lived outbound connections and records how each one went.
#[derive(Debug, Clone)]
pub struct OutboundDispatcher {
    timeout: Duration,
}

impl OutboundDispatcher {
    /// Creates a dispatcher with the default [`DISPATCH_TIMEOUT`].
    pub fn new() -> Self {
        Self {
            timeout: DISPATCH_TIMEOUT,
        }
    }

    /// Creates a dispatcher with a custom per-delivery time budget.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Delivers one payload and returns the record of the attempt.
    ///
    /// Never fails from the caller's point of view: errors are folded into
    /// [`DispatchOutcome::Failed`] and logged at warning level.
    pub async fn dispatch(&self, delivery: &Delivery) -> DispatchRecord {
        let outcome = match self.send(delivery).await {
            Ok(()) => {
                debug!(
                    "delivered {} byte(s) to {}",
                    delivery.payload.len(),
                    delivery.target()
                );
                DispatchOutcome::Delivered
            }
            Err(e) => {
                warn!("delivery to {} failed: {e}", delivery.target());
                DispatchOutcome::Failed(e.to_string())
            }
        };
        DispatchRecord {
            host: delivery.host.clone(),
            port: delivery.port,
            payload: delivery.payload.clone(),
            outcome,
        }
    }

    async fn send(&self, delivery: &Delivery) -> Result<(), DispatchError> {
        let target = delivery.target();
        let attempt = async {
            let mut stream = TcpStream::connect((delivery.host.as_str(), delivery.port))
                .await
                .map_err(|source| DispatchError::ConnectFailed {
                    target: target.clone(),
                    source,
                })?;

            stream
                .write_all(&delivery.payload)
                .await
                .map_err(|source| DispatchError::WriteFailed {
                    target: target.clone(),
                    source,
                })?;

            // FIN the write side so an end-of-stream-framed target processes
            // the payload now rather than at our close.
            let _ = stream.shutdown().await;

            if delivery.await_ack {
                let mut ack = [0u8; 1];
                // The acknowledgement is discarded; a peer that closes
                // without one is not an error.
                let _ = stream.read(&mut ack).await;
            }
            Ok(())
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::TimedOut {
                target,
                timeout: self.timeout,
            }),
        }
    }
}

impl Default for OutboundDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
