//! Connection hook points.
//!
//! A [`ConnectionHooks`] value is injected into every connection at accept
//! time and invoked at two fixed points of the message cycle: right after a
//! message completes (`on_message`) and right after the reply, if any, has
//! been written (`after_response`).  Supplying a custom implementation is how
//! a test observes traffic or scripts extra behavior without touching the
//! connection engine itself.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::ReceivedMessage;

/// Strategy invoked by every connection at the two hook points of its cycle.
///
/// Implementations must be cheap or internally bounded: the connection awaits
/// each hook inline, so a slow hook delays the reply.
#[async_trait]
pub trait ConnectionHooks: Send + Sync {
    /// Called once per completed inbound message, before the reply is chosen.
    async fn on_message(&self, message: &ReceivedMessage);

    /// Called after the reply has been written.  `reply` carries the bytes
    /// actually sent, or `None` when the endpoint is in no-response mode.
    async fn after_response(&self, message: &ReceivedMessage, reply: Option<&[u8]>);
}

/// Default hooks: log the message and the reply, nothing else.
#[derive(Debug, Default)]
pub struct LogHooks;

#[async_trait]
impl ConnectionHooks for LogHooks {
    async fn on_message(&self, message: &ReceivedMessage) {
        info!(
            "connection {}: received {} byte(s) from {}: {:?}",
            message.connection_id,
            message.bytes.len(),
            message.peer_addr,
            message.key,
        );
    }

    async fn after_response(&self, message: &ReceivedMessage, reply: Option<&[u8]>) {
        match reply {
            Some(bytes) => debug!(
                "connection {}: replied with {} byte(s)",
                message.connection_id,
                bytes.len()
            ),
            None => debug!("connection {}: no reply configured", message.connection_id),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
