//! Response registry: received-message key → outbound deliveries.
//!
//! The registry is HostMock's integration-bus simulation.  When an endpoint
//! receives a message whose key ("ping") is registered, it opens a connection
//! to every registered target and forwards the configured payload ("pong"),
//! emulating the downstream systems a real host endpoint would notify.
//!
//! # Mutation contract
//!
//! `add` is a setup-time operation.  Once connections are being served the
//! registry is shared read-only across all of them, so lookups need no
//! locking.  The server crate enforces this by freezing the registry in an
//! `Arc` before the listener starts accepting.

use std::collections::HashMap;

use tracing::{debug, trace};

/// One outbound delivery: connect to `host:port`, write `payload`, optionally
/// wait for (and discard) a one-byte acknowledgement, then close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Target hostname or IP address.
    pub host: String,
    /// Target TCP port.
    pub port: u16,
    /// Bytes written to the target.
    pub payload: Vec<u8>,
    /// Whether to read and discard one reply byte before closing.
    pub await_ack: bool,
}

impl Delivery {
    /// Creates a delivery of raw bytes with no acknowledgement wait.
    pub fn new(host: impl Into<String>, port: u16, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            host: host.into(),
            port,
            payload: payload.into(),
            await_ack: false,
        }
    }

    /// Creates a delivery of UTF-8 text with no acknowledgement wait.
    pub fn text(host: impl Into<String>, port: u16, payload: &str) -> Self {
        Self::new(host, port, payload.as_bytes().to_vec())
    }

    /// Enables waiting for a one-byte acknowledgement from the target.
    pub fn with_await_ack(mut self) -> Self {
        self.await_ack = true;
        self
    }

    /// `host:port` string for log messages.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read-only (at serving time) map from message key to deliveries.
///
/// A `HashMap<String, Vec<Delivery>>` keeps lookup O(1) per received message.
/// Multiple deliveries may be registered under the same key; they are
/// dispatched in registration order.
#[derive(Debug, Default, Clone)]
pub struct ResponseRegistry {
    entries: HashMap<String, Vec<Delivery>>,
}

impl ResponseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one more delivery for `key`, appending to any already
    /// registered under the same key.
    pub fn add(&mut self, key: impl Into<String>, delivery: Delivery) {
        let key = key.into();
        debug!(
            "registered delivery for key '{key}': {} ({} bytes)",
            delivery.target(),
            delivery.payload.len()
        );
        self.entries.entry(key).or_default().push(delivery);
    }

    /// Returns the deliveries registered for `key`, or an empty slice when
    /// the key is unknown.
    pub fn lookup(&self, key: &str) -> &[Delivery] {
        let deliveries = self.entries.get(key).map(Vec::as_slice).unwrap_or(&[]);
        trace!("lookup '{key}' matched {} deliveries", deliveries.len());
        deliveries
    }

    /// Number of distinct registered keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no deliveries are registered at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the registered keys in arbitrary order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
