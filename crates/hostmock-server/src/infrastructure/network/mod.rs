//! Network infrastructure for hostmock-server.
//!
//! # Sub-modules
//!
//! - **`listener`** – One bound TCP socket per endpoint.  Accepts peers in a
//!   background task and hands each one to its own connection worker.
//!
//! - **`connection`** – The per-socket worker: frames the byte stream with the
//!   endpoint's terminator, validates, replies, dispatches forwards, and
//!   exposes the observable per-connection state.
//!
//! - **`dispatch`** – Short-lived outbound connections that deliver the
//!   registered payloads to downstream endpoints.
//!
//! - **`hooks`** – The injected strategy invoked at the on-message and
//!   after-response points of every connection cycle.

pub mod connection;
pub mod dispatch;
pub mod hooks;
pub mod listener;

// Re-export the primary types so callers can write `network::Listener`.
pub use connection::{Connection, ConnectionStats};
pub use dispatch::{DispatchOutcome, DispatchRecord, OutboundDispatcher};
pub use hooks::{ConnectionHooks, LogHooks};
pub use listener::{Listener, ListenerError};
