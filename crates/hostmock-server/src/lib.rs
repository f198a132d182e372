//! hostmock-server library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! ```text
//! domain/          Pure types: EndpointOptions, ReplyMode, ReceivedMessage
//! application/     ServerPool: owns every listener, coordinates shutdown
//! infrastructure/
//!   ├── network/   Listener, Connection worker, OutboundDispatcher, hooks
//!   └── storage/   TOML configuration loading
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;
