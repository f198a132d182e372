//! # hostmock-core
//!
//! Shared library for HostMock containing the byte-stream framer, the
//! response registry, and expected-message pattern matching.
//!
//! This crate is used by the server crate and by test suites that want to
//! assemble messages programmatically.  It has zero dependencies on sockets,
//! the async runtime, or the file system.
//!
//! # Architecture overview
//!
//! HostMock is a configurable mock TCP server: it stands in for a real
//! host-system endpoint during integration testing.  A peer connects, sends
//! arbitrary bytes terminated by a fixed byte sequence, and receives a
//! configurable acknowledgement.  A received message can additionally trigger
//! outbound deliveries to other endpoints, emulating a multi-system workflow.
//!
//! This crate (`hostmock-core`) is the protocol foundation.  It defines:
//!
//! - **`framing`** – How a raw byte stream becomes discrete messages.  A
//!   [`MessageStream`] accumulates bytes and keeps a sliding tail window the
//!   size of the terminator; the message is complete exactly when the tail
//!   equals the terminator.
//!
//! - **`response`** – What happens after a message arrives.  The
//!   [`ResponseRegistry`] maps a received-message key to outbound
//!   [`Delivery`] targets, and [`Expectation`] validates message text against
//!   a pattern to decide between ACK and NAK.

// Rust will look for each module in a subdirectory with the same name
// (e.g., src/framing/mod.rs).
pub mod framing;
pub mod response;

// Re-export the most-used types at the crate root so callers can write
// `hostmock_core::MessageStream` instead of `hostmock_core::framing::stream::MessageStream`.
pub use framing::stream::MessageStream;
pub use framing::tail::TailWindow;
pub use framing::terminator::{Terminator, TerminatorError, DEFAULT_TERMINATOR};
pub use response::expect::{Expectation, ExpectationError, ExpectationFailure};
pub use response::registry::{Delivery, ResponseRegistry};
