//! Response module: what happens after a message is received.
//!
//! # Sub-modules
//!
//! - **`registry`** – Maps a received-message key to the outbound deliveries
//!   it triggers.  Populated during test setup, read-only while serving.
//!
//! - **`expect`** – Optional validation of received message text against a
//!   regular expression.  A mismatch is recorded and decides ACK versus NAK;
//!   it never aborts the connection.

pub mod expect;
pub mod registry;

pub use expect::{Expectation, ExpectationError, ExpectationFailure};
pub use registry::{Delivery, ResponseRegistry};
