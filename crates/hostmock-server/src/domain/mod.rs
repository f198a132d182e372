//! Domain layer for hostmock-server.
//!
//! Pure behavior types with no I/O and no async: everything here can be
//! constructed and inspected in a plain unit test.  The infrastructure layer
//! turns these values into running sockets.

pub mod endpoint;
pub mod message;

// Re-export the common types at the domain boundary so callers can write
// `domain::EndpointOptions` instead of the longer path.
pub use endpoint::{EndpointOptions, ReplyMode, DEFAULT_ACK, DEFAULT_NAK, DEFAULT_READ_TIMEOUT};
pub use message::ReceivedMessage;
