//! Infrastructure layer for hostmock-server.
//!
//! Contains everything that touches the outside world: TCP listeners and
//! connection workers, outbound delivery sockets, and the configuration file.
//!
//! **Dependency rule**: this layer may depend on `domain`, `application`, and
//! `hostmock_core`, but MUST NOT be imported by the `domain` layer.

pub mod network;
pub mod storage;
