//! Application layer for hostmock-server.
//!
//! The single use case here is running a set of mock endpoints: the
//! [`ServerPool`] owns every listener the process has started and is the one
//! place that can shut them all down.  There is deliberately no global
//! registry of port to server: the entry point owns a pool value and passes
//! it by reference to whoever needs to add or stop endpoints.

pub mod pool;

pub use pool::ServerPool;
