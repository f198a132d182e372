//! Framing module: terminator-delimited message assembly.

pub mod stream;
pub mod tail;
pub mod terminator;

pub use stream::MessageStream;
pub use tail::TailWindow;
pub use terminator::{Terminator, TerminatorError, DEFAULT_TERMINATOR};
