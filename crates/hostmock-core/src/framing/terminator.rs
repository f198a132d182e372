//! Message terminator: the fixed byte sequence that marks the logical end of
//! an inbound message.
//!
//! The wire format carries no length prefix and no envelope: a message is
//! simply "every byte up to and including the terminator".  The default
//! terminator is CR LF LF (`0x0D 0x0A 0x0A`), matching what the real
//! host-system endpoint sends; every server instance can override it.

use std::fmt;

use thiserror::Error;

/// Default message terminator: CR LF LF.
pub const DEFAULT_TERMINATOR: [u8; 3] = [0x0D, 0x0A, 0x0A];

/// Errors raised when constructing a [`Terminator`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerminatorError {
    /// A terminator must contain at least one byte.
    #[error("terminator must contain at least one byte")]
    Empty,
}

/// An immutable, ordered, non-empty byte sequence that ends a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminator(Vec<u8>);

impl Terminator {
    /// Creates a terminator from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`TerminatorError::Empty`] if `bytes` is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hostmock_core::Terminator;
    ///
    /// let term = Terminator::new(vec![0x0D, 0x0A, 0x0A]).unwrap();
    /// assert_eq!(term.len(), 3);
    /// ```
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, TerminatorError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(TerminatorError::Empty);
        }
        Ok(Self(bytes))
    }

    /// Creates a terminator from the UTF-8 bytes of `text`.
    ///
    /// Convenient for test scenarios that use a printable terminator such as
    /// `"xyz"`.
    ///
    /// # Errors
    ///
    /// Returns [`TerminatorError::Empty`] if `text` is empty.
    pub fn from_text(text: &str) -> Result<Self, TerminatorError> {
        Self::new(text.as_bytes().to_vec())
    }

    /// Number of bytes in the terminator.  Always at least 1.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The terminator bytes in order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for Terminator {
    /// The CR LF LF default used by the real endpoint.
    fn default() -> Self {
        Self(DEFAULT_TERMINATOR.to_vec())
    }
}

impl fmt::Display for Terminator {
    /// Renders the bytes with ASCII escapes (`\r\n\n`, `xyz`) for log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.escape_ascii())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
