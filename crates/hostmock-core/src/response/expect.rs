//! Expected-message validation.
//!
//! An endpoint can be configured with a regular expression that every
//! received message is checked against.  A mismatch never aborts the
//! connection or stops processing; it produces an [`ExpectationFailure`]
//! that the connection records and consults when choosing between ACK and
//! NAK.
//!
//! Matching uses regex *search* semantics: the pattern matches if it is
//! found anywhere in the message text.  Anchor with `^` and `$` for an
//! exact-match expectation.

use regex::Regex;
use thiserror::Error;

/// Errors raised when compiling an expectation pattern.
#[derive(Debug, Error)]
pub enum ExpectationError {
    /// The pattern is not a valid regular expression.
    #[error("invalid expected-message pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A recorded mismatch between a received message and the expected pattern.
///
/// At most one failure is outstanding per connection; it is reset before each
/// message and surfaced through the connection's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("received message '{received}' does not match expected pattern '{expected}'")]
pub struct ExpectationFailure {
    /// The configured pattern source text.
    pub expected: String,
    /// The offending message text (terminator stripped).
    pub received: String,
}

/// A compiled expected-message pattern.
#[derive(Debug, Clone)]
pub struct Expectation {
    pattern: Regex,
}

impl Expectation {
    /// Compiles `pattern` into an expectation.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectationError::InvalidPattern`] when `pattern` is not a
    /// valid regular expression.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hostmock_core::Expectation;
    ///
    /// let expect = Expectation::new("^<root/>$").unwrap();
    /// assert!(expect.check("<root/>").is_ok());
    /// assert!(expect.check("<other/>").is_err());
    /// ```
    pub fn new(pattern: &str) -> Result<Self, ExpectationError> {
        let compiled = Regex::new(pattern).map_err(|source| ExpectationError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { pattern: compiled })
    }

    /// The pattern source text, for logs and failure records.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Checks `message` against the pattern.
    ///
    /// # Errors
    ///
    /// Returns an [`ExpectationFailure`] carrying both the pattern and the
    /// offending message when the pattern is not found in `message`.
    pub fn check(&self, message: &str) -> Result<(), ExpectationFailure> {
        if self.pattern.is_match(message) {
            Ok(())
        } else {
            Err(ExpectationFailure {
                expected: self.pattern.as_str().to_string(),
                received: message.to_string(),
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
