//! Per-endpoint behavior settings.
//!
//! [`EndpointOptions`] is the single source of truth for how one listening
//! port frames, validates, and answers messages.  It is built once, from the
//! configuration file or directly in a test, and then cloned into every
//! connection the endpoint accepts.

use std::time::Duration;

use hostmock_core::{Expectation, Terminator};

/// Default positive acknowledgement: ASCII `A`.
pub const DEFAULT_ACK: [u8; 1] = [0x41];

/// Default negative acknowledgement: ASCII `N`.
pub const DEFAULT_NAK: [u8; 1] = [0x4E];

/// Default per-read timeout before an idle peer is logged.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// How an endpoint answers a completed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// ACK when the message passes validation, NAK when it does not.
    #[default]
    Ack,
    /// NAK every message regardless of validation, to exercise a client's
    /// rejection path.
    AlwaysNak,
    /// Write no reply bytes at all.
    None,
}

/// All behavior settings for one mock endpoint.
///
/// Defaults mirror the real host-system endpoint: CR LF LF terminator,
/// one-byte `A`/`N` acknowledgements, accept anything, keep the connection
/// open between messages.
///
/// # Example
///
/// ```rust
/// use hostmock_server::domain::{EndpointOptions, ReplyMode};
///
/// let opts = EndpointOptions::default().with_reply_mode(ReplyMode::AlwaysNak);
/// assert_eq!(opts.ack, vec![0x41]);
/// assert_eq!(opts.reply_mode, ReplyMode::AlwaysNak);
/// ```
#[derive(Debug, Clone)]
pub struct EndpointOptions {
    /// Byte sequence that marks the end of an inbound message.
    pub terminator: Terminator,
    /// Bytes written back for a positive acknowledgement.
    pub ack: Vec<u8>,
    /// Bytes written back for a negative acknowledgement.
    pub nak: Vec<u8>,
    /// Reply selection policy.
    pub reply_mode: ReplyMode,
    /// Optional pattern every received message must match; a mismatch turns
    /// the reply into a NAK and is recorded on the connection.
    pub expectation: Option<Expectation>,
    /// Close the connection after the first reply instead of waiting for
    /// further messages.
    pub close_after_reply: bool,
    /// How long one read may sit idle before it is logged; reading resumes
    /// afterwards unless the peer is gone.
    pub read_timeout: Duration,
}

impl EndpointOptions {
    /// Replaces the message terminator.
    pub fn with_terminator(mut self, terminator: Terminator) -> Self {
        self.terminator = terminator;
        self
    }

    /// Replaces the positive acknowledgement bytes.
    pub fn with_ack(mut self, ack: impl Into<Vec<u8>>) -> Self {
        self.ack = ack.into();
        self
    }

    /// Replaces the negative acknowledgement bytes.
    pub fn with_nak(mut self, nak: impl Into<Vec<u8>>) -> Self {
        self.nak = nak.into();
        self
    }

    /// Sets the reply selection policy.
    pub fn with_reply_mode(mut self, mode: ReplyMode) -> Self {
        self.reply_mode = mode;
        self
    }

    /// Installs an expected-message pattern.
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectation = Some(expectation);
        self
    }

    /// Sets whether the connection closes after its first reply.
    pub fn with_close_after_reply(mut self, close: bool) -> Self {
        self.close_after_reply = close;
        self
    }

    /// Sets the idle-read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

impl Default for EndpointOptions {
    fn default() -> Self {
        Self {
            terminator: Terminator::default(),
            ack: DEFAULT_ACK.to_vec(),
            nak: DEFAULT_NAK.to_vec(),
            reply_mode: ReplyMode::default(),
            expectation: None,
            close_after_reply: false,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
