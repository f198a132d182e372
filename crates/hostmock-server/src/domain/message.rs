//! The message value handed to connection hooks.

use std::borrow::Cow;
use std::net::SocketAddr;

use uuid::Uuid;

/// One completed inbound message, as observed by a connection.
///
/// `bytes` holds the full raw content including the terminator when one was
/// seen; `key` is the decoded text with the terminator stripped, the same
/// form the response registry is keyed by.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    /// Identifier of the connection that received the message.
    pub connection_id: Uuid,
    /// Address of the sending peer.
    pub peer_addr: SocketAddr,
    /// Full raw content, terminator included when present.
    pub bytes: Vec<u8>,
    /// Decoded text with the terminator stripped.
    pub key: String,
    /// `true` when the message ended with the terminator, `false` when the
    /// peer closed the stream first.
    pub terminated: bool,
}

impl ReceivedMessage {
    /// Decodes the full raw content, replacing invalid UTF-8 with U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(bytes: &[u8], key: &str, terminated: bool) -> ReceivedMessage {
        ReceivedMessage {
            connection_id: Uuid::new_v4(),
            peer_addr: "127.0.0.1:4000".parse().unwrap(),
            bytes: bytes.to_vec(),
            key: key.to_string(),
            terminated,
        }
    }

    #[test]
    fn test_text_decodes_full_content_including_terminator() {
        let msg = sample(b"ping\r\n\n", "ping", true);
        assert_eq!(msg.text(), "ping\r\n\n");
        assert_eq!(msg.key, "ping");
    }

    #[test]
    fn test_text_replaces_invalid_utf8() {
        let msg = sample(&[0x68, 0x69, 0xFF], "hi\u{FFFD}", false);
        assert_eq!(msg.text(), "hi\u{FFFD}");
        assert!(!msg.terminated);
    }
}
