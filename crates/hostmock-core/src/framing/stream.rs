//! Message accumulation and completion detection.
//!
//! A [`MessageStream`] receives one inbound message worth of bytes.  Every
//! byte is appended to the growing content and simultaneously pushed through
//! a [`TailWindow`] sized to the terminator, so completion detection costs
//! O(1) per byte regardless of message length.
//!
//! A zero-length stream (a peer that connects and disconnects without sending
//! anything) is a valid state, not an error: it reports length 0, an empty
//! tail, no last byte, and is never complete.

use std::borrow::Cow;
use std::io::Cursor;

use crate::framing::tail::TailWindow;
use crate::framing::terminator::Terminator;

/// One inbound message being assembled byte-by-byte.
#[derive(Debug, Clone)]
pub struct MessageStream {
    content: Vec<u8>,
    tail: TailWindow,
    terminator: Terminator,
}

impl MessageStream {
    /// Creates an empty stream that completes on `terminator`.
    pub fn new(terminator: Terminator) -> Self {
        let tail = TailWindow::new(terminator.len());
        Self {
            content: Vec::new(),
            tail,
            terminator,
        }
    }

    /// Appends one byte to the content and advances the tail window.
    pub fn write(&mut self, byte: u8) {
        self.content.push(byte);
        self.tail.push(byte);
    }

    /// Appends every byte of `bytes` in order.
    ///
    /// Equivalent to calling [`write`](Self::write) per byte; completion
    /// state afterwards reflects the final tail only.
    pub fn write_all(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.write(*byte);
        }
    }

    /// Total number of bytes written so far, terminator included once it
    /// arrives.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// `true` when nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The most recently written byte, or `None` for an empty stream.
    pub fn last_byte(&self) -> Option<u8> {
        self.tail.last()
    }

    /// The last `min(len, terminator_len)` bytes in write order.
    pub fn tail(&self) -> Vec<u8> {
        self.tail.snapshot()
    }

    /// `true` exactly when the tail equals the terminator.
    ///
    /// Never `true` before the full terminator has been written: the tail of
    /// a shorter stream is shorter than the terminator and cannot match.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hostmock_core::MessageStream;
    ///
    /// let mut stream = MessageStream::default();
    /// stream.write_all(b"<root/>\r\n");
    /// assert!(!stream.is_complete());
    /// stream.write(b'\n');
    /// assert!(stream.is_complete());
    /// ```
    pub fn is_complete(&self) -> bool {
        self.tail.matches(self.terminator.as_bytes())
    }

    /// Decodes the full content as UTF-8, replacing invalid sequences.
    ///
    /// Non-destructive and repeatable: the content is not consumed and
    /// successive calls return the same text.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// The registry lookup key: the decoded text with the terminator bytes
    /// stripped from the end.  An unterminated stream (end-of-stream before
    /// the terminator) keys on its full text.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hostmock_core::MessageStream;
    ///
    /// let mut stream = MessageStream::default();
    /// stream.write_all(b"ping\r\n\n");
    /// assert_eq!(stream.key(), "ping");
    /// ```
    pub fn key(&self) -> String {
        let body = self
            .content
            .strip_suffix(self.terminator.as_bytes())
            .unwrap_or(&self.content);
        String::from_utf8_lossy(body).into_owned()
    }

    /// Copies the content out as an independent byte vector.
    pub fn to_vec(&self) -> Vec<u8> {
        self.content.clone()
    }

    /// Returns an independent in-memory reader over a copy of the content.
    ///
    /// Consuming the reader does not mutate the stream; each call yields a
    /// fresh copy.
    pub fn reader(&self) -> Cursor<Vec<u8>> {
        Cursor::new(self.content.clone())
    }

    /// The terminator this stream completes on.
    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }
}

impl Default for MessageStream {
    /// An empty stream using the CR LF LF default terminator.
    fn default() -> Self {
        Self::new(Terminator::default())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_fresh_stream_reports_zero_length_state() {
        let stream = MessageStream::default();
        assert_eq!(stream.len(), 0);
        assert!(stream.is_empty());
        assert!(stream.tail().is_empty());
        assert_eq!(stream.last_byte(), None);
        assert!(!stream.is_complete());
        assert_eq!(stream.text(), "");
        assert_eq!(stream.key(), "");
    }

    #[test]
    fn test_tail_length_invariant_for_every_stream_length() {
        let payload = b"abcdefghij";
        let term_len = Terminator::default().len();
        for l in 0..=payload.len() {
            let mut stream = MessageStream::default();
            stream.write_all(&payload[..l]);
            assert_eq!(stream.len(), l);
            assert_eq!(stream.tail().len(), l.min(term_len), "at L={l}");
            assert_eq!(stream.tail(), payload[l - l.min(term_len)..l].to_vec());
        }
    }

    #[test]
    fn test_completion_detected_exactly_at_terminator_boundary() {
        let payload = b"<root/>\r\n\n";
        let mut stream = MessageStream::default();
        for (i, byte) in payload.iter().enumerate() {
            stream.write(*byte);
            let expected = i == payload.len() - 1;
            assert_eq!(
                stream.is_complete(),
                expected,
                "completion state wrong after byte {i}"
            );
        }
    }

    #[test]
    fn test_partial_terminator_does_not_complete() {
        let mut stream = MessageStream::default();
        stream.write_all(b"data\r\n");
        assert!(!stream.is_complete());
    }

    #[test]
    fn test_terminator_prefix_inside_content_does_not_complete() {
        // CR LF appears mid-message (a plain CRLF line break); only the full
        // CR LF LF sequence completes the message.
        let mut stream = MessageStream::default();
        stream.write_all(b"line one\r\nline two\r\n\n");
        assert!(stream.is_complete());
        assert_eq!(stream.key(), "line one\r\nline two");
    }

    #[test]
    fn test_custom_terminator_xyz() {
        let mut stream = MessageStream::new(Terminator::from_text("xyz").unwrap());
        stream.write_all(b"hello");
        assert!(!stream.is_complete());
        stream.write_all(b"xyz");
        assert!(stream.is_complete());
        assert_eq!(stream.key(), "hello");
    }

    #[test]
    fn test_single_byte_terminator() {
        let mut stream = MessageStream::new(Terminator::new(vec![b'\n']).unwrap());
        stream.write_all(b"ok\n");
        assert!(stream.is_complete());
        assert_eq!(stream.key(), "ok");
    }

    #[test]
    fn test_text_is_idempotent_and_non_destructive() {
        let mut stream = MessageStream::default();
        stream.write_all(b"repeatable");
        let first = stream.text().into_owned();
        let second = stream.text().into_owned();
        assert_eq!(first, "repeatable");
        assert_eq!(first, second);
        assert_eq!(stream.len(), 10);
    }

    #[test]
    fn test_to_vec_returns_independent_copies() {
        let mut stream = MessageStream::default();
        stream.write_all(b"copy");
        let mut copy = stream.to_vec();
        copy.push(b'!');
        assert_eq!(stream.to_vec(), b"copy");
    }

    #[test]
    fn test_reader_yields_fresh_copy_each_call() {
        let mut stream = MessageStream::default();
        stream.write_all(b"stream me");

        let mut first = Vec::new();
        stream.reader().read_to_end(&mut first).unwrap();
        assert_eq!(first, b"stream me");

        // Draining one reader must not affect the stream or later readers.
        let mut second = Vec::new();
        stream.reader().read_to_end(&mut second).unwrap();
        assert_eq!(second, b"stream me");
        assert_eq!(stream.len(), 9);
    }

    #[test]
    fn test_text_replaces_invalid_utf8() {
        let mut stream = MessageStream::default();
        stream.write_all(&[0x68, 0x69, 0xFF]);
        assert_eq!(stream.text(), "hi\u{FFFD}");
    }

    #[test]
    fn test_key_on_unterminated_stream_is_full_text() {
        let mut stream = MessageStream::default();
        stream.write_all(b"pong");
        assert!(!stream.is_complete());
        assert_eq!(stream.key(), "pong");
    }

    #[test]
    fn test_key_strips_only_a_trailing_terminator() {
        // The terminator bytes appearing mid-content are part of the key.
        let mut stream = MessageStream::new(Terminator::from_text("xyz").unwrap());
        stream.write_all(b"axyzbxyz");
        assert!(stream.is_complete());
        assert_eq!(stream.key(), "axyzb");
    }

    #[test]
    fn test_write_all_equals_byte_at_a_time_writes() {
        let payload = b"equivalence check\r\n\n";
        let mut bulk = MessageStream::default();
        bulk.write_all(payload);

        let mut single = MessageStream::default();
        for byte in payload {
            single.write(*byte);
        }

        assert_eq!(bulk.to_vec(), single.to_vec());
        assert_eq!(bulk.tail(), single.tail());
        assert_eq!(bulk.is_complete(), single.is_complete());
    }
}
