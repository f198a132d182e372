//! Sliding tail window over a byte stream.
//!
//! The framer needs to answer one question after every byte: "do the most
//! recent N bytes equal the terminator?"  Rather than re-scanning the
//! accumulated content, [`TailWindow`] keeps exactly the last N bytes in a
//! fixed-capacity FIFO.  Pushing a byte is O(1): when the window is full the
//! oldest byte is evicted first.
//!
//! Invariant: after writing L bytes through the window, its length is
//! `min(L, capacity)` and its contents are the last `min(L, capacity)` bytes
//! in write order.

use std::collections::VecDeque;

/// Fixed-capacity FIFO holding the most recently written bytes.
#[derive(Debug, Clone)]
pub struct TailWindow {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl TailWindow {
    /// Creates an empty window that retains at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes one byte, evicting the oldest byte when the window is full.
    pub fn push(&mut self, byte: u8) {
        if self.capacity == 0 {
            return;
        }
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(byte);
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` when no bytes have been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Maximum number of bytes the window retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The most recently written byte, or `None` for an empty window.
    pub fn last(&self) -> Option<u8> {
        self.buf.back().copied()
    }

    /// `true` when the window is full and its contents equal `pattern`
    /// byte-for-byte in write order.
    ///
    /// A partially filled window never matches: the comparison requires the
    /// window length to equal the pattern length, so completion cannot be
    /// reported before the full terminator has been seen.
    pub fn matches(&self, pattern: &[u8]) -> bool {
        self.buf.len() == pattern.len() && self.buf.iter().eq(pattern.iter())
    }

    /// Copies the window contents out in write order (oldest first).
    pub fn snapshot(&self) -> Vec<u8> {
        self.buf.iter().copied().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_is_empty() {
        let window = TailWindow::new(3);
        assert_eq!(window.len(), 0);
        assert!(window.is_empty());
        assert_eq!(window.last(), None);
        assert!(window.snapshot().is_empty());
    }

    #[test]
    fn test_push_below_capacity_keeps_all_bytes() {
        let mut window = TailWindow::new(3);
        window.push(b'a');
        window.push(b'b');
        assert_eq!(window.len(), 2);
        assert_eq!(window.snapshot(), b"ab");
    }

    #[test]
    fn test_push_beyond_capacity_evicts_oldest_first() {
        let mut window = TailWindow::new(3);
        for byte in b"abcde" {
            window.push(*byte);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.snapshot(), b"cde");
    }

    #[test]
    fn test_last_returns_most_recent_byte() {
        let mut window = TailWindow::new(2);
        window.push(1);
        assert_eq!(window.last(), Some(1));
        window.push(2);
        window.push(3);
        assert_eq!(window.last(), Some(3));
    }

    #[test]
    fn test_matches_requires_full_window() {
        let mut window = TailWindow::new(3);
        window.push(b'x');
        window.push(b'y');
        // Two of three bytes written: must not match a 3-byte pattern.
        assert!(!window.matches(b"xyz"));
        window.push(b'z');
        assert!(window.matches(b"xyz"));
    }

    #[test]
    fn test_matches_is_order_sensitive() {
        let mut window = TailWindow::new(3);
        for byte in b"zyx" {
            window.push(*byte);
        }
        assert!(!window.matches(b"xyz"));
        assert!(window.matches(b"zyx"));
    }

    #[test]
    fn test_matches_after_eviction_sees_only_recent_bytes() {
        let mut window = TailWindow::new(3);
        for byte in b"noise-then-xyz" {
            window.push(*byte);
        }
        assert!(window.matches(b"xyz"));
    }

    #[test]
    fn test_length_invariant_holds_for_every_stream_length() {
        // For every stream length L, len == min(L, capacity) and the window
        // holds the last min(L, capacity) bytes in write order.
        let capacity = 3;
        let stream: Vec<u8> = (0u8..16).collect();
        for l in 0..=stream.len() {
            let mut window = TailWindow::new(capacity);
            for byte in &stream[..l] {
                window.push(*byte);
            }
            let expected_len = l.min(capacity);
            assert_eq!(window.len(), expected_len, "length mismatch at L={l}");
            assert_eq!(
                window.snapshot(),
                stream[l - expected_len..l].to_vec(),
                "content mismatch at L={l}"
            );
        }
    }

    #[test]
    fn test_zero_capacity_window_stays_empty() {
        let mut window = TailWindow::new(0);
        window.push(b'a');
        assert!(window.is_empty());
        assert!(!window.matches(b"a"));
        // An empty pattern against an empty window does match; the stream
        // layer never constructs this case because terminators are non-empty.
        assert!(window.matches(b""));
    }
}
