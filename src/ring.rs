//! Fixed-capacity byte ring shared between socket reads and the request
//! parsers. One slot is sacrificed so `last - pos < MAX_BUF` always
//! discriminates a full ring from an empty one.

use std::fmt;

/// Request line + headers must fit in one ring. Matches the upstream
/// server this design is based on.
pub const MAX_BUF: usize = 8124;

pub struct RingBuffer {
    buf: Box<[u8; MAX_BUF]>,
    pos: usize,
    last: usize,
}

impl fmt::Debug for RingBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingBuffer")
            .field("pos", &self.pos)
            .field("last", &self.last)
            .field("len", &self.len())
            .finish()
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuffer {
    pub fn new() -> Self {
        Self {
            buf: Box::new([0u8; MAX_BUF]),
            pos: 0,
            last: 0,
        }
    }

    /// Drops all buffered bytes. Called when a connection finishes a
    /// request and starts the next one (or on handoff to a new peer).
    pub fn clear(&mut self) {
        self.pos = 0;
        self.last = 0;
    }

    pub fn len(&self) -> usize {
        self.last - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.last == self.pos
    }

    /// Start offset of the live region, monotonically increasing across
    /// the buffer's lifetime (not reduced mod `MAX_BUF`). Parsers save this
    /// as part of their resumable state.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn last(&self) -> usize {
        self.last
    }

    /// Largest contiguous span that can be written to right now: bounded
    /// both by total free space and by wraparound at the physical end of
    /// the backing array.
    pub fn writable_span(&self) -> usize {
        let free = MAX_BUF - self.len() - 1;
        let to_wrap = MAX_BUF - (self.last % MAX_BUF);
        free.min(to_wrap)
    }

    /// The contiguous writable slice backing `writable_span`.
    pub fn writable_slice(&mut self) -> &mut [u8] {
        let span = self.writable_span();
        let start = self.last % MAX_BUF;
        &mut self.buf[start..start + span]
    }

    /// Records that `n` bytes were just written into `writable_slice`.
    /// Fatal assertion on overflow: the peer has exceeded `MAX_BUF`, which
    /// this design treats as unrecoverable rather than silently truncated.
    pub fn advance_last(&mut self, n: usize) {
        self.last += n;
        assert!(
            self.last - self.pos < MAX_BUF,
            "ring buffer overflow: request line + headers exceeded MAX_BUF"
        );
    }

    /// Byte at the given monotonic offset. `off` must lie within
    /// `[pos, last)`.
    pub fn byte_at(&self, off: usize) -> u8 {
        debug_assert!(off >= self.pos && off < self.last);
        self.buf[off % MAX_BUF]
    }

    /// Copies `[start, end)` (monotonic offsets) out as an owned `Vec`.
    /// Headers and the request line are short-lived so this is fine; it
    /// avoids keeping borrowed slices alive across a ring rewrap.
    pub fn slice(&self, start: usize, end: usize) -> Vec<u8> {
        debug_assert!(start <= end);
        debug_assert!(start >= self.pos && end <= self.last);
        let mut out = Vec::with_capacity(end - start);
        for off in start..end {
            out.push(self.byte_at(off));
        }
        out
    }

    /// Advances the consumer cursor past bytes the parsers have consumed.
    pub fn consume_to(&mut self, new_pos: usize) {
        debug_assert!(new_pos >= self.pos && new_pos <= self.last);
        self.pos = new_pos;
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_ring_is_empty() {
        let r = RingBuffer::new();
        assert!(r.is_empty());
        assert_eq!(r.len(), 0);
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut r = RingBuffer::new();
        let span = r.writable_slice();
        span[..5].copy_from_slice(b"hello");
        r.advance_last(5);
        assert_eq!(r.len(), 5);
        assert_eq!(r.slice(0, 5), b"hello");
        r.consume_to(5);
        assert!(r.is_empty());
    }

    #[test]
    fn writable_span_shrinks_to_wrap_boundary() {
        let mut r = RingBuffer::new();
        r.advance_last(MAX_BUF - 10);
        r.consume_to(MAX_BUF - 10);
        // last is near the physical end; writable_span must not cross it.
        let span = r.writable_span();
        assert_eq!(span, 10);
    }

    #[test]
    #[should_panic(expected = "ring buffer overflow")]
    fn overflow_is_fatal() {
        let mut r = RingBuffer::new();
        r.advance_last(MAX_BUF - 1);
        r.advance_last(1);
    }

    #[test]
    fn invariant_holds_after_every_advance() {
        let mut r = RingBuffer::new();
        for _ in 0..20 {
            let span = r.writable_span().min(37);
            r.advance_last(span);
            assert!(r.last() - r.pos() < MAX_BUF);
            let consumed = r.pos() + span / 2;
            r.consume_to(consumed);
        }
    }
}
