//! Sequence of `KEY (SP*) ":" (SP*) VALUE (CR? LF)` lines terminated by a
//! blank line. Resumable on the same terms as the request-line parser.

use crate::errors::ErrorKind;
use crate::list::HeaderQueue;
use crate::ring::RingBuffer;

use super::ParseOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Key,
    SpacesBeforeColon,
    SpacesAfterColon,
    Value,
    Cr,
    Crlf,
    CrlfCr,
}

pub struct HeaderParser {
    state: State,
    cursor: usize,
    key_start: usize,
    key_end: usize,
    value_start: usize,
    value_end: usize,
}

impl HeaderParser {
    pub fn new(start: usize) -> Self {
        Self {
            state: State::Start,
            cursor: start,
            key_start: start,
            key_end: start,
            value_start: start,
            value_end: start,
        }
    }

    /// Drains headers into `queue` as they complete. Returns the ring
    /// offset immediately after the blank line terminating the header
    /// block once that's seen.
    pub fn step(&mut self, ring: &RingBuffer, queue: &mut HeaderQueue) -> ParseOutcome<usize> {
        while self.cursor < ring.last() {
            let b = ring.byte_at(self.cursor);
            match self.advance(b, queue) {
                Ok(true) => {
                    self.cursor += 1;
                    return ParseOutcome::Done(self.cursor);
                }
                Ok(false) => self.cursor += 1,
                Err(e) => return ParseOutcome::Err(e),
            }
        }
        ParseOutcome::Eagain
    }

    fn advance(&mut self, b: u8, queue: &mut HeaderQueue) -> Result<bool, ErrorKind> {
        match self.state {
            State::Start => match b {
                b'\r' => self.state = State::CrlfCr,
                b'\n' => return Ok(true),
                _ => {
                    self.key_start = self.cursor;
                    self.state = State::Key;
                }
            },
            State::Key => match b {
                b' ' => {
                    self.key_end = self.cursor;
                    self.state = State::SpacesBeforeColon;
                }
                b':' => {
                    self.key_end = self.cursor;
                    self.state = State::SpacesAfterColon;
                }
                _ => {}
            },
            State::SpacesBeforeColon => match b {
                b' ' => {}
                b':' => self.state = State::SpacesAfterColon,
                _ => return Err(ErrorKind::InvalidHeader),
            },
            State::SpacesAfterColon => match b {
                b' ' => {}
                b'\r' => {
                    self.value_start = self.cursor;
                    self.value_end = self.cursor;
                    self.state = State::Cr;
                }
                b'\n' => {
                    self.value_start = self.cursor;
                    self.value_end = self.cursor;
                    queue.push_back((self.key_start, self.key_end), (self.value_start, self.value_end));
                    self.state = State::Crlf;
                }
                _ => {
                    self.value_start = self.cursor;
                    self.state = State::Value;
                }
            },
            State::Value => match b {
                b'\r' => {
                    self.value_end = self.cursor;
                    self.state = State::Cr;
                }
                b'\n' => {
                    self.value_end = self.cursor;
                    queue.push_back((self.key_start, self.key_end), (self.value_start, self.value_end));
                    self.state = State::Crlf;
                }
                _ => {}
            },
            State::Cr => match b {
                b'\n' => {
                    queue.push_back((self.key_start, self.key_end), (self.value_start, self.value_end));
                    self.state = State::Crlf;
                }
                _ => return Err(ErrorKind::InvalidHeader),
            },
            State::Crlf => match b {
                b'\r' => self.state = State::CrlfCr,
                b'\n' => return Ok(true),
                _ => {
                    self.key_start = self.cursor;
                    self.state = State::Key;
                }
            },
            State::CrlfCr => match b {
                b'\n' => return Ok(true),
                _ => return Err(ErrorKind::InvalidHeader),
            },
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(bytes: &[u8]) -> (ParseOutcome<usize>, HeaderQueue) {
        let mut ring = RingBuffer::new();
        let span = ring.writable_slice();
        span[..bytes.len()].copy_from_slice(bytes);
        ring.advance_last(bytes.len());
        let mut queue = HeaderQueue::with_capacity(8);
        let mut p = HeaderParser::new(ring.pos());
        let outcome = p.step(&ring, &mut queue);
        (outcome, queue)
    }

    #[test]
    fn parses_two_headers_then_blank_line() {
        let (outcome, queue) = parse_all(b"Host: example.com\r\nConnection: keep-alive\r\n\r\n");
        assert!(matches!(outcome, ParseOutcome::Done(_)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn bare_lf_terminates_header_line_and_block() {
        let (outcome, queue) = parse_all(b"Host: x\nConnection: close\n\n");
        assert!(matches!(outcome, ParseOutcome::Done(_)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn space_before_colon_tolerated() {
        let (outcome, queue) = parse_all(b"Host : x\r\n\r\n");
        assert!(matches!(outcome, ParseOutcome::Done(_)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn garbage_before_colon_errors() {
        let (outcome, _) = parse_all(b"Host@ x\r\n\r\n");
        assert_eq!(outcome, ParseOutcome::Err(ErrorKind::InvalidHeader));
    }

    #[test]
    fn incomplete_headers_is_eagain() {
        let (outcome, _) = parse_all(b"Host: exam");
        assert_eq!(outcome, ParseOutcome::Eagain);
    }

    #[test]
    fn no_headers_just_blank_line() {
        let (outcome, queue) = parse_all(b"\r\n");
        assert!(matches!(outcome, ParseOutcome::Done(_)));
        assert!(queue.is_empty());
    }

    #[test]
    fn resumable_across_arbitrary_split() {
        let full = b"Host: x\r\nConnection: keep-alive\r\n\r\n";
        for split in 0..full.len() {
            let mut ring = RingBuffer::new();
            let mut queue = HeaderQueue::with_capacity(8);
            let mut p = HeaderParser::new(ring.pos());

            let span = ring.writable_slice();
            span[..split].copy_from_slice(&full[..split]);
            ring.advance_last(split);
            let first = p.step(&ring, &mut queue);
            if split < full.len() {
                assert_eq!(first, ParseOutcome::Eagain, "split={split}");
            }

            let span = ring.writable_slice();
            let rest = full.len() - split;
            span[..rest].copy_from_slice(&full[split..]);
            ring.advance_last(rest);
            let second = p.step(&ring, &mut queue);

            assert!(matches!(second, ParseOutcome::Done(_)), "split={split}");
            assert_eq!(queue.len(), 2, "split={split}");
        }
    }
}
