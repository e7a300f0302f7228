//! `METHOD SP+ URI SP+ "HTTP/" MAJOR "." MINOR (SP* (CR LF | LF))`
//!
//! Resumable: every byte consumed advances `cursor`, which is saved back
//! into `self` on `Eagain` so the next `step` call picks up exactly where
//! the last one left off, even if the ring wrapped or was refilled in
//! between.

use crate::errors::ErrorKind;
use crate::ring::RingBuffer;
use crate::types::Method;

use super::ParseOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Method,
    SpacesBeforeUri,
    Uri,
    SpacesAfterUri,
    H,
    Ht,
    Htt,
    Http,
    HttpSlash,
    MajorFirstDigit,
    MajorDigit,
    Dot,
    MinorFirstDigit,
    MinorDigit,
    SpacesAfterVersion,
    Cr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub uri: (usize, usize),
    pub major: u32,
    pub minor: u32,
    /// Ring offset immediately after the line terminator; the caller
    /// advances the ring's consumer cursor (`RingBuffer::consume_to`) to
    /// exactly this offset before starting the header parser.
    pub consumed: usize,
}

#[derive(Debug)]
pub struct RequestLineParser {
    state: State,
    cursor: usize,
    method_start: usize,
    method_end: usize,
    uri_start: usize,
    uri_end: usize,
    major: u32,
    minor: u32,
}

impl RequestLineParser {
    pub fn new(start: usize) -> Self {
        Self {
            state: State::Start,
            cursor: start,
            method_start: start,
            method_end: start,
            uri_start: start,
            uri_end: start,
            major: 0,
            minor: 0,
        }
    }

    /// Consumes as many bytes as are currently available in `ring`
    /// (starting from `self.cursor`, never re-reading earlier bytes) and
    /// returns `Done` once the full grammar matches, `Eagain` if the ring
    /// runs out first, or `Err` on a grammar violation.
    pub fn step(&mut self, ring: &RingBuffer) -> ParseOutcome<RequestLine> {
        while self.cursor < ring.last() {
            let b = ring.byte_at(self.cursor);
            match self.advance(b) {
                Ok(true) => {
                    self.cursor += 1;
                    return ParseOutcome::Done(RequestLine {
                        method: Method::classify(&ring.slice(self.method_start, self.method_end)),
                        uri: (self.uri_start, self.uri_end),
                        major: self.major,
                        minor: self.minor,
                        consumed: self.cursor,
                    });
                }
                Ok(false) => self.cursor += 1,
                Err(e) => return ParseOutcome::Err(e),
            }
        }
        ParseOutcome::Eagain
    }

    /// Returns `Ok(true)` when `b` completes the request line.
    fn advance(&mut self, b: u8) -> Result<bool, ErrorKind> {
        match self.state {
            State::Start => match b {
                b'\r' | b'\n' => {} // tolerate blank lines before a request
                b'A'..=b'Z' | b'_' => {
                    self.method_start = self.cursor;
                    self.state = State::Method;
                }
                _ => return Err(ErrorKind::InvalidMethod),
            },
            State::Method => match b {
                b'A'..=b'Z' | b'_' => {}
                b' ' => {
                    self.method_end = self.cursor;
                    self.state = State::SpacesBeforeUri;
                }
                _ => return Err(ErrorKind::InvalidMethod),
            },
            State::SpacesBeforeUri => match b {
                b' ' => {}
                b'/' => {
                    self.uri_start = self.cursor;
                    self.state = State::Uri;
                }
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::Uri => match b {
                b' ' => {
                    self.uri_end = self.cursor;
                    self.state = State::SpacesAfterUri;
                }
                _ => {}
            },
            State::SpacesAfterUri => match b {
                b' ' => {}
                b'H' => self.state = State::H,
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::H => match b {
                b'T' => self.state = State::Ht,
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::Ht => match b {
                b'T' => self.state = State::Htt,
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::Htt => match b {
                b'P' => self.state = State::Http,
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::Http => match b {
                b'/' => self.state = State::HttpSlash,
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::HttpSlash => match b {
                b'1'..=b'9' => {
                    self.major = (b - b'0') as u32;
                    self.state = State::MajorFirstDigit;
                }
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::MajorFirstDigit | State::MajorDigit => match b {
                b'0'..=b'9' => {
                    self.major = self.major * 10 + (b - b'0') as u32;
                    self.state = State::MajorDigit;
                }
                b'.' => self.state = State::Dot,
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::Dot => match b {
                b'0'..=b'9' => {
                    self.minor = (b - b'0') as u32;
                    self.state = State::MinorFirstDigit;
                }
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::MinorFirstDigit | State::MinorDigit => match b {
                b'0'..=b'9' => {
                    self.minor = self.minor * 10 + (b - b'0') as u32;
                    self.state = State::MinorDigit;
                }
                b' ' => self.state = State::SpacesAfterVersion,
                b'\r' => self.state = State::Cr,
                b'\n' => return Ok(true),
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::SpacesAfterVersion => match b {
                b' ' => {}
                b'\r' => self.state = State::Cr,
                b'\n' => return Ok(true),
                _ => return Err(ErrorKind::InvalidRequest),
            },
            State::Cr => match b {
                b'\n' => return Ok(true),
                _ => return Err(ErrorKind::InvalidRequest),
            },
        }
        Ok(false)
    }
}
