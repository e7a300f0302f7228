//! Per-connection state and driver (spec.md §3, §4.H).

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::rc::Rc;

use mio::net::TcpStream;
use mio::{Interest, Token};

use crate::dispatch::dispatch;
use crate::fs::MappedFile;
use crate::list::HeaderQueue;
use crate::parser::headers::HeaderParser;
use crate::parser::request_line::{RequestLine, RequestLineParser};
use crate::parser::ParseOutcome;
use crate::response::{self, ResponseState};
use crate::ring::RingBuffer;
use crate::types::{Method, Version};

pub enum Outcome {
    /// Keep the connection registered; re-arm with `interest()`.
    Continue,
    /// Peer closed, parse error, or non-keep-alive response finished —
    /// drop the connection.
    Close,
}

enum Phase {
    RequestLine(RequestLineParser),
    Headers {
        request_line: RequestLine,
        parser: HeaderParser,
        headers: HeaderQueue,
    },
    Writing {
        head: Vec<u8>,
        head_written: usize,
        body: Option<MappedFile>,
        body_written: usize,
        keep_alive: bool,
    },
}

/// One accepted socket. `timer_ref` is not stored here: the reactor's
/// `TimerWheel` is keyed by the same `Token` used for registration, so a
/// connection never needs to remember its own heap position — the
/// invariant "in the reactor xor tracked by a timer" lives entirely in
/// which of those two structures currently names this token.
pub struct Connection {
    pub stream: TcpStream,
    pub token: Token,
    ring: RingBuffer,
    phase: Phase,
    web_root: Rc<PathBuf>,
}

impl Connection {
    pub fn new(stream: TcpStream, token: Token, web_root: Rc<PathBuf>) -> Self {
        let ring = RingBuffer::new();
        let phase = Phase::RequestLine(RequestLineParser::new(ring.pos()));
        Self {
            stream,
            token,
            ring,
            phase,
            web_root,
        }
    }

    pub fn interest(&self) -> Interest {
        match self.phase {
            Phase::Writing { .. } => Interest::WRITABLE,
            _ => Interest::READABLE,
        }
    }

    /// Drains the socket to `WouldBlock`, then advances the parse/respond
    /// pipeline as far as the buffered bytes allow.
    pub fn on_readable(&mut self) -> Outcome {
        loop {
            if self.ring.writable_span() == 0 {
                // Ring is full but the request line + headers still
                // haven't terminated: spec.md's fatal case. A well-formed
                // client never gets here since MAX_BUF comfortably holds
                // a request line + headers.
                break;
            }
            let buf = self.ring.writable_slice();
            match self.stream.read(buf) {
                Ok(0) => return Outcome::Close, // peer closed
                Ok(n) => self.ring.advance_last(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return Outcome::Close,
            }
        }

        self.advance_pipeline()
    }

    pub fn on_writable(&mut self) -> Outcome {
        let Phase::Writing {
            head,
            head_written,
            body,
            body_written,
            keep_alive,
        } = &mut self.phase
        else {
            return Outcome::Continue;
        };

        while *head_written < head.len() {
            match self.stream.write(&head[*head_written..]) {
                Ok(0) => return Outcome::Close,
                Ok(n) => *head_written += n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Outcome::Continue,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return Outcome::Close,
            }
        }

        if let Some(mapped) = body {
            let bytes = mapped.as_bytes();
            while *body_written < bytes.len() {
                match self.stream.write(&bytes[*body_written..]) {
                    Ok(0) => return Outcome::Close,
                    Ok(n) => *body_written += n,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Outcome::Continue,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => return Outcome::Close,
                }
            }
        }

        let keep_alive = *keep_alive;
        if !keep_alive {
            return Outcome::Close;
        }
        self.phase = Phase::RequestLine(RequestLineParser::new(self.ring.pos()));
        self.advance_pipeline()
    }

    fn advance_pipeline(&mut self) -> Outcome {
        loop {
            match &mut self.phase {
                Phase::RequestLine(parser) => match parser.step(&self.ring) {
                    ParseOutcome::Done(request_line) => {
                        self.ring.consume_to(request_line.consumed);
                        self.phase = Phase::Headers {
                            parser: HeaderParser::new(request_line.consumed),
                            request_line,
                            headers: HeaderQueue::with_capacity(32),
                        };
                    }
                    ParseOutcome::Eagain => return Outcome::Continue,
                    ParseOutcome::Err(_) => return Outcome::Close,
                },
                Phase::Headers {
                    request_line,
                    parser,
                    headers,
                } => match parser.step(&self.ring, headers) {
                    ParseOutcome::Done(consumed) => {
                        let request_line = *request_line;
                        let version = match Version::from_digits(request_line.major, request_line.minor)
                        {
                            Ok(v) => v,
                            Err(_) => return Outcome::Close,
                        };
                        let built = build_response(
                            &self.ring,
                            &self.web_root,
                            version,
                            &request_line,
                            headers,
                        );
                        self.ring.consume_to(consumed);
                        headers.clear(); // spec invariant: empty queue at response time
                        match built {
                            Ok((built, keep_alive)) => {
                                self.phase = Phase::Writing {
                                    head: built.head,
                                    head_written: 0,
                                    body: built.body,
                                    body_written: 0,
                                    keep_alive,
                                };
                                return Outcome::Continue;
                            }
                            Err(_) => return Outcome::Close,
                        }
                    }
                    ParseOutcome::Eagain => return Outcome::Continue,
                    ParseOutcome::Err(_) => return Outcome::Close,
                },
                Phase::Writing { .. } => return Outcome::Continue,
            }
        }
    }
}

/// Resolves, stats, dispatches headers against the file's mtime, and
/// builds the wire response. A free function (rather than a `Connection`
/// method) so it only borrows the ring and web root — not all of `self`,
/// which is already holding a mutable borrow of `self.phase` at the call
/// site in `advance_pipeline`.
fn build_response(
    ring: &RingBuffer,
    web_root: &std::path::Path,
    version: Version,
    request_line: &RequestLine,
    headers: &HeaderQueue,
) -> io::Result<(response::Built, bool)> {
    use crate::types::StatusCode;

    let uri = ring.slice(request_line.uri.0, request_line.uri.1);

    let path = match response::resolve_uri(web_root, &uri) {
        response::UriResolution::TooLong => {
            let head = response::build_error_response(StatusCode::BadRequest);
            return Ok((response::Built { head, body: None }, false));
        }
        response::UriResolution::Path(p) => p,
    };

    let method_allowed = matches!(request_line.method, Method::Get | Method::Head);
    if !method_allowed {
        let head = response::build_error_response(StatusCode::BadRequest);
        return Ok((response::Built { head, body: None }, false));
    }

    match crate::fs::FileInfo::stat(&path)? {
        crate::fs::Resolved::NotFound => {
            let head = response::build_error_response(StatusCode::NotFound);
            Ok((response::Built { head, body: None }, false))
        }
        crate::fs::Resolved::Forbidden => {
            let head = response::build_error_response(StatusCode::Forbidden);
            Ok((response::Built { head, body: None }, false))
        }
        crate::fs::Resolved::File(info) => {
            // mtime is only known once the file is stat'd; dispatch needs
            // it for If-Modified-Since, so resolution and stat happen
            // before dispatch runs, not the other way around.
            let result = dispatch(ring, headers, info.mtime);
            let mut out = ResponseState::new(version);
            if let Some(ka) = result.keep_alive {
                out.keep_alive = ka;
            }
            if result.not_modified {
                out.modified = false;
            }
            let filename_bytes = uri_filename(&uri);
            let send_body = request_line.method != Method::Head;
            let built = response::build_file_response(&out, &info, &filename_bytes, send_body)?;
            let keep_alive = out.keep_alive;
            Ok((built, keep_alive))
        }
    }
}

fn uri_filename(uri: &[u8]) -> Vec<u8> {
    let path = match uri.iter().position(|&b| b == b'?') {
        Some(i) => &uri[..i],
        None => uri,
    };
    match path.iter().rposition(|&b| b == b'/') {
        Some(i) => path[i + 1..].to_vec(),
        None => path.to_vec(),
    }
}
