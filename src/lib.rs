//! sehttpd-rs - single-threaded, event-driven HTTP/1.x static file server.
//!
//! A direct `mio` reactor serving static files off a configured web root:
//! one `Poll` loop, a `slab`-indexed connection table, and a resumable
//! byte-at-a-time parser so a request line or header block can arrive
//! split across an arbitrary number of socket reads without re-parsing
//! anything twice.
//!
//! # Protocol support
//!
//! - **HTTP/1.1**: persistent connections by default, pipelining.
//! - **HTTP/1.0**: supported, `Connection: close` by default unless the
//!   client asks for `keep-alive`.
//!
//! # Design
//!
//! - **Zero-copy body sends** — static files are `mmap`'d once per
//!   request and written directly from the mapping.
//! - **No locks, no atomics** — the reactor is single-threaded end to end.
//! - **Resumable parsing** — the request-line and header FSMs consume one
//!   byte at a time against monotonic ring-buffer offsets, so a `step`
//!   call can always be resumed later with no re-parse.

pub mod config;
pub mod connection;
pub mod dispatch;
pub mod errors;
pub mod fs;
pub mod list;
pub mod mime;
pub mod parser;
pub mod reactor;
pub mod response;
pub mod ring;
pub mod timer;
pub mod types;
