//! Crate-wide error taxonomy, narrowed to the classes spec.md §7 names.
//! Parse errors and peer-originated errors close the connection without a
//! response body (the conservative behavior spec.md calls for); only
//! application-level errors (404/403) produce a formal `Response`.

use std::{error, fmt, io};

#[derive(Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidMethod,
    InvalidRequest,
    UnsupportedVersion,
    InvalidHeader,
    PeerClosed,
    Io(IoErrorKind),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl error::Error for ErrorKind {}

impl From<io::Error> for ErrorKind {
    fn from(err: io::Error) -> Self {
        ErrorKind::Io(IoErrorKind(err.kind()))
    }
}

/// Only the `io::ErrorKind` is retained (not the full `io::Error`), since
/// `ErrorKind` needs to stay `PartialEq` for the parser tests and
/// `io::Error` doesn't implement it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoErrorKind(pub io::ErrorKind);
