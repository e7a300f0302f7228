//! HTTP protocol value types: method, version, status code.

use crate::errors::ErrorKind;

#[rustfmt::skip]
const ASCII_TABLE: [u8; 256] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F,
    0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D, 0x1E, 0x1F,
    0x20, 0x21, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x2B, 0x2C, 0x2D, 0x2E, 0x2F,
    0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3A, 0x3B, 0x3C, 0x3D, 0x3E, 0x3F,
    0x40, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o',
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
    0x60, b'a', b'b', b'c', b'd', b'e', b'f', b'g', b'h', b'i', b'j', b'k', b'l', b'm', b'n', b'o',
    b'p', b'q', b'r', b's', b't', b'u', b'v', b'w', b'x', b'y', b'z', 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
    0x80, 0x81, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x8B, 0x8C, 0x8D, 0x8E, 0x8F,
    0x90, 0x91, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0x9B, 0x9C, 0x9D, 0x9E, 0x9F,
    0xA0, 0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xAB, 0xAC, 0xAD, 0xAE, 0xAF,
    0xB0, 0xB1, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xBB, 0xBC, 0xBD, 0xBE, 0xBF,
    0xC0, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xCB, 0xCC, 0xCD, 0xCE, 0xCF,
    0xD0, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xDB, 0xDC, 0xDD, 0xDE, 0xDF,
    0xE0, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEB, 0xEC, 0xED, 0xEE, 0xEF,
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA, 0xFB, 0xFC, 0xFD, 0xFE, 0xFF,
];

#[inline(always)]
pub(crate) fn into_lower_case(src: &[u8], result: &mut [u8]) -> usize {
    let len = src.len().min(result.len());
    for i in 0..len {
        result[i] = ASCII_TABLE[src[i] as usize];
    }
    len
}

/// Method of an accepted request line. Byte-exact (case-sensitive) match
/// per spec; anything that doesn't match one of GET/HEAD/POST is `Unknown`
/// rather than an error, since only the request-line grammar itself can
/// fail to parse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Unknown,
}

impl Method {
    /// Classifies a completed method token by exact byte match. Anything
    /// else is `Unknown` — the connection driver still serves GET/HEAD
    /// requests but may reject `Unknown` at the response stage.
    pub(crate) fn classify(token: &[u8]) -> Self {
        match token {
            b"GET" => Method::Get,
            b"HEAD" => Method::Head,
            b"POST" => Method::Post,
            _ => Method::Unknown,
        }
    }
}

/// HTTP/1.x version accepted on the wire. HTTP/0.9 and anything other than
/// 1.0/1.1 is rejected at parse time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// `major`/`minor` as parsed by the request-line FSM.
    pub(crate) fn from_digits(major: u32, minor: u32) -> Result<Self, ErrorKind> {
        match (major, minor) {
            (1, 1) => Ok(Version::Http11),
            (1, 0) => Ok(Version::Http10),
            _ => Err(ErrorKind::UnsupportedVersion),
        }
    }

    pub(crate) fn as_bytes(&self) -> &'static [u8] {
        match self {
            Version::Http11 => b"HTTP/1.1",
            Version::Http10 => b"HTTP/1.0",
        }
    }

    /// `Connection: close` is the default under 1.0; keep-alive must be
    /// requested explicitly. Under 1.1 the default is keep-alive.
    pub(crate) fn default_keep_alive(&self) -> bool {
        matches!(self, Version::Http11)
    }
}

macro_rules! status_codes {
    ($($name:ident = ($num:expr, $reason:expr);)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum StatusCode { $($name,)+ }

        impl StatusCode {
            pub fn code(&self) -> u16 {
                match self { $(StatusCode::$name => $num,)+ }
            }

            pub fn reason(&self) -> &'static str {
                match self { $(StatusCode::$name => $reason,)+ }
            }
        }
    }
}

status_codes! {
    Ok = (200, "OK");
    NotModified = (304, "Not Modified");
    BadRequest = (400, "Bad Request");
    Forbidden = (403, "Forbidden");
    NotFound = (404, "Not Found");
}
