//! Response builder / static sender (spec.md §4.G). Builds the status
//! line + headers directly into the connection's outbound buffer, and
//! hands back the file's memory mapping separately so the driver can
//! interleave header and body writes across `WouldBlock`.

use std::io::Write as _;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::fs::FileInfo;
use crate::mime;
use crate::timer::TIMEOUT_DEFAULT;
use crate::types::{StatusCode, Version};

const SERVER_NAME: &str = "sehttpd-rs";
const MAX_URI_LEN: usize = 256;

/// The original sehttpd hardcodes this in every response regardless of the
/// request's version (spec.md §4.G, §6); `Version` is only consulted for
/// keep-alive defaulting, never for the status line.
const RESPONSE_VERSION: &str = "HTTP/1.1";

/// Response state populated by header dispatch, consumed once per request
/// cycle (spec.md §3, `out`).
#[derive(Debug, Clone)]
pub struct ResponseState {
    pub status: StatusCode,
    pub keep_alive: bool,
    pub modified: bool,
}

impl ResponseState {
    pub fn new(version: Version) -> Self {
        Self {
            status: StatusCode::Ok,
            keep_alive: version.default_keep_alive(),
            modified: true,
        }
    }
}

pub enum UriResolution {
    Path(PathBuf),
    TooLong,
}

/// URI → filename resolution. Query strings are stripped (not parsed —
/// parsing them is an explicit non-goal); directory URIs resolve to
/// `index.html`.
pub fn resolve_uri(web_root: &Path, uri: &[u8]) -> UriResolution {
    // Boundary per spec.md §8: 256 bytes rejected, 255 accepted.
    if uri.len() >= MAX_URI_LEN {
        return UriResolution::TooLong;
    }

    let path_part = match uri.iter().position(|&b| b == b'?') {
        Some(i) => &uri[..i],
        None => uri,
    };

    let mut rel = path_part.to_vec();
    if !rel.ends_with(b"/") {
        let seg = last_segment(&rel);
        if !seg.contains(&b'.') {
            rel.push(b'/');
        }
    }
    if rel.ends_with(b"/") {
        rel.extend_from_slice(b"index.html");
    }

    // `rel` always starts with '/' (the request-line grammar guarantees
    // the URI does); drop it so `join` doesn't treat it as absolute.
    let rel = if rel.first() == Some(&b'/') { &rel[1..] } else { &rel[..] };
    let rel_path = Path::new(std::ffi::OsStr::from_bytes(rel));
    UriResolution::Path(web_root.join(rel_path))
}

fn last_segment(path: &[u8]) -> &[u8] {
    match path.iter().rposition(|&b| b == b'/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// What the driver needs to send: a header blob, and optionally a mapped
/// file body (absent for error responses and for 304s).
pub struct Built {
    pub head: Vec<u8>,
    pub body: Option<crate::fs::MappedFile>,
}

/// Builds the success/not-modified response for a resolved static file.
/// `out.keep_alive` already reflects the request version's default plus
/// any `Connection` header override, so no `Version` is needed here.
/// `send_body` is false for `HEAD`: the headers (including
/// `Content-length`) are identical to `GET`'s, but the file is never
/// mapped, since nothing will ever read the mapping.
pub fn build_file_response(
    out: &ResponseState,
    info: &FileInfo,
    filename: &[u8],
    send_body: bool,
) -> std::io::Result<Built> {
    let mut head = Vec::with_capacity(256);
    let status = if !out.modified {
        StatusCode::NotModified
    } else {
        out.status
    };

    write!(head, "{} {} {}\r\n", RESPONSE_VERSION, status.code(), status.reason()).unwrap();

    if out.keep_alive {
        write!(
            head,
            "Connection: keep-alive\r\nKeep-Alive: timeout={}\r\n",
            TIMEOUT_DEFAULT.as_millis()
        )
        .unwrap();
    } else {
        write!(head, "Connection: close\r\n").unwrap();
    }

    let mut body = None;
    if out.modified {
        write!(head, "Content-type: {}\r\n", mime::lookup(filename)).unwrap();
        write!(head, "Content-length: {}\r\n", info.size).unwrap();
        write!(head, "Last-Modified: {}\r\n", httpdate::fmt_http_date(info.mtime)).unwrap();
        if send_body {
            body = Some(info.mmap()?);
        }
    }

    write!(head, "Server: {SERVER_NAME}\r\n\r\n").unwrap();

    Ok(Built { head, body })
}

/// Minimal error response: small HTML body, always `Connection: close`
/// (spec.md §4.G).
pub fn build_error_response(status: StatusCode) -> Vec<u8> {
    let body = format!(
        "<html><body><h1>{} {}</h1></body></html>",
        status.code(),
        status.reason()
    );
    let mut head = Vec::with_capacity(128 + body.len());
    write!(head, "{} {} {}\r\n", RESPONSE_VERSION, status.code(), status.reason()).unwrap();
    write!(head, "Connection: close\r\n").unwrap();
    write!(head, "Content-type: text/html\r\n").unwrap();
    write!(head, "Content-length: {}\r\n", body.len()).unwrap();
    write!(head, "Server: {SERVER_NAME}\r\n\r\n").unwrap();
    head.extend_from_slice(body.as_bytes());
    head
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_uri_resolves_to_index_html() {
        let root = Path::new("/srv/www");
        match resolve_uri(root, b"/") {
            UriResolution::Path(p) => assert_eq!(p, PathBuf::from("/srv/www/index.html")),
            _ => panic!(),
        }
    }

    #[test]
    fn extensionless_uri_resolves_to_directory_index() {
        let root = Path::new("/srv/www");
        match resolve_uri(root, b"/docs") {
            UriResolution::Path(p) => assert_eq!(p, PathBuf::from("/srv/www/docs/index.html")),
            _ => panic!(),
        }
    }

    #[test]
    fn file_with_extension_resolves_directly() {
        let root = Path::new("/srv/www");
        match resolve_uri(root, b"/a.css") {
            UriResolution::Path(p) => assert_eq!(p, PathBuf::from("/srv/www/a.css")),
            _ => panic!(),
        }
    }

    #[test]
    fn query_string_is_stripped_before_resolution() {
        let root = Path::new("/srv/www");
        match resolve_uri(root, b"/a.css?x=1") {
            UriResolution::Path(p) => assert_eq!(p, PathBuf::from("/srv/www/a.css")),
            _ => panic!(),
        }
    }

    #[test]
    fn uri_of_256_bytes_is_rejected() {
        let root = Path::new("/srv/www");
        let long = vec![b'a'; 256];
        assert!(matches!(resolve_uri(root, &long), UriResolution::TooLong));
    }

    #[test]
    fn uri_of_255_bytes_is_accepted() {
        let root = Path::new("/srv/www");
        let mut uri = vec![b'/'];
        uri.extend(vec![b'a'; 254]);
        assert_eq!(uri.len(), 255);
        assert!(matches!(resolve_uri(root, &uri), UriResolution::Path(_)));
    }

    #[test]
    fn error_response_always_closes_connection() {
        let bytes = build_error_response(StatusCode::NotFound);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("Connection: close"));
        assert!(text.contains("Not Found"));
    }

    #[test]
    fn response_status_line_is_always_http_1_1() {
        let bytes = build_error_response(StatusCode::NotFound);
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("HTTP/1.1 404 Not Found"), "{text}");
    }
}
