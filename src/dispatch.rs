//! Static header dispatch table (spec.md §4.F). A `match` over lower-cased
//! header name bytes, not a `HashMap` — headers are few per request and
//! this avoids an allocation-heavy lookup structure, the same trade-off
//! the teacher crate makes in `http/types.rs`.

use std::time::SystemTime;

use crate::list::HeaderQueue;
use crate::ring::RingBuffer;
use crate::types::into_lower_case;

#[derive(Debug, Default)]
pub struct DispatchResult {
    /// `Some(v)` if a `Connection` header was present; `None` leaves the
    /// version's default keep-alive behavior untouched.
    pub keep_alive: Option<bool>,
    /// Set when `If-Modified-Since` matched the file's mtime to the
    /// second.
    pub not_modified: bool,
}

/// Walks every parsed header exactly once and mutates a fresh
/// `DispatchResult`. After this call the caller drops the queue (`clear`)
/// — spec.md's invariant that the header list is empty at response time.
pub fn dispatch(ring: &RingBuffer, headers: &HeaderQueue, mtime: SystemTime) -> DispatchResult {
    let mut result = DispatchResult::default();

    for header in headers.iter() {
        let (ks, ke) = header.key;
        let key = ring.slice(ks, ke);

        let mut lowered = [0u8; 32];
        let n = into_lower_case(&key, &mut lowered);
        let name = &lowered[..n];

        match name {
            b"host" => {} // ignored
            b"connection" => {
                let (vs, ve) = header.value;
                let value = ring.slice(vs, ve);
                let mut lowered_value = [0u8; 16];
                let m = into_lower_case(&value, &mut lowered_value);
                result.keep_alive = Some(&lowered_value[..m] == b"keep-alive");
            }
            b"if-modified-since" => {
                let (vs, ve) = header.value;
                let value = ring.slice(vs, ve);
                if let Ok(s) = std::str::from_utf8(&value) {
                    if let Ok(since) = httpdate::parse_http_date(s.trim()) {
                        if same_second(since, mtime) {
                            result.not_modified = true;
                        }
                    }
                }
                // A parse failure here is non-fatal — treated as ignore,
                // per spec.md §4.F.
            }
            _ => {} // default: ignored
        }
    }

    result
}

fn same_second(a: SystemTime, b: SystemTime) -> bool {
    let secs = |t: SystemTime| {
        t.duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    };
    secs(a) == secs(b)
}
