//! Static extension → MIME type table (spec.md §6, authoritative).

pub fn lookup(filename: &[u8]) -> &'static str {
    let ext = filename
        .rsplit(|&b| b == b'.')
        .next()
        .filter(|_| filename.contains(&b'.'));

    match ext {
        Some(b"html") => "text/html",
        Some(b"xml") => "text/xml",
        Some(b"xhtml") => "application/xhtml+xml",
        Some(b"txt") => "text/plain",
        Some(b"pdf") => "application/pdf",
        Some(b"png") => "image/png",
        Some(b"gif") => "image/gif",
        Some(b"jpg") => "image/jpeg",
        Some(b"css") => "text/css",
        _ => "text/plain",
    }
}
