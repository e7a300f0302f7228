//! End-to-end scenarios from the design notes, driven over a real
//! loopback `TcpStream` against a server running on a background OS
//! thread. The reactor itself stays single-threaded; the thread only
//! gives the test harness something to block on while it drives sockets.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::Duration;

use sehttpd_rs::reactor::Reactor;

/// Spawns a reactor bound to an OS-assigned loopback port and returns its
/// address. The reactor thread is intentionally leaked (never joined) —
/// `Reactor::run` never returns, matching how the real binary runs.
fn spawn_server(web_root: std::path::PathBuf) -> SocketAddr {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let mut reactor = Reactor::bind(addr, web_root).expect("bind");
    let bound = reactor.local_addr().expect("local_addr");
    thread::spawn(move || reactor.run());
    // Give the background thread a chance to reach its first `poll` call.
    thread::sleep(Duration::from_millis(20));
    bound
}

fn write_file(dir: &std::path::Path, name: &str, contents: &[u8]) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn read_response(stream: &mut TcpStream, deadline: Duration) -> Vec<u8> {
    stream.set_read_timeout(Some(deadline)).unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                out.extend_from_slice(&buf[..n]);
                // A response without a body we expect ends right after
                // the blank line; anything with Content-length we read
                // until it's satisfied below instead of looping forever.
                if out.windows(4).any(|w| w == b"\r\n\r\n") {
                    if let Some(len) = content_length(&out) {
                        let header_end = find_header_end(&out).unwrap();
                        if out.len() >= header_end + len {
                            break;
                        }
                    } else {
                        break;
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
            Err(e) => panic!("read error: {e}"),
        }
    }
    out
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(buf: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(buf);
    for line in text.split("\r\n") {
        if let Some(v) = line.strip_prefix("Content-length: ") {
            return v.trim().parse().ok();
        }
    }
    None
}

#[test]
fn serves_index_html_with_200() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "index.html", b"<h1>hello</h1>");
    let addr = spawn_server(dir.path().to_path_buf());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: x\r\n\r\n")
        .unwrap();
    let resp = read_response(&mut stream, Duration::from_secs(2));
    let text = String::from_utf8_lossy(&resp);

    assert!(text.starts_with("HTTP/1.1 200 OK"), "{text}");
    assert!(text.contains("Content-length: 14"));
    assert!(text.ends_with("<h1>hello</h1>"));
}

#[test]
fn head_request_gets_headers_without_body() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "index.html", b"<h1>hello</h1>");
    let addr = spawn_server(dir.path().to_path_buf());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"HEAD / HTTP/1.1\r\n\r\n").unwrap();
    let resp = read_response(&mut stream, Duration::from_secs(2));
    let text = String::from_utf8_lossy(&resp);

    assert!(text.starts_with("HTTP/1.1 200 OK"), "{text}");
    assert!(text.contains("Content-length: 14"));
    let header_end = find_header_end(&resp).unwrap();
    assert_eq!(resp.len(), header_end, "HEAD response must not include a body");
}

#[test]
fn missing_file_returns_404_with_html_body() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(dir.path().to_path_buf());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"GET /missing HTTP/1.1\r\n\r\n").unwrap();
    let resp = read_response(&mut stream, Duration::from_secs(2));
    let text = String::from_utf8_lossy(&resp);

    assert!(text.starts_with("HTTP/1.1 404 Not Found"), "{text}");
    assert!(text.contains("Not Found"));
}

#[test]
fn keep_alive_header_keeps_connection_open() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.css", b"body{}");
    let addr = spawn_server(dir.path().to_path_buf());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET /a.css HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .unwrap();
    let resp = read_response(&mut stream, Duration::from_secs(2));
    let text = String::from_utf8_lossy(&resp);

    assert!(text.contains("Connection: keep-alive"), "{text}");
    assert!(text.contains("Keep-Alive: timeout=500"), "{text}");

    // The connection must still be usable for a second pipelined request.
    stream.write_all(b"GET /a.css HTTP/1.1\r\n\r\n").unwrap();
    let second = read_response(&mut stream, Duration::from_secs(2));
    assert!(String::from_utf8_lossy(&second).starts_with("HTTP/1.1 200 OK"));
}

#[test]
fn if_modified_since_matching_mtime_returns_304() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "a.css", b"body{}");
    let mtime = std::fs::metadata(dir.path().join("a.css"))
        .unwrap()
        .modified()
        .unwrap();
    let addr = spawn_server(dir.path().to_path_buf());

    let formatted = httpdate::fmt_http_date(mtime);
    let request = format!("GET /a.css HTTP/1.1\r\nIf-Modified-Since: {formatted}\r\n\r\n");

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let resp = read_response(&mut stream, Duration::from_secs(2));
    let text = String::from_utf8_lossy(&resp);

    assert!(text.starts_with("HTTP/1.1 304 Not Modified"), "{text}");
    assert!(!text.contains("Content-length"));
}

#[test]
fn request_split_across_two_writes_still_parses() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "index.html", b"ok");
    let addr = spawn_server(dir.path().to_path_buf());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"GE").unwrap();
    thread::sleep(Duration::from_millis(50));
    stream.write_all(b"T / HTTP/1.0\r\n\r\n").unwrap();

    let resp = read_response(&mut stream, Duration::from_secs(2));
    let text = String::from_utf8_lossy(&resp);

    assert!(text.starts_with("HTTP/1.1 200 OK"), "{text}");
    assert!(text.contains("Connection: close"));
}

#[test]
fn idle_connection_is_closed_by_the_timer() {
    let dir = tempfile::tempdir().unwrap();
    let addr = spawn_server(dir.path().to_path_buf());

    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
    let mut buf = [0u8; 16];
    // Send nothing; the idle timer should close the fd and we observe EOF.
    let result = stream.read(&mut buf);
    match result {
        Ok(0) => {}
        Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {}
        other => panic!("expected EOF from idle timeout, got {other:?}"),
    }
}
