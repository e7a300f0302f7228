//! Entry point: parse CLI config, set up logging, ignore `SIGPIPE`, and
//! hand off to the reactor (spec.md §4.I, §5).

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use sehttpd_rs::config::Config;
use sehttpd_rs::reactor;

/// `SIGPIPE`'s default action terminates the process; a single-threaded
/// server writing to a peer that already closed its read side would
/// otherwise die on the very first such write instead of seeing `EPIPE`
/// on the next `write` call.
fn ignore_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_IGN);
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    ignore_sigpipe();

    let config = Config::parse_args();
    let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.listen_port);

    reactor::run_forever(addr, config.web_root);
}
