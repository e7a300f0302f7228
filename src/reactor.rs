//! Single-threaded event loop (spec.md §4.I). `mio` registration is
//! edge-triggered and one-shot: every wakeup drains its socket to
//! `WouldBlock` and then `reregister`s before the next `poll`, rather than
//! relying on level-triggered re-delivery.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use slab::Slab;
use socket2::{Domain, Socket, Type};
use tracing::{debug, error, info, warn};

use crate::connection::{Connection, Outcome};
use crate::timer::{TimerWheel, TIMEOUT_DEFAULT};

/// `LISTENER` is a fixed token outside the connection slab's key space
/// (slab keys start at 0 and are cast to `Token` directly, so the listener
/// needs an id a real connection could never be handed).
const LISTENER: Token = Token(usize::MAX);

/// Owns the listening socket, the connection table, and the idle-timer
/// wheel. `ConnectionTable` is a `slab::Slab<Connection>` keyed by the same
/// `mio::Token` used both for `Poll` registration and timer identity, so a
/// connection is mechanically either in-flight in `poll` or tracked by
/// `timers` — never both, never neither.
pub struct Reactor {
    poll: Poll,
    listener: TcpListener,
    connections: Slab<Connection>,
    timers: TimerWheel,
    web_root: Rc<PathBuf>,
}

impl Reactor {
    /// Binds the listening socket via `socket2` (for `SO_REUSEADDR` ahead
    /// of `mio`'s own bind) and registers it for edge-triggered accepts.
    pub fn bind(addr: SocketAddr, web_root: PathBuf) -> io::Result<Self> {
        let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(1024)?;

        let mut listener = TcpListener::from_std(socket.into());
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        Ok(Self {
            poll,
            listener,
            connections: Slab::new(),
            timers: TimerWheel::new(),
            web_root: Rc::new(web_root),
        })
    }

    /// The address actually bound — useful when `addr`'s port was 0 and
    /// the OS picked one, as in the integration tests.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs until the process is killed. Never returns `Ok`; a fatal
    /// internal error aborts the process per spec.md §7 rather than
    /// unwinding back to `main`.
    pub fn run(&mut self) -> ! {
        let mut events = Events::with_capacity(1024);
        loop {
            let timeout = self.timers.next_deadline(Instant::now());
            if let Err(e) = self.poll.poll(&mut events, timeout) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                error!(error = %e, "poll failed");
                std::process::abort();
            }

            for event in events.iter() {
                if event.token() == LISTENER {
                    self.accept_all();
                    continue;
                }
                self.handle_connection_event(event.token(), event.is_readable(), event.is_writable());
            }

            self.expire_idle();
        }
    }

    /// Drains the accept queue to `WouldBlock` — edge-triggered readiness
    /// only fires once per batch of pending connections, so a single
    /// `accept` per wakeup would silently starve queued peers.
    fn accept_all(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => self.register_connection(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    break;
                }
            }
        }
    }

    fn register_connection(&mut self, mut stream: mio::net::TcpStream, peer: SocketAddr) {
        let entry = self.connections.vacant_entry();
        let token = Token(entry.key());
        if let Err(e) = self
            .poll
            .registry()
            .register(&mut stream, token, Interest::READABLE)
        {
            warn!(error = %e, %peer, "failed to register connection");
            return;
        }
        debug!(%peer, ?token, "accepted connection");
        let conn = Connection::new(stream, token, Rc::clone(&self.web_root));
        entry.insert(conn);
        self.timers.add(token, Instant::now(), TIMEOUT_DEFAULT);
    }

    fn handle_connection_event(&mut self, token: Token, readable: bool, writable: bool) {
        let Some(conn) = self.connections.get_mut(token.0) else {
            return;
        };

        let outcome = if readable {
            conn.on_readable()
        } else if writable {
            conn.on_writable()
        } else {
            Outcome::Continue
        };

        match outcome {
            Outcome::Close => self.close_connection(token),
            Outcome::Continue => self.rearm(token),
        }
    }

    /// Re-registers with the interest the connection now wants (read while
    /// parsing, write while sending), and bumps its idle deadline — any
    /// I/O counts as activity.
    fn rearm(&mut self, token: Token) {
        let Some(conn) = self.connections.get_mut(token.0) else {
            return;
        };
        let interest = conn.interest();
        if let Err(e) = self
            .poll
            .registry()
            .reregister(&mut conn.stream, token, interest)
        {
            warn!(error = %e, ?token, "failed to reregister connection");
            self.close_connection(token);
            return;
        }
        self.timers.add(token, Instant::now(), TIMEOUT_DEFAULT);
    }

    fn close_connection(&mut self, token: Token) {
        if let Some(mut conn) = self.connections.try_remove(token.0) {
            let _ = self.poll.registry().deregister(&mut conn.stream);
        }
        self.timers.cancel(token);
    }

    fn expire_idle(&mut self) {
        let now = Instant::now();
        for token in self.timers.expire_due(now) {
            if self.connections.contains(token.0) {
                debug!(?token, "closing idle connection");
                self.close_connection(token);
            }
        }
    }
}

/// Logs the error and exits; called from `main` on bind failure, matching
/// spec.md §7's fatal-condition handling for reactor creation.
pub fn run_forever(addr: SocketAddr, web_root: PathBuf) -> ! {
    match Reactor::bind(addr, web_root) {
        Ok(mut reactor) => {
            info!(%addr, "listening");
            reactor.run()
        }
        Err(e) => {
            error!(error = %e, %addr, "failed to bind listener");
            std::process::abort()
        }
    }
}
