use std::net::SocketAddr;
use std::time::Instant;

use mio::Interest;
use ptk_buffer::Buffer;
use ptk_runtime::ThreadHandle;
use tracing::{debug, warn};

use crate::error::ReactorError;
use crate::reactor::Reactor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Connecting,
    Connected,
    Closed,
}

/// A TCP listener bound to a single reactor at a time. `accept` migrates the
/// listener's own registration to whichever reactor calls `accept`, and the
/// returned stream starts out registered with that same reactor.
pub struct TcpListener {
    inner: mio::net::TcpListener,
    owner: Option<u64>,
    token: Option<mio::Token>,
    registry: Option<mio::Registry>,
}

impl TcpListener {
    /// Binds and starts listening. `backlog` is advisory: the underlying
    /// listen socket is created with the platform's default queue depth;
    /// see `DESIGN.md` for why a custom depth isn't wired through.
    pub fn bind(addr: SocketAddr, _backlog: u32) -> Result<Self, ReactorError> {
        let inner = mio::net::TcpListener::bind(addr)?;
        Ok(TcpListener { inner, owner: None, token: None, registry: None })
    }

    /// Registers with `reactor`, migrating away from whatever reactor last
    /// owned this listener first: deregisters `self.inner` from the stored
    /// `registry` clone of that reactor, *then* registers with `reactor`, so
    /// the listener is never polled by two reactors at once.
    fn ensure_registered(&mut self, reactor: &mut Reactor) -> std::io::Result<mio::Token> {
        match (self.owner, self.token) {
            (Some(owner), Some(token)) if owner == reactor.id => Ok(token),
            _ => {
                if let Some(old_registry) = self.registry.take() {
                    let _ = old_registry.deregister(&mut self.inner);
                }
                let token = reactor.adopt(&mut self.inner, Interest::READABLE)?;
                self.owner = Some(reactor.id);
                self.token = Some(token);
                self.registry = Some(reactor.registry()?);
                Ok(token)
            }
        }
    }

    #[must_use]
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Blocks until a client connects, the deadline elapses, or `abort` is
    /// observed. The returned socket is registered with `reactor`.
    pub fn accept(
        &mut self,
        reactor: &mut Reactor,
        deadline: Option<Instant>,
        abort: &ThreadHandle,
    ) -> Result<(TcpSocket, SocketAddr), ReactorError> {
        let token = self.ensure_registered(reactor)?;
        loop {
            match self.inner.accept() {
                Ok((stream, addr)) => {
                    let _ = stream.set_nodelay(true);
                    let mut socket =
                        TcpSocket { inner: stream, state: SocketState::Connected, owner: None, token: None, registry: None };
                    socket.ensure_registered(reactor, Interest::READABLE)?;
                    debug!(?addr, "accepted inbound tcp connection");
                    return Ok((socket, addr));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    reactor.reactor_wait(token, Interest::READABLE, deadline, abort)?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// A single TCP connection, owned by at most one [`Reactor`] at a time.
pub struct TcpSocket {
    inner: mio::net::TcpStream,
    state: SocketState,
    owner: Option<u64>,
    token: Option<mio::Token>,
    registry: Option<mio::Registry>,
}

impl TcpSocket {
    #[must_use]
    pub fn state(&self) -> SocketState {
        self.state
    }

    #[must_use]
    pub fn peer_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.peer_addr()
    }

    /// Registers with `reactor` for `interest`. When `reactor` is a
    /// different one from whichever last registered this socket, the old
    /// registration is torn down first (via the stored `registry` clone of
    /// that reactor) so the socket is never polled by two reactors at once —
    /// the migration rule §4.E/§9 require.
    fn ensure_registered(&mut self, reactor: &mut Reactor, interest: Interest) -> std::io::Result<mio::Token> {
        match (self.owner, self.token) {
            (Some(owner), Some(token)) if owner == reactor.id => {
                reactor.reregister(&mut self.inner, token, interest)?;
                Ok(token)
            }
            _ => {
                if let Some(old_registry) = self.registry.take() {
                    let _ = old_registry.deregister(&mut self.inner);
                }
                let token = reactor.adopt(&mut self.inner, interest)?;
                self.owner = Some(reactor.id);
                self.token = Some(token);
                self.registry = Some(reactor.registry()?);
                Ok(token)
            }
        }
    }

    /// Creates a non-blocking socket, disables Nagle, begins connecting, and
    /// blocks (via `reactor`) until connected, refused, unreachable, timed
    /// out, or aborted.
    pub fn connect(
        reactor: &mut Reactor,
        addr: SocketAddr,
        deadline: Option<Instant>,
        abort: &ThreadHandle,
    ) -> Result<Self, ReactorError> {
        let stream = mio::net::TcpStream::connect(addr)?;
        let _ = stream.set_nodelay(true);
        let mut socket =
            TcpSocket { inner: stream, state: SocketState::Connecting, owner: None, token: None, registry: None };
        let token = socket.ensure_registered(reactor, Interest::WRITABLE)?;

        loop {
            reactor.reactor_wait(token, Interest::WRITABLE, deadline, abort)?;
            match socket.inner.take_error() {
                Ok(None) => {
                    socket.state = SocketState::Connected;
                    return Ok(socket);
                }
                Ok(Some(err)) => return Err(translate_connect_error(err)),
                Err(err) => return Err(translate_connect_error(err)),
            }
        }
    }

    /// Reads at least one byte into `buf`'s spare write region, or returns
    /// [`ReactorError::Closed`] on an immediate zero-length read.
    pub fn recv(
        &mut self,
        reactor: &mut Reactor,
        buf: &mut Buffer,
        deadline: Option<Instant>,
        abort: &ThreadHandle,
    ) -> Result<usize, ReactorError> {
        let token = self.ensure_registered(reactor, Interest::READABLE)?;
        loop {
            let spare = buf.spare_write_slice();
            if spare.is_empty() {
                buf.reserve(4096);
            }
            let spare = buf.spare_write_slice();
            match std::io::Read::read(&mut self.inner, spare) {
                Ok(0) => {
                    self.state = SocketState::Closed;
                    return Err(ReactorError::Closed);
                }
                Ok(n) => {
                    buf.advance_write(n)?;
                    return Ok(n);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    reactor.reactor_wait(token, Interest::READABLE, deadline, abort)?;
                }
                Err(err) => {
                    self.state = SocketState::Closed;
                    return Err(err.into());
                }
            }
        }
    }

    /// Writes the entirety of `buf`'s unread region, advancing its read
    /// index as bytes leave the kernel send buffer.
    pub fn send(
        &mut self,
        reactor: &mut Reactor,
        buf: &mut Buffer,
        deadline: Option<Instant>,
        abort: &ThreadHandle,
    ) -> Result<usize, ReactorError> {
        let token = self.ensure_registered(reactor, Interest::WRITABLE)?;
        let mut total = 0;
        while !buf.is_empty() {
            match std::io::Write::write(&mut self.inner, buf.as_read_slice()) {
                Ok(0) => {
                    self.state = SocketState::Closed;
                    return Err(ReactorError::Closed);
                }
                Ok(n) => {
                    buf.advance_read(n)?;
                    total += n;
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    reactor.reactor_wait(token, Interest::WRITABLE, deadline, abort)?;
                }
                Err(err) => {
                    self.state = SocketState::Closed;
                    return Err(err.into());
                }
            }
        }
        Ok(total)
    }

    pub fn close(&mut self, reactor: &mut Reactor) {
        if let Some(token) = self.token {
            reactor.deregister(&mut self.inner, token);
        }
        let _ = self.inner.shutdown(std::net::Shutdown::Both);
        self.state = SocketState::Closed;
    }

    /// Sets kernel `SO_SNDBUF`/`SO_RCVBUF` to `bytes`. A collaborator calls
    /// this right after `connect`/`accept` to apply
    /// `ToolkitConfig::default_socket_buf_bytes`; PTK never applies it on
    /// its own since the config record's construction is out of scope here.
    pub fn set_buffer_size(&self, bytes: usize) {
        set_socket_buf_size(&self.inner, bytes);
    }
}

/// Sets kernel `SO_SNDBUF` and `SO_RCVBUF` on a mio `TcpStream`.
fn set_socket_buf_size(stream: &mio::net::TcpStream, size: usize) {
    use std::os::fd::AsRawFd;
    let fd = stream.as_raw_fd();
    let size = size as libc::c_int;
    unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_SNDBUF,
            std::ptr::addr_of!(size).cast::<libc::c_void>(),
            core::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVBUF,
            std::ptr::addr_of!(size).cast::<libc::c_void>(),
            core::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}

fn translate_connect_error(err: std::io::Error) -> ReactorError {
    match err.kind() {
        std::io::ErrorKind::ConnectionRefused => ReactorError::ConnectionRefused,
        std::io::ErrorKind::HostUnreachable | std::io::ErrorKind::NetworkUnreachable => ReactorError::HostUnreachable,
        _ => {
            warn!(?err, "tcp connect failed");
            ReactorError::NetworkError(err)
        }
    }
}
