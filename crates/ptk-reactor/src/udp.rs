use std::net::SocketAddr;
use std::time::Instant;

use mio::Interest;
use ptk_buffer::Buffer;
use ptk_runtime::ThreadHandle;

use crate::error::ReactorError;
use crate::reactor::Reactor;

/// A single UDP socket, owned by at most one [`Reactor`] at a time.
pub struct UdpSocket {
    inner: mio::net::UdpSocket,
    owner: Option<u64>,
    token: Option<mio::Token>,
    registry: Option<mio::Registry>,
}

impl UdpSocket {
    pub fn bind(addr: SocketAddr) -> Result<Self, ReactorError> {
        let inner = mio::net::UdpSocket::bind(addr)?;
        Ok(UdpSocket { inner, owner: None, token: None, registry: None })
    }

    /// Registers with `reactor` for `interest`, migrating away from
    /// whatever reactor last registered this socket first: deregisters
    /// `self.inner` from the stored `registry` clone of that reactor, *then*
    /// registers with `reactor`, so the socket is never polled by two
    /// reactors at once.
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

    /// Sends exactly one datagram, blocking until the kernel socket buffer
    /// has room for it. `broadcast` toggles `SO_BROADCAST` on the underlying
    /// socket before the `sendto`, for protocols that address
    /// `255.255.255.255` or a subnet broadcast address.
    pub fn send_to(
        &mut self,
        reactor: &mut Reactor,
        buf: &[u8],
        target: SocketAddr,
        broadcast: bool,
        deadline: Option<Instant>,
        abort: &ThreadHandle,
    ) -> Result<usize, ReactorError> {
        let token = self.ensure_registered(reactor, Interest::WRITABLE)?;
        self.inner.set_broadcast(broadcast)?;
        loop {
            match self.inner.send_to(buf, target) {
                Ok(n) => return Ok(n),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    reactor.reactor_wait(token, Interest::WRITABLE, deadline, abort)?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Receives one datagram if `deadline` is `None` or in the future.
    ///
    /// With `deadline == Some(time already passed)` (i.e. a zero-wait poll),
    /// this returns only the single datagram currently queued, if any, not
    /// every datagram ready in the kernel socket buffer — the `buf` it's
    /// given holds one. A caller that wants to drain a whole burst until
    /// `WOULD_BLOCK` calls this in a loop until it returns
    /// [`ReactorError::Timeout`]; see `DESIGN.md`'s entry on this signature
    /// for why draining isn't done in one call here.
    pub fn recv_from(
        &mut self,
        reactor: &mut Reactor,
        buf: &mut Buffer,
        deadline: Option<Instant>,
        abort: &ThreadHandle,
    ) -> Result<(usize, SocketAddr), ReactorError> {
        let token = self.ensure_registered(reactor, Interest::READABLE)?;
        loop {
            let spare = buf.spare_write_slice();
            if spare.is_empty() {
                buf.reserve(65536);
            }
            let spare = buf.spare_write_slice();
            match self.inner.recv_from(spare) {
                Ok((n, addr)) => {
                    buf.advance_write(n)?;
                    return Ok((n, addr));
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    reactor.reactor_wait(token, Interest::READABLE, deadline, abort)?;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    #[must_use]
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}
