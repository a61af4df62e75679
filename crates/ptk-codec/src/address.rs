use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use ptk_buffer::Cursor;

use crate::endian::Endian;
use crate::error::CodecError;
use crate::wire::Wire;

/// Wire-level socket address: a 32-bit IPv4 address kept in network byte
/// order plus a host-order port. Two addresses are equal iff every field
/// matches — `family` included, so an address reserved for a future family
/// never compares equal to an IPv4 one even with the same bits.
///
/// This is the type PDUs embed when a protocol carries a peer address as a
/// field (redirect responses, membership gossip); it is deliberately not
/// `std::net::SocketAddr` itself, since the wire encoding is fixed-width and
/// IPv4-only regardless of what the host platform's resolver can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    /// IPv4 octets packed big-endian, exactly as they appear on the wire.
    ipv4: u32,
    port: u16,
    family: AddressFamily,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ipv4,
}

impl Address {
    pub const WIRE_SIZE: usize = 4 + 2 + 1;

    #[must_use]
    pub fn new(ipv4: Ipv4Addr, port: u16) -> Self {
        Address { ipv4: u32::from_be_bytes(ipv4.octets()), port, family: AddressFamily::Ipv4 }
    }

    #[must_use]
    pub fn ipv4(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.ipv4.to_be_bytes())
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn family(&self) -> AddressFamily {
        self.family
    }
}

impl From<SocketAddrV4> for Address {
    fn from(addr: SocketAddrV4) -> Self {
        Address::new(*addr.ip(), addr.port())
    }
}

impl TryFrom<SocketAddr> for Address {
    type Error = CodecError;

    fn try_from(addr: SocketAddr) -> Result<Self, CodecError> {
        match addr {
            SocketAddr::V4(v4) => Ok(v4.into()),
            SocketAddr::V6(_) => Err(CodecError::Unsupported),
        }
    }
}

impl From<Address> for SocketAddr {
    fn from(addr: Address) -> Self {
        SocketAddr::V4(SocketAddrV4::new(addr.ipv4(), addr.port))
    }
}

impl Wire for Address {
    fn write(&self, cursor: &mut Vec<u8>, endian: Endian) -> Result<(), CodecError> {
        cursor.extend_from_slice(&endian.encode_u32(self.ipv4));
        cursor.extend_from_slice(&endian.encode_u16(self.port));
        cursor.push(0);
        Ok(())
    }

    fn read(&mut self, cursor: &mut Cursor<'_>, endian: Endian) -> Result<(), CodecError> {
        let ipv4 = endian.decode_u32(cursor.take(4)?.try_into().unwrap());
        let port = endian.decode_u16(cursor.take(2)?.try_into().unwrap());
        let family_tag = cursor.take(1)?[0];
        if family_tag != 0 {
            return Err(CodecError::Unsupported);
        }
        self.ipv4 = ipv4;
        self.port = port;
        self.family = AddressFamily::Ipv4;
        Ok(())
    }

    fn size(&self) -> usize {
        Self::WIRE_SIZE
    }
}

impl Default for Address {
    fn default() -> Self {
        Address::new(Ipv4Addr::UNSPECIFIED, 0)
    }
}
