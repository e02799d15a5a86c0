use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use byteorder::{BigEndian, ByteOrder};
use log::warn;

use crate::constants::MTU_SIZE_BYTES;
use crate::types::AuthorId;

use super::error::SendError;
use super::{EncodedMessage, Transport};

/// Author-id prefix carried ahead of the frame bytes in each datagram.
const HEADER_LEN: usize = 4;

/// UDP datagram transport.
///
/// Each datagram is the 4-byte big-endian author id followed by the
/// encoded frame bytes. Datagrams are best-effort: sends that fail are
/// reported to the manager (which logs them), receives block until a
/// datagram arrives.
///
/// The socket is cheap to share: `send` takes `&self`, and a host-owned
/// I/O thread typically loops on [`recv`](Self::recv) and feeds
/// [`Manager::receive`](crate::Manager::receive).
pub struct UdpTransport {
    socket: UdpSocket,
    peer: SocketAddr,
    local_identifier: AuthorId,
}

impl UdpTransport {
    /// Binds a local socket and fixes the peer all sends go to.
    pub fn bind<A: ToSocketAddrs>(
        local: A,
        peer: SocketAddr,
        local_identifier: AuthorId,
    ) -> io::Result<Self> {
        let socket = UdpSocket::bind(local)?;
        Ok(UdpTransport {
            socket,
            peer,
            local_identifier,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Blocks until the next datagram arrives and unwraps it into an
    /// [`EncodedMessage`]. Undersized datagrams are dropped and the wait
    /// continues.
    pub fn recv(&self) -> io::Result<EncodedMessage> {
        let mut buffer = [0u8; HEADER_LEN + MTU_SIZE_BYTES];
        loop {
            let (len, from) = self.socket.recv_from(&mut buffer)?;
            if len < HEADER_LEN {
                warn!("dropping {}-byte runt datagram from {}", len, from);
                continue;
            }
            let author = AuthorId(BigEndian::read_u32(&buffer[..HEADER_LEN]));
            return Ok(EncodedMessage::new(
                buffer[HEADER_LEN..len].to_vec(),
                author,
            ));
        }
    }
}

impl Transport for UdpTransport {
    fn send(&self, message: &EncodedMessage) -> Result<(), SendError> {
        let mut datagram = Vec::with_capacity(HEADER_LEN + message.bytes.len());
        let mut header = [0u8; HEADER_LEN];
        BigEndian::write_u32(&mut header, message.author.0);
        datagram.extend_from_slice(&header);
        datagram.extend_from_slice(&message.bytes);
        match self.socket.send_to(&datagram, self.peer) {
            Ok(_) => Ok(()),
            Err(_) => Err(SendError),
        }
    }

    fn local_identifier(&self) -> AuthorId {
        self.local_identifier
    }
}
