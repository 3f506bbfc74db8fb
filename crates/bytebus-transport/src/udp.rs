//! UDP datagram transport.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use bytes::{Buf, BytesMut};
use tracing::debug;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// A bound UDP socket serving the byte-at-a-time transport contract.
///
/// The bus is a delimited stream protocol, so datagram boundaries don't need
/// to map 1:1 to packets: incoming datagrams are queued and served one byte
/// at a time, and each `write` goes out as a single datagram.
pub struct UdpTransport {
    socket: UdpSocket,
    dest: Option<SocketAddr>,
    rx_queue: BytesMut,
    datagram: [u8; Self::MAX_DATAGRAM],
}

impl UdpTransport {
    const MAX_DATAGRAM: usize = 4096;

    /// Bind to a local address (use port 0 for send-only sockets).
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let socket = UdpSocket::bind(&addr).map_err(|source| TransportError::Bind {
            addr: format!("{addr:?}"),
            source,
        })?;
        socket.set_nonblocking(true)?;
        debug!(addr = ?addr, "bound udp socket");
        Ok(Self {
            socket,
            dest: None,
            rx_queue: BytesMut::new(),
            datagram: [0; Self::MAX_DATAGRAM],
        })
    }

    /// Set the destination for subsequent writes.
    pub fn set_destination(&mut self, dest: SocketAddr) {
        self.dest = Some(dest);
    }

    /// Local address of the underlying socket.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

impl Transport for UdpTransport {
    fn read_byte(&mut self) -> Option<u8> {
        if self.rx_queue.is_empty() {
            match self.socket.recv_from(&mut self.datagram) {
                Ok((len, _sender)) => {
                    self.rx_queue.extend_from_slice(&self.datagram[..len]);
                }
                Err(_) => return None,
            }
        }

        if self.rx_queue.is_empty() {
            return None;
        }
        let byte = self.rx_queue[0];
        self.rx_queue.advance(1);
        Some(byte)
    }

    fn write(&mut self, data: &[u8]) -> bool {
        let Some(dest) = self.dest else {
            return false;
        };
        matches!(self.socket.send_to(data, dest), Ok(sent) if sent == data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transport;

    #[test]
    fn datagram_round_trip() {
        let mut rx = UdpTransport::bind("127.0.0.1:0").unwrap();
        let mut tx = UdpTransport::bind("127.0.0.1:0").unwrap();
        tx.set_destination(rx.local_addr().unwrap());

        assert!(tx.write(&[0x01, 0x02, 0x00]));

        // Localhost delivery is fast but not instantaneous.
        let mut got = Vec::new();
        for _ in 0..1000 {
            if let Some(b) = rx.read_byte() {
                got.push(b);
                if got.len() == 3 {
                    break;
                }
            } else {
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
        }
        assert_eq!(got, [0x01, 0x02, 0x00]);
    }

    #[test]
    fn write_without_destination_fails() {
        let mut t = UdpTransport::bind("127.0.0.1:0").unwrap();
        assert!(!t.write(&[0x01]));
    }
}
